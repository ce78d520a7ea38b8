//! Text scraping helpers shared by several adapters.

use pinbench_core::{ExtractionError, FieldValue};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Marker line that opens the query section of `.mln` models
pub const QUERIES_MARKER: &str = "[Queries]";

/// Separator printed before the per-query distributions of BLOG-style engines
pub const QUERY_RESULTS_MARKER: &str = "======== Query Results =========";

const DISTRIBUTION_PREFIX: &str = "Distribution of values for ";

static PROBABILITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?\d+(?:\.\d+)?(?:E-?\d+)|NaN|-?\d+(?:\.\d+)?")
        .expect("probability pattern is valid")
});

/// Queries listed as `// query` comments after the `[Queries]` marker.
///
/// The rest of the marker line and two header lines are skipped; of the
/// remaining lines only `//` comments count, with their first three
/// characters removed.
pub fn mln_queries(contents: &str) -> Vec<String> {
    let Some(start) = contents.find(QUERIES_MARKER) else {
        warn!("'{QUERIES_MARKER}' section not found in model file");
        return Vec::new();
    };
    contents[start + QUERIES_MARKER.len()..]
        .split('\n')
        .skip(3)
        .filter(|line| line.starts_with("//"))
        .map(|line| line.chars().skip(3).collect::<String>().trim().to_string())
        .collect()
}

/// Every line containing `keyword`, trimmed.
pub fn keyword_lines(contents: &str, keyword: &str) -> Vec<String> {
    contents
        .split('\n')
        .filter(|line| line.contains(keyword))
        .map(|line| line.trim().to_string())
        .collect()
}

/// `[key] {value}` pair of a line, if it has both brackets and braces.
pub fn bracket_pair(line: &str) -> Option<(&str, &str)> {
    let key_start = line.find('[')? + 1;
    let key_end = line.find(']')?;
    let value_start = line.find('{')? + 1;
    let value_end = line.find('}')?;
    let key = line.get(key_start..key_end)?;
    let value = line.get(value_start..value_end)?;
    Some((key, value))
}

/// Text between the first `tag` and the end of its line, trimmed.
pub fn value_after_tag<'a>(output: &'a str, tag: &str) -> Option<&'a str> {
    let start = output.find(tag)? + tag.len();
    let rest = &output[start..];
    let end = rest.find('\n').unwrap_or(rest.len());
    Some(rest[..end].trim())
}

/// The `true` probability of one query as printed in the results section
#[derive(Debug, Clone, PartialEq)]
pub struct QueryProbability {
    /// Query as echoed by the engine
    pub query: String,
    /// Parsed probability, `NotApplicable` for oddly shaped blocks
    pub value: FieldValue,
}

/// Parse every `Distribution of values for Q` block after the results marker.
///
/// Text from `stop` onwards is ignored when given.
pub fn query_probabilities(
    output: &str,
    stop: Option<&str>,
) -> Result<Vec<QueryProbability>, ExtractionError> {
    let start = output
        .find(QUERY_RESULTS_MARKER)
        .ok_or_else(|| ExtractionError::MissingMarker(QUERY_RESULTS_MARKER.to_string()))?;
    let mut section = &output[start + QUERY_RESULTS_MARKER.len()..];
    if let Some(end) = stop.and_then(|stop| section.find(stop)) {
        section = &section[..end];
    }

    Ok(section
        .split(DISTRIBUTION_PREFIX)
        .skip(1)
        .map(|block| parse_distribution(block.trim()))
        .collect())
}

fn parse_distribution(block: &str) -> QueryProbability {
    let lines: Vec<&str> = block.split('\n').collect();
    let query = lines.first().map(|l| l.trim().to_string()).unwrap_or_default();

    if !(2..=3).contains(&lines.len()) {
        warn!(
            "Unexpected number of lines in probability extraction per query, expected 2 or 3, was {}:\n{block}",
            lines.len()
        );
        return QueryProbability {
            query,
            value: FieldValue::NotApplicable,
        };
    }

    let value = match lines[1..].iter().find(|line| line.contains("true")) {
        // no `true` line means the engine printed only `false` with certainty
        None => FieldValue::Float(0.0),
        Some(line) => PROBABILITY
            .find(line)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .map(FieldValue::Float)
            .unwrap_or(FieldValue::Unset),
    };
    QueryProbability { query, value }
}

/// First all-digit whitespace separated token.
pub fn first_integer(text: &str) -> Option<i64> {
    text.split_whitespace()
        .find(|tok| tok.chars().all(|c| c.is_ascii_digit()))
        .and_then(|tok| tok.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MLN: &str = "person = {A, B}\nSmokes(person)\n\n[Queries]\n// header one\n// header two\n// Smokes(A)\n//  Cancer(B)\nnot a query\n";

    #[test]
    fn mln_queries_skip_headers() {
        assert_eq!(mln_queries(MLN), vec!["Smokes(A)", "Cancer(B)"]);
    }

    #[test]
    fn mln_without_marker_has_no_queries() {
        assert!(mln_queries("Smokes(person)\n").is_empty());
    }

    #[test]
    fn keyword_lines_are_trimmed() {
        let blog = "random Boolean A;\n  query A;\nobs B = true;\nquery B;";
        assert_eq!(keyword_lines(blog, "query"), vec!["query A;", "query B;"]);
    }

    #[test]
    fn bracket_pairs() {
        assert_eq!(bracket_pair("[t_query] {1234}"), Some(("t_query", "1234")));
        assert_eq!(
            bracket_pair("[total time] : {0.06 secs}"),
            Some(("total time", "0.06 secs"))
        );
        assert_eq!(bracket_pair("done"), None);
    }

    #[test]
    fn tag_value_runs_to_end_of_line() {
        let out = "foo\n**TIME**  512\nbar";
        assert_eq!(value_after_tag(out, "**TIME**"), Some("512"));
        assert_eq!(value_after_tag("Total elapsed time: 3s", "Total elapsed time:"), Some("3s"));
        assert_eq!(value_after_tag(out, "missing"), None);
    }

    #[test]
    fn probabilities_tolerate_scientific_and_nan() {
        let out = format!(
            "noise\n{QUERY_RESULTS_MARKER}\n\
             Distribution of values for Att(x1)\n0.9422090158242775\tfalse\n0.05779098417572252\ttrue\n\
             Distribution of values for TestQ(123)\n1\tfalse\n\
             Distribution of values for Tiny\n0.9997378024340892\tfalse\n2.621975659107907E-4\ttrue\n\
             Distribution of values for Odd\nNaN\ttrue\n"
        );
        let probs = query_probabilities(&out, None).unwrap();
        let values: Vec<_> = probs.iter().map(|p| p.value.clone()).collect();
        assert_eq!(
            values[..3],
            [
                FieldValue::Float(0.05779098417572252),
                FieldValue::Float(0.0),
                FieldValue::Float(2.621975659107907e-4),
            ]
        );
        assert!(matches!(values[3], FieldValue::Float(v) if v.is_nan()));
        assert_eq!(probs[0].query, "Att(x1)");
    }

    #[test]
    fn malformed_block_is_not_applicable() {
        let out = format!("{QUERY_RESULTS_MARKER}\nDistribution of values for X\n0.1\ttrue\n0.9\tfalse\n0.0\tmaybe\n");
        let probs = query_probabilities(&out, None).unwrap();
        assert_eq!(probs[0].value, FieldValue::NotApplicable);
    }

    #[test]
    fn stop_marker_cuts_section() {
        let out = format!(
            "{QUERY_RESULTS_MARKER}\nDistribution of values for X\n0.4\ttrue\n0.6\tfalse\nTotal elapsed time: 2s\nDistribution of values for Y\n"
        );
        let probs = query_probabilities(&out, Some("Total elapsed time:")).unwrap();
        assert_eq!(probs.len(), 1);
    }

    #[test]
    fn missing_results_marker_is_an_error() {
        assert!(matches!(
            query_probabilities("nothing", None),
            Err(ExtractionError::MissingMarker(_))
        ));
    }

    #[test]
    fn first_integer_skips_units() {
        assert_eq!(first_integer("171 ms"), Some(171));
        assert_eq!(first_integer("1601 kB"), Some(1601));
        assert_eq!(first_integer("n/a"), None);
    }
}
