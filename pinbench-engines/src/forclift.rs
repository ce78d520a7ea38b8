//! Forclift (weighted first-order model counting over `.mln` models).

use crate::text::{bracket_pair, mln_queries};
use pinbench_core::{
    AdapterError, EngineAdapter, EngineCommand, ExtractionError, Invocation, ResultRecord,
    RunOptions,
};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default jar name, looked up in the working directory
pub const FORCLIFT_JAR: &str = "forclift-3.1.jar";

const SINGLE_COLUMNS: [&str; 12] = [
    "filename",
    "query",
    "t_evidence",
    "t_query",
    "t_inference",
    "ev_nnf_size",
    "ev_smooth_nnf_size",
    "q_nnf_size",
    "q_smooth_nnf_size",
    "Z",
    "Z(query)",
    "P(query)",
];

const MARGINALS_COLUMNS: [&str; 4] = ["filename", "query", "P(query)", "t_inference"];

const TIMINGS_MARKER: &str = "[t_evidence]";
const CLASS_PREFIX: &str = "Building marginal query class for ";
const PROBABILITY_PREFIX: &str = "Probability for class of queries ";

/// Forclift adapter
#[derive(Debug, Clone)]
pub struct ForcliftAdapter {
    jar: PathBuf,
}

impl ForcliftAdapter {
    /// Adapter running the given jar.
    pub fn new(jar: impl Into<PathBuf>) -> Self {
        Self { jar: jar.into() }
    }

    fn java_command(&self, tail: Vec<String>, options: &RunOptions) -> EngineCommand {
        let mut args = vec!["-jar".to_string(), self.jar.display().to_string()];
        args.extend(tail);
        let mut cmd = EngineCommand::new("java", args);
        cmd.insert_pass_through(3, &options.pass_through_args);
        if let Some(flag) = &options.memory_limit {
            cmd.insert_at(1, [flag.as_str()]);
        }
        cmd
    }
}

impl EngineAdapter for ForcliftAdapter {
    fn name(&self) -> &str {
        "Forclift"
    }

    fn tag(&self) -> String {
        "forclift".to_string()
    }

    fn extension(&self) -> &str {
        "mln"
    }

    fn executable(&self) -> &Path {
        &self.jar
    }

    fn record_template(&self, options: &RunOptions) -> ResultRecord {
        if options.combine_queries {
            ResultRecord::with_columns(MARGINALS_COLUMNS)
        } else {
            ResultRecord::with_columns(SINGLE_COLUMNS)
        }
    }

    fn query_strings(&self, contents: &str) -> Vec<String> {
        mln_queries(contents)
    }

    fn supports_combined(&self) -> bool {
        true
    }

    fn build_single_command(
        &self,
        query: &str,
        source: &Path,
        options: &RunOptions,
    ) -> Result<Invocation, AdapterError> {
        let tail = vec![
            "-q".to_string(),
            query.to_string(),
            source.display().to_string(),
        ];
        Ok(Invocation::new(self.java_command(tail, options)))
    }

    /// All-marginals mode: Forclift computes every query class itself.
    fn build_combined_command(
        &self,
        _composed: &str,
        source: &Path,
        options: &RunOptions,
    ) -> Result<Invocation, AdapterError> {
        let tail = vec!["--margs".to_string(), source.display().to_string()];
        Ok(Invocation::new(self.java_command(tail, options)))
    }

    fn detect_error(&self, _stdout: &str, stderr: &str) -> bool {
        !stderr.is_empty()
    }

    fn extract_record(
        &self,
        stdout: &str,
        options: &RunOptions,
    ) -> Result<ResultRecord, ExtractionError> {
        let mut record = self.record_template(options);
        let start = stdout.find(TIMINGS_MARKER).ok_or_else(|| {
            warn!("{TIMINGS_MARKER} not found in return string. Skipping information extraction.");
            ExtractionError::MissingMarker(TIMINGS_MARKER.to_string())
        })?;

        for (key, value) in stdout[start..].lines().filter_map(bracket_pair) {
            record.set(key, value);
        }
        Ok(record)
    }

    /// Pairs each query class with its probability in the order printed.
    fn extract_combined_records(
        &self,
        _queries: &[String],
        stdout: &str,
        options: &RunOptions,
    ) -> Result<Vec<ResultRecord>, ExtractionError> {
        let mut classes = Vec::new();
        let mut pending: Option<String> = None;
        let mut t_inference = None;

        for line in stdout.lines().map(str::trim) {
            if let Some(class) = line.strip_prefix(CLASS_PREFIX) {
                pending = Some(class.trim().to_string());
            } else if let Some(rest) = line.strip_prefix(PROBABILITY_PREFIX) {
                let query = pending.take().ok_or_else(|| {
                    ExtractionError::Malformed(format!("probability without query class: {line}"))
                })?;
                let value = rest
                    .strip_prefix(query.as_str())
                    .and_then(|r| r.strip_prefix(" is "))
                    .or_else(|| rest.rsplit_once(" is ").map(|(_, v)| v))
                    .ok_or_else(|| ExtractionError::Malformed(line.to_string()))?;
                classes.push((query, value.trim().to_string()));
            } else if line.contains("[t_inference]") {
                t_inference = bracket_pair(line).map(|(_, v)| v.trim().to_string());
            }
        }

        Ok(classes
            .into_iter()
            .map(|(query, probability)| {
                let mut record = self.record_template(options);
                record.set("query", query);
                record.set("P(query)", probability);
                if let Some(t) = &t_inference {
                    record.set("t_inference", t.as_str());
                }
                record
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinbench_core::FieldValue;

    const SINGLE_OUTPUT: &str = "Compiling evidence\n\
        [t_evidence] {120}\n\
        [t_query] {33}\n\
        [t_inference] {153}\n\
        [ev_nnf_size] {10}\n\
        [ev_smooth_nnf_size] {12}\n\
        [q_nnf_size] {4}\n\
        [q_smooth_nnf_size] {5}\n\
        [Z] {exp(3.1)}\n\
        [Z(query)] {exp(2.0)}\n\
        [P(query)] {0.332}\n\
        [unknown_key] {1}\n";

    const MARGS_OUTPUT: &str = "Partition function is exp(-2.798187775203149E7)\n\
        Building marginal query class for Att(X)\n\
        Probability for class of queries Att(X) is exp(-422.95578300207853)\n\
        Building marginal query class for Res(X)\n\
        Probability for class of queries Res(X) is exp(-0.4700036309659481)\n\
        Building marginal query class for Smokes(X)\n\
        Probability for class of queries Smokes(X) is exp(-1.0)\n\
        done\n\
        [t_inference] {39140}\n";

    fn adapter() -> ForcliftAdapter {
        ForcliftAdapter::new(FORCLIFT_JAR)
    }

    #[test]
    fn single_command_places_memory_flag_and_pass_through() {
        let options = RunOptions {
            memory_limit: Some("-Xmx16384M".into()),
            pass_through_args: "\"--seed 3\"".into(),
            ..RunOptions::default()
        };
        let inv = adapter()
            .build_single_command("Smokes(A)", Path::new("m/a.mln"), &options)
            .unwrap();
        assert_eq!(
            inv.command.to_string(),
            "java -Xmx16384M -jar forclift-3.1.jar --seed 3 -q Smokes(A) m/a.mln"
        );
        assert!(inv.scratch.is_none());
    }

    #[test]
    fn margs_command() {
        let inv = adapter()
            .build_combined_command("a,b", Path::new("a.mln"), &RunOptions::default())
            .unwrap();
        assert_eq!(inv.command.to_string(), "java -jar forclift-3.1.jar --margs a.mln");
    }

    #[test]
    fn single_record_from_bracket_lines() {
        let adapter = adapter();
        let mut record = adapter
            .extract_record(SINGLE_OUTPUT, &RunOptions::default())
            .unwrap();
        record.set("filename", "a.mln");
        record.set("query", "Smokes(A)");
        assert!(record.is_valid());
        assert_eq!(record.get("P(query)"), Some(&FieldValue::from("0.332")));
        assert_eq!(record.get("Z"), Some(&FieldValue::from("exp(3.1)")));
    }

    #[test]
    fn extraction_is_deterministic() {
        let adapter = adapter();
        let options = RunOptions::default();
        let a = adapter.extract_record(SINGLE_OUTPUT, &options).unwrap();
        let b = adapter.extract_record(SINGLE_OUTPUT, &options).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn partial_output_stays_invalid() {
        let out = "[t_evidence] {1}\n[t_query] {2}\n";
        let record = adapter()
            .extract_record(out, &RunOptions::default())
            .unwrap();
        assert!(!record.is_valid());
        assert!(record.missing_fields().contains(&"P(query)".to_string()));
    }

    #[test]
    fn missing_marker_is_extraction_error() {
        assert!(
            adapter()
                .extract_record("boom", &RunOptions::default())
                .is_err()
        );
    }

    #[test]
    fn marginals_keep_print_order() {
        let options = RunOptions {
            combine_queries: true,
            ..RunOptions::default()
        };
        let records = adapter()
            .extract_combined_records(&[], MARGS_OUTPUT, &options)
            .unwrap();
        let queries: Vec<_> = records.iter().map(|r| r.get("query").cloned()).collect();
        assert_eq!(
            queries,
            vec![
                Some(FieldValue::from("Att(X)")),
                Some(FieldValue::from("Res(X)")),
                Some(FieldValue::from("Smokes(X)")),
            ]
        );
        assert_eq!(
            records[1].get("P(query)"),
            Some(&FieldValue::from("exp(-0.4700036309659481)"))
        );
        assert!(
            records
                .iter()
                .all(|r| r.get("t_inference") == Some(&FieldValue::from("39140")))
        );
    }

    #[test]
    fn error_iff_stderr_non_empty() {
        let adapter = adapter();
        assert!(!adapter.detect_error("anything", ""));
        assert!(adapter.detect_error("", "Exception"));
    }
}
