//! Run Summary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::PathBuf;

/// Where a run wrote its outputs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputPaths {
    /// Diagnostic run log
    pub run_log: PathBuf,
    /// CSV result table
    pub table: PathBuf,
    /// Overview log
    pub overview: PathBuf,
}

/// Totals for one benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Framework name
    pub framework: String,
    /// Output tag (framework plus engine)
    pub tag: String,
    /// Model directory
    pub directory: PathBuf,
    /// Run start time
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration in seconds
    pub duration_secs: f64,
    /// Model files discovered
    pub files_found: usize,
    /// Files executed
    pub files_processed: usize,
    /// Files skipped by the exclusion set
    pub files_skipped: usize,
    /// Successful queries (or combined runs)
    pub successes: usize,
    /// Failed queries, including extraction failures
    pub errors: usize,
    /// Timed-out queries
    pub timeouts: usize,
    /// Rows written to the result table
    pub records_written: usize,
    /// Setting prefixes excluded during the run, in order
    pub excluded_prefixes: Vec<String>,
    /// Output files
    pub outputs: OutputPaths,
}

/// Format a duration in seconds for display.
pub fn format_duration(secs: f64) -> String {
    if secs < 1.0 {
        format!("{:.0} ms", secs * 1_000.0)
    } else if secs < 60.0 {
        format!("{secs:.2} s")
    } else if secs < 3_600.0 {
        let mins = (secs / 60.0).floor();
        format!("{mins:.0} min {:.0} s", secs - mins * 60.0)
    } else {
        let hours = (secs / 3_600.0).floor();
        let mins = ((secs - hours * 3_600.0) / 60.0).floor();
        format!("{hours:.0} h {mins:.0} min")
    }
}

/// Human-readable multi-line summary.
pub fn format_human_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out);
    let _ = writeln!(out, "PinBench run: {} ({})", summary.framework, summary.tag);
    let _ = writeln!(out, "{}", "=".repeat(60));
    let _ = writeln!(out, "  directory:        {}", summary.directory.display());
    let _ = writeln!(
        out,
        "  files:            {} found, {} processed, {} skipped",
        summary.files_found, summary.files_processed, summary.files_skipped
    );
    let _ = writeln!(
        out,
        "  queries:          {} ok, {} errors, {} timeouts",
        summary.successes, summary.errors, summary.timeouts
    );
    let _ = writeln!(out, "  records written:  {}", summary.records_written);
    if !summary.excluded_prefixes.is_empty() {
        let _ = writeln!(out, "  excluded settings:");
        for prefix in &summary.excluded_prefixes {
            let _ = writeln!(out, "    - {prefix}");
        }
    }
    let _ = writeln!(out, "  duration:         {}", format_duration(summary.duration_secs));
    let _ = writeln!(out);
    let _ = writeln!(out, "  table:    {}", summary.outputs.table.display());
    let _ = writeln!(out, "  overview: {}", summary.outputs.overview.display());
    let _ = writeln!(out, "  log:      {}", summary.outputs.run_log.display());
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample() -> RunSummary {
        RunSummary {
            framework: "JT".into(),
            tag: "JT_LJT".into(),
            directory: "models".into(),
            started_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            duration_secs: 75.0,
            files_found: 4,
            files_processed: 3,
            files_skipped: 1,
            successes: 5,
            errors: 1,
            timeouts: 2,
            records_written: 5,
            excluded_prefixes: vec!["models/grid#".into()],
            outputs: OutputPaths {
                run_log: "out/x_JT_LJT.log".into(),
                table: "out/x_JT_LJT_times.csv".into(),
                overview: "out/x_JT_LJT_overview.log".into(),
            },
        }
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(0.25), "250 ms");
        assert_eq!(format_duration(2.5), "2.50 s");
        assert_eq!(format_duration(75.0), "1 min 15 s");
        assert_eq!(format_duration(7_260.0), "2 h 1 min");
    }

    #[test]
    fn human_summary_lists_exclusions() {
        let text = format_human_summary(&sample());
        assert!(text.contains("4 found, 3 processed, 1 skipped"));
        assert!(text.contains("- models/grid#"));
        assert!(text.contains("1 min 15 s"));
    }
}
