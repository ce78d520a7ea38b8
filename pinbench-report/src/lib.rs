#![warn(missing_docs)]
//! PinBench Report - Run Outputs
//!
//! Writes the three artefacts of a benchmark run:
//! - the result table (CSV, one row per valid record)
//! - the overview log (one status line per query or file)
//! - the run summary (human-readable or JSON)

mod json;
mod overview;
mod summary;
mod table;

pub use json::generate_json_summary;
pub use overview::{OverviewLog, OverviewStatus};
pub use summary::{OutputPaths, RunSummary, format_duration, format_human_summary};
pub use table::{CsvTable, escape_field};

/// Summary output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Human,
    /// Pretty-printed JSON
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}
