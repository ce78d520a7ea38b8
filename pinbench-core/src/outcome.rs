//! Per-query outcome taxonomy.

use crate::adapter::ErrorKind;
use crate::record::ResultRecord;

/// Classified result of executing one query (or one combined invocation)
///
/// Every variant is recovered locally by the orchestrator; none aborts a run.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Output parsed into valid records
    Success(Vec<ResultRecord>),
    /// The process hit the wall-clock limit and was killed
    Timeout,
    /// The engine reported a failure
    ExecutionError {
        /// Coarse classification for the overview log
        kind: ErrorKind,
        /// Human-readable error output
        message: String,
    },
    /// Output did not have the expected shape (or parsing panicked)
    ExtractionError {
        /// What went wrong
        message: String,
    },
    /// A record was produced but some fields were never filled
    ValidationError {
        /// Columns still holding the sentinel
        missing: Vec<String>,
        /// Records of the same run that did validate (combined mode)
        valid: Vec<ResultRecord>,
    },
}

impl QueryOutcome {
    /// Short status label.
    pub fn label(&self) -> &'static str {
        match self {
            QueryOutcome::Success(_) => "all ok",
            QueryOutcome::Timeout => "timeout",
            QueryOutcome::ExecutionError { kind, .. } => kind.label(),
            QueryOutcome::ExtractionError { .. } | QueryOutcome::ValidationError { .. } => {
                "error (info extraction)"
            }
        }
    }

    /// True only for `Success`.
    pub fn is_success(&self) -> bool {
        matches!(self, QueryOutcome::Success(_))
    }

    /// Records that passed validation and belong in the result table.
    pub fn records(&self) -> &[ResultRecord] {
        match self {
            QueryOutcome::Success(records) => records,
            QueryOutcome::ValidationError { valid, .. } => valid,
            _ => &[],
        }
    }
}
