//! Engine Adapter Contract
//!
//! Each external inference engine is driven through one `EngineAdapter`
//! implementation. The adapter owns everything engine specific: which files
//! it reads, how queries are pulled out of them, how the command line looks,
//! what counts as a failure and how output text maps onto a `ResultRecord`.
//! The orchestrator only ever talks to `dyn EngineAdapter`.

use crate::command::EngineCommand;
use crate::error::{AdapterError, ExtractionError};
use crate::options::RunOptions;
use crate::record::ResultRecord;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Coarse error taxonomy used for the overview log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Allocation size overflowed (`NegativeArraySizeException`)
    CapacityExhausted,
    /// Index out of bounds (`ArrayIndexOutOfBoundsException`)
    OutOfBounds,
    /// Heap exhausted (`Java heap space`)
    OutOfMemory,
    /// Anything else
    Unspecified,
}

impl ErrorKind {
    /// Overview log label.
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::CapacityExhausted => "NegativeArraySizeException",
            ErrorKind::OutOfBounds => "ArrayIndexOutOfBoundsException",
            ErrorKind::OutOfMemory => "OutOfMemoryError:JavaHeapSpace",
            ErrorKind::Unspecified => "unspecified error",
        }
    }
}

/// Map JVM error output to an `ErrorKind` by substring matching.
pub fn classify_java_error(stderr: &str) -> ErrorKind {
    if stderr.contains("NegativeArraySizeException") {
        ErrorKind::CapacityExhausted
    } else if stderr.contains("ArrayIndexOutOfBoundsException") {
        ErrorKind::OutOfBounds
    } else if stderr.contains("Java heap space") {
        ErrorKind::OutOfMemory
    } else {
        ErrorKind::Unspecified
    }
}

/// A command ready to run, plus any scratch file it depends on
///
/// The scratch file is removed when the invocation is dropped, so it lives
/// exactly as long as the execution that needs it.
#[derive(Debug)]
pub struct Invocation {
    /// Command line to execute
    pub command: EngineCommand,
    /// Temporary model file referenced by `command`
    pub scratch: Option<NamedTempFile>,
}

impl Invocation {
    /// Invocation without a scratch file.
    pub fn new(command: EngineCommand) -> Self {
        Self {
            command,
            scratch: None,
        }
    }

    /// Attach a scratch file that must outlive the execution.
    pub fn with_scratch(mut self, scratch: NamedTempFile) -> Self {
        self.scratch = Some(scratch);
        self
    }
}

/// Per-engine capability used by the orchestrator
pub trait EngineAdapter: Send + Sync {
    /// Display name, e.g. `Forclift`.
    fn name(&self) -> &str;

    /// Tag used in output file names, e.g. `gcfove_LVE`.
    fn tag(&self) -> String;

    /// Model file extension without the dot.
    fn extension(&self) -> &str;

    /// Path of the executable or jar the adapter needs (checked at startup).
    fn executable(&self) -> &Path;

    /// Selected inference engine, if the framework has a choice.
    fn inference_engine(&self) -> Option<&str> {
        None
    }

    /// Startup banner.
    fn start_message(&self) -> String {
        match self.inference_engine() {
            Some(engine) => format!(
                "Running benchmark on framework: [{}]\nInference Engine: [{engine}]",
                self.name()
            ),
            None => format!("Running benchmark on framework: [{}]", self.name()),
        }
    }

    /// Fresh record seeded with sentinels for the current mode.
    fn record_template(&self, options: &RunOptions) -> ResultRecord;

    /// Query strings found in a model file's contents.
    fn query_strings(&self, contents: &str) -> Vec<String>;

    /// Whether one query can be run on its own.
    fn supports_single(&self) -> bool {
        true
    }

    /// Whether all queries of a file can be run in one invocation.
    fn supports_combined(&self) -> bool {
        false
    }

    /// Fatal startup checks (platform, option combinations).
    fn validate(&self, _options: &RunOptions) -> Result<(), AdapterError> {
        Ok(())
    }

    /// Build the invocation for one query of `source`.
    fn build_single_command(
        &self,
        query: &str,
        source: &Path,
        options: &RunOptions,
    ) -> Result<Invocation, AdapterError>;

    /// Build one invocation answering every query of `source`.
    fn build_combined_command(
        &self,
        _composed: &str,
        _source: &Path,
        _options: &RunOptions,
    ) -> Result<Invocation, AdapterError> {
        Err(AdapterError::NotImplemented(format!(
            "Combined query mode for {}",
            self.name()
        )))
    }

    /// Join query strings for a combined invocation.
    fn compose_queries(&self, queries: &[String]) -> String {
        queries.join(",")
    }

    /// True when the captured output indicates a failed run.
    fn detect_error(&self, stdout: &str, stderr: &str) -> bool;

    /// Classify a failure for the overview log.
    fn classify_error(&self, stderr: &str) -> ErrorKind {
        classify_java_error(stderr)
    }

    /// Error text shown in the run log.
    fn error_message(&self, _stdout: &str, stderr: &str) -> String {
        stderr.to_string()
    }

    /// Parse the output of a single-query run.
    ///
    /// Fields that cannot be found stay at their sentinel; an `Err` means the
    /// output as a whole was unusable.
    fn extract_record(
        &self,
        stdout: &str,
        options: &RunOptions,
    ) -> Result<ResultRecord, ExtractionError>;

    /// Parse the output of a combined run into one record per query.
    ///
    /// Results are associated with `queries` by position. The default yields
    /// one coarse record whose query is the composed string.
    fn extract_combined_records(
        &self,
        queries: &[String],
        stdout: &str,
        options: &RunOptions,
    ) -> Result<Vec<ResultRecord>, ExtractionError> {
        let mut record = self.extract_record(stdout, options)?;
        record.set("query", self.compose_queries(queries));
        Ok(vec![record])
    }

    /// Remove engine side files at the end of a run.
    fn cleanup(&self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Sibling path of `source` with another extension.
pub fn sibling_with_extension(source: &Path, extension: &str) -> PathBuf {
    source.with_extension(extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn java_errors_are_classified_by_substring() {
        assert_eq!(
            classify_java_error("Exception in thread \"main\" java.lang.NegativeArraySizeException"),
            ErrorKind::CapacityExhausted
        );
        assert_eq!(
            classify_java_error("java.lang.ArrayIndexOutOfBoundsException: 3"),
            ErrorKind::OutOfBounds
        );
        assert_eq!(
            classify_java_error("java.lang.OutOfMemoryError: Java heap space"),
            ErrorKind::OutOfMemory
        );
        assert_eq!(classify_java_error("segfault"), ErrorKind::Unspecified);
        assert_eq!(classify_java_error(""), ErrorKind::Unspecified);
    }

    #[test]
    fn earlier_patterns_win() {
        let text = "NegativeArraySizeException ... Java heap space";
        assert_eq!(classify_java_error(text), ErrorKind::CapacityExhausted);
    }

    #[test]
    fn sibling_swaps_extension() {
        let path = sibling_with_extension(Path::new("models/smokers#3.mln"), "db");
        assert_eq!(path, PathBuf::from("models/smokers#3.db"));
    }
}
