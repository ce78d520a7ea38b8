//! Query dispatch
//!
//! Runs the queries of one file, either one invocation per query or one
//! combined invocation, and turns every captured output into a
//! `QueryOutcome`. Nothing in here aborts the run: launch failures, engine
//! errors, malformed output and panics inside the parsers all become
//! outcomes that are counted and logged.

use super::RunContext;
use super::exclusion::StatusCounters;
use crate::planner::InputFile;
use pinbench_core::{
    ErrorKind, ExecutionOutput, ExtractionError, Query, QueryOutcome, ResultRecord, bind_queries,
};
use pinbench_report::OverviewStatus;
use std::fmt;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error, info, warn};

impl<T: Write, O: Write> RunContext<T, O> {
    /// Run every query of `file`, counting outcomes into `counters`.
    pub(super) async fn run_file(
        &mut self,
        file: &InputFile,
        counters: &mut StatusCounters,
    ) -> io::Result<()> {
        let contents = match tokio::fs::read_to_string(&file.path).await {
            Ok(contents) => contents,
            Err(e) => {
                let outcome = launch_failure(format_args!("Could not read model file: {e}"));
                counters.record(&outcome);
                return self
                    .overview
                    .write_file(&file.display(), OverviewStatus::from(&outcome));
            }
        };

        let queries = bind_queries(&self.adapter, &contents, &file.path);
        info!(
            "    Found {} queries: {:?}",
            queries.len(),
            queries.iter().map(Query::text).collect::<Vec<_>>()
        );

        if self.options.combine_queries {
            self.run_combined(file, &queries, counters).await
        } else {
            self.run_single(file, &queries, counters).await
        }
    }

    async fn run_single(
        &mut self,
        file: &InputFile,
        queries: &[Query],
        counters: &mut StatusCounters,
    ) -> io::Result<()> {
        for (i, query) in queries.iter().enumerate() {
            info!("    -- Query no. {}/{}: '{}'", i + 1, queries.len(), query);

            let outcome = match query.execute(&self.runner, &self.options).await {
                Ok(output) => self.interpret(output, file, Some(query.text()), |stdout| {
                    self.adapter
                        .extract_record(stdout, &self.options)
                        .map(|record| vec![record])
                }),
                Err(e) => launch_failure(e),
            };

            counters.record(&outcome);
            self.write_records(&outcome)?;
            self.overview
                .write_query(&file.display(), query.text(), OverviewStatus::from(&outcome))?;
        }
        Ok(())
    }

    async fn run_combined(
        &mut self,
        file: &InputFile,
        queries: &[Query],
        counters: &mut StatusCounters,
    ) -> io::Result<()> {
        let texts: Vec<String> = queries.iter().map(|q| q.text().to_string()).collect();
        let composed = self.adapter.compose_queries(&texts);
        info!("    -- Executing combined query string '{composed}'");

        let outcome = match self.execute_combined(file, &composed).await {
            Ok(output) => self.interpret(output, file, None, |stdout| {
                self.adapter
                    .extract_combined_records(&texts, stdout, &self.options)
            }),
            Err(e) => launch_failure(e),
        };

        counters.record(&outcome);
        self.write_records(&outcome)?;
        self.overview
            .write_file(&file.display(), OverviewStatus::from(&outcome))
    }

    async fn execute_combined(
        &self,
        file: &InputFile,
        composed: &str,
    ) -> Result<ExecutionOutput, pinbench_core::CoreError> {
        let invocation =
            self.adapter
                .build_combined_command(composed, &file.path, &self.options)?;
        let output = self.runner.run(&invocation.command).await;
        drop(invocation);
        Ok(output?)
    }

    /// Classify captured output: timeout, engine error, extraction, validation.
    fn interpret<F>(
        &self,
        output: ExecutionOutput,
        file: &InputFile,
        query: Option<&str>,
        extract: F,
    ) -> QueryOutcome
    where
        F: FnOnce(&str) -> Result<Vec<ResultRecord>, ExtractionError>,
    {
        if output.timed_out {
            warn!("    Timeout in script execution.");
            return QueryOutcome::Timeout;
        }

        if self.adapter.detect_error(&output.stdout, &output.stderr) {
            let kind = self.adapter.classify_error(&output.stderr);
            let message = self.adapter.error_message(&output.stdout, &output.stderr);
            error!(
                "    Error in script execution ({}). Output:\n{}",
                kind.label(),
                message.replace("\r\n\tat", "\n\tat")
            );
            return QueryOutcome::ExecutionError { kind, message };
        }

        let extracted = panic::catch_unwind(AssertUnwindSafe(|| extract(&output.stdout)));
        let records = match extracted {
            Ok(Ok(records)) => records,
            Ok(Err(e)) => {
                error!("    Could not extract results from output: {e}");
                return QueryOutcome::ExtractionError {
                    message: e.to_string(),
                };
            }
            Err(panic) => {
                let message = if let Some(s) = panic.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                let e = ExtractionError::Panicked(message);
                error!("    Could not extract results from output: {e}");
                return QueryOutcome::ExtractionError {
                    message: e.to_string(),
                };
            }
        };

        validate(records, file, query)
    }

    fn write_records(&mut self, outcome: &QueryOutcome) -> io::Result<()> {
        for record in outcome.records() {
            self.table.write_record(record)?;
        }
        Ok(())
    }
}

/// Stamp file (and query) into each record and split valid from invalid.
fn validate(records: Vec<ResultRecord>, file: &InputFile, query: Option<&str>) -> QueryOutcome {
    if records.is_empty() {
        error!("    No results found in engine output.");
        return QueryOutcome::ExtractionError {
            message: "no results in output".to_string(),
        };
    }

    let mut valid = Vec::with_capacity(records.len());
    let mut missing: Vec<String> = Vec::new();
    for mut record in records {
        record.set("filename", file.display());
        if let Some(query) = query {
            record.set("query", query);
        }
        debug!("    Extracted: {record:?}");

        if record.is_valid() {
            valid.push(record);
            continue;
        }
        let fields = record.missing_fields();
        error!("    Info not okay (contains -1 value) for: {}", fields.join(", "));
        for field in fields {
            if !missing.contains(&field) {
                missing.push(field);
            }
        }
    }

    if missing.is_empty() {
        QueryOutcome::Success(valid)
    } else {
        QueryOutcome::ValidationError { missing, valid }
    }
}

fn launch_failure(e: impl fmt::Display) -> QueryOutcome {
    error!("    Could not execute query: {e}");
    QueryOutcome::ExecutionError {
        kind: ErrorKind::Unspecified,
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinbench_core::FieldValue;

    fn record(time: FieldValue) -> ResultRecord {
        ResultRecord::with_columns(["filename", "query", "time"]).preset("time", time)
    }

    #[test]
    fn test_validate_stamps_filename_and_query() {
        let file = InputFile::new("m/a#1.mln");
        let outcome = validate(vec![record(FieldValue::Int(12))], &file, Some("Q(x)"));
        let QueryOutcome::Success(records) = outcome else {
            panic!("expected success, got {outcome:?}");
        };
        assert_eq!(records[0].get("filename"), Some(&FieldValue::from("m/a#1.mln")));
        assert_eq!(records[0].get("query"), Some(&FieldValue::from("Q(x)")));
    }

    #[test]
    fn test_validate_keeps_valid_records_of_partial_result() {
        let file = InputFile::new("m/a#1.blog");
        let records = vec![
            record(FieldValue::Int(3)).preset("query", "A"),
            record(FieldValue::Unset).preset("query", "B"),
        ];
        match validate(records, &file, None) {
            QueryOutcome::ValidationError { missing, valid } => {
                assert_eq!(missing, vec!["time".to_string()]);
                assert_eq!(valid.len(), 1);
                assert_eq!(valid[0].get("query"), Some(&FieldValue::from("A")));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn test_validate_empty_is_extraction_error() {
        let file = InputFile::new("m/a.mln");
        assert!(matches!(
            validate(Vec::new(), &file, None),
            QueryOutcome::ExtractionError { .. }
        ));
    }

    #[test]
    fn test_launch_failure_is_unspecified() {
        match launch_failure("no such file") {
            QueryOutcome::ExecutionError { kind, message } => {
                assert_eq!(kind, ErrorKind::Unspecified);
                assert_eq!(message, "no such file");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
