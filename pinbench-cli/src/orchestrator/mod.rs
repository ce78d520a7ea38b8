//! Run Orchestration
//!
//! Walks the planned files in order, dispatches their queries to the engine
//! adapter and feeds the per-file outcome into the adaptive exclusion.

mod dispatch;
mod exclusion;

pub use exclusion::{ExclusionSet, FAILURE_THRESHOLD, FailureTracker, StatusCounters};

use crate::planner::InputFile;
use pinbench_core::{EngineAdapter, ProcessRunner, RunOptions};
use pinbench_report::{CsvTable, OverviewLog};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::info;

/// Totals gathered by [`RunContext::run`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Files in the plan
    pub files_found: usize,
    /// Files executed
    pub files_processed: usize,
    /// Files skipped by the exclusion set
    pub files_skipped: usize,
    /// Outcome counts over all files
    pub totals: StatusCounters,
    /// Rows appended to the result table
    pub records_written: usize,
    /// Excluded prefixes in the order they were added
    pub excluded_prefixes: Vec<String>,
}

/// Process-wide state of one benchmark run
///
/// Owns the adapter, the resolved options, the runner and both output sinks.
pub struct RunContext<T: Write, O: Write> {
    adapter: Arc<dyn EngineAdapter>,
    options: RunOptions,
    runner: ProcessRunner,
    table: CsvTable<T>,
    overview: OverviewLog<O>,
}

impl<T: Write, O: Write> RunContext<T, O> {
    /// Bundle everything a run needs.
    pub fn new(
        adapter: Arc<dyn EngineAdapter>,
        options: RunOptions,
        table: CsvTable<T>,
        overview: OverviewLog<O>,
    ) -> Self {
        let runner = ProcessRunner::new(options.timeout).with_output_echo(options.verbose);
        Self {
            adapter,
            options,
            runner,
            table,
            overview,
        }
    }

    /// Adapter driving this run.
    pub fn adapter(&self) -> &Arc<dyn EngineAdapter> {
        &self.adapter
    }

    /// Resolved options.
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Process every file in order.
    ///
    /// Engine failures of any kind are recorded and the loop moves on; only
    /// failures to write the output sinks end the run early.
    pub async fn run(&mut self, files: &[InputFile]) -> io::Result<RunStats> {
        let mut stats = RunStats {
            files_found: files.len(),
            ..RunStats::default()
        };
        let mut tracker = FailureTracker::default();
        let mut excluded = ExclusionSet::default();

        for (i, file) in files.iter().enumerate() {
            tracker.enter(file);
            info!("### File no. {}/{} - '{}'", i + 1, files.len(), file.display());

            if excluded.matches(&file.file_name) {
                info!(
                    "    Skipping file because of previous timeout / (memory) error for same but smaller model."
                );
                self.overview
                    .write_skip(&file.display(), self.options.combine_queries)?;
                stats.files_skipped += 1;
                continue;
            }

            let mut counters = StatusCounters::default();
            let rows_before = self.table.rows();
            self.run_file(file, &mut counters).await?;
            self.table.flush()?;

            info!(
                " >> File summary: success: {}, timeouts: {}, errors: {}",
                counters.success, counters.timeouts, counters.errors
            );

            if let Some(prefix) = tracker.finish(file, &counters, self.options.timeout_skip) {
                info!("    Adding settings prefix '{prefix}' to be excluded for future files.");
                excluded.insert(prefix);
            }

            stats.files_processed += 1;
            stats.records_written += self.table.rows() - rows_before;
            stats.totals.accumulate(&counters);
        }

        stats.excluded_prefixes = excluded.prefixes().to_vec();
        info!(">>> Finished - all work done!");
        Ok(stats)
    }

    /// Flush and hand back the table and overview writers.
    pub fn into_sinks(self) -> io::Result<(T, O)> {
        Ok((self.table.into_inner()?, self.overview.into_inner()))
    }
}
