#![warn(missing_docs)]
//! # PinBench
//!
//! Benchmark driver for probabilistic inference engines.
//!
//! PinBench walks a directory of model files, runs every query through an
//! external inference engine and records what happened:
//! - **Hard Timeouts**: each engine invocation is killed once its wall-clock budget is spent
//! - **Adaptive Exclusion**: after two consecutive failing files of a setting, its larger models are skipped
//! - **Engine Adapters**: Forclift, Alchemy, GC-FOVE, lifted junction trees and BLOG behind one trait
//! - **Result Records**: sentinel-seeded rows that are only written once fully populated
//! - **Run Outputs**: CSV result table, per-query overview log, run log and summary
//!
//! ## Quick Start
//!
//! ```text
//! pinbench models/ --framework jt --engine fojt.LiftedJTEngine --timeout 600
//! pinbench models/ -f blog -c -p "'-n 100000'"
//! pinbench models/ -f forclift --dry-run
//! ```

// Re-export core types
pub use pinbench_core::{
    AdapterError, CoreError, EngineAdapter, EngineCommand, ErrorKind, ExecutionOutput,
    ExtractionError, FieldValue, Invocation, ProcessRunner, Query, QueryOutcome, ResultRecord,
    RunOptions, RunnerError, TIMEOUT_MARKER, bind_queries,
};

// Re-export engine adapters
pub use pinbench_engines::{Framework, InferenceEngine, build_adapter};

// Re-export report writers
pub use pinbench_report::{CsvTable, OutputFormat, OverviewLog, OverviewStatus, RunSummary};

// Re-export orchestration
pub use pinbench_cli::{
    Cli, ExecutionPlan, InputFile, PinConfig, RunContext, RunStats, StatusCounters, build_plan,
};

/// Run the PinBench CLI.
///
/// Call this from a binary's `main()`:
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     pinbench::run()
/// }
/// ```
pub use pinbench_cli::run;
