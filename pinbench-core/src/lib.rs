#![warn(missing_docs)]
//! PinBench Core - Execution Primitives
//!
//! This crate provides the building blocks every benchmark run is made of:
//! - `ProcessRunner` executes one external command under a hard wall-clock timeout
//! - `EngineAdapter` is the per-backend contract (queries, commands, output parsing)
//! - `Query` binds one extracted query to its source file and adapter
//! - `ResultRecord` is the sentinel-seeded output row filled in by adapters
//! - `RunOptions` carries the resolved run configuration explicitly

mod adapter;
mod command;
mod error;
mod options;
mod outcome;
mod query;
mod record;
mod runner;

pub use adapter::{
    EngineAdapter, ErrorKind, Invocation, classify_java_error, sibling_with_extension,
};
pub use command::{EngineCommand, split_pass_through};
pub use error::{AdapterError, CoreError, ExtractionError, RunnerError};
pub use options::{DEFAULT_MEMORY_LIMIT_FLAG, RunOptions};
pub use outcome::QueryOutcome;
pub use query::{Query, bind_queries};
pub use record::{FieldValue, ResultRecord};
pub use runner::{ExecutionOutput, ProcessRunner, TIMEOUT_MARKER};
