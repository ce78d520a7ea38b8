//! Error types shared by runner, adapters and orchestration.

use thiserror::Error;

/// Failure while launching or waiting on an external process.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed waiting for process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("Empty command line")]
    EmptyCommand,
}

/// Failure raised by an engine adapter outside of output parsing.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{0} is not implemented for this engine")]
    NotImplemented(String),

    #[error("{engine} is only supported on {required}, not on {actual}")]
    UnsupportedPlatform {
        engine: String,
        required: String,
        actual: String,
    },

    #[error("Inference engine '{engine}' is not available for {framework}")]
    InvalidEngine { framework: String, engine: String },

    #[error("Did not find the needed executable / jar file. Should be named '{0}'")]
    MissingExecutable(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Captured output did not have the shape an adapter expects.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("marker '{0}' not found in output")]
    MissingMarker(String),

    #[error("unexpected output shape: {0}")]
    Malformed(String),

    #[error("extraction panicked: {0}")]
    Panicked(String),
}

/// Error returned by `Query::execute`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Runner(#[from] RunnerError),
}
