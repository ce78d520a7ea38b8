//! Resolved run configuration, passed explicitly to every component.

use std::time::Duration;

/// Default memory-limit flag injected with `--java-xmx`
pub const DEFAULT_MEMORY_LIMIT_FLAG: &str = "-Xmx16384M";

/// Global options for one benchmark run
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Hard wall-clock limit per external process
    pub timeout: Duration,
    /// Run all queries of a file in one invocation
    pub combine_queries: bool,
    /// Log raw engine output and extracted records
    pub verbose: bool,
    /// Free-form argument string spliced into engine invocations
    pub pass_through_args: String,
    /// Memory-limit flag (e.g. `-Xmx16384M`), injected when set
    pub memory_limit: Option<String>,
    /// Maximum MCMC sampling steps for sampling engines
    pub max_sample_steps: Option<u64>,
    /// Skip remaining files of a setting after two consecutive failures
    pub timeout_skip: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            combine_queries: false,
            verbose: false,
            pass_through_args: String::new(),
            memory_limit: None,
            max_sample_steps: None,
            timeout_skip: true,
        }
    }
}

impl RunOptions {
    /// Whether any pass-through arguments survive quote stripping.
    pub fn has_pass_through(&self) -> bool {
        !crate::split_pass_through(&self.pass_through_args).is_empty()
    }
}
