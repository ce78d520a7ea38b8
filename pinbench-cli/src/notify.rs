//! Completion notification
//!
//! Runs the configured `[notify] command` once after the last file. The
//! command goes through the same runner (and timeout) as the engines; a
//! failing notifier is logged and otherwise ignored.

use pinbench_core::{EngineCommand, ProcessRunner};
use std::path::Path;
use tracing::{info, warn};

/// Placeholder replaced by the model directory
pub const DIRECTORY_PLACEHOLDER: &str = "{directory}";

/// Build the notification command, or `None` when none is configured.
pub fn notify_command(argv: &[String], directory: &Path) -> Option<EngineCommand> {
    let (program, args) = argv.split_first()?;
    let directory = directory.display().to_string();
    let args = args
        .iter()
        .map(|arg| arg.replace(DIRECTORY_PLACEHOLDER, &directory))
        .collect::<Vec<_>>();
    Some(EngineCommand::new(program.clone(), args))
}

/// Run the notification command, if any.
pub async fn notify_completion(runner: &ProcessRunner, argv: &[String], directory: &Path) {
    let Some(command) = notify_command(argv, directory) else {
        return;
    };
    info!("Sending completion notification.");
    match runner.run(&command).await {
        Ok(output) if output.timed_out => warn!("Completion notification timed out."),
        Ok(_) => {}
        Err(e) => warn!("Completion notification failed: {e}"),
    }
}
