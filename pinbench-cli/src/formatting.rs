//! Plan listing for `list` and `--dry-run`

use crate::planner::ExecutionPlan;
use pinbench_core::EngineAdapter;
use std::fmt::Write;

/// Render the plan as a tree of settings and files with their query counts.
pub fn format_plan(plan: &ExecutionPlan, adapter: &dyn EngineAdapter) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "PinBench Plan: {} ({}) in '{}'",
        adapter.name(),
        adapter.tag(),
        plan.directory.display()
    );

    let mut queries = 0;
    for (setting, files) in plan.settings() {
        let _ = writeln!(out, "├── setting: {setting}");
        for file in files {
            match std::fs::read_to_string(&file.path) {
                Ok(contents) => {
                    let count = adapter.query_strings(&contents).len();
                    queries += count;
                    let _ = writeln!(out, "│   ├── {} ({count} queries)", file.file_name);
                }
                Err(e) => {
                    let _ = writeln!(out, "│   ├── {} (unreadable: {e})", file.file_name);
                }
            }
        }
    }

    let _ = writeln!(
        out,
        "{} files in {} settings, {} queries found.",
        plan.files.len(),
        plan.settings().len(),
        queries
    );
    out
}
