//! External Command Lines
//!
//! An `EngineCommand` is a program plus its argument vector. Adapters build
//! the base invocation and then splice in global options (memory limit,
//! pass-through arguments, sampling steps) at adapter-defined positions.

use std::fmt;
use std::path::PathBuf;

/// A fully-resolved external invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    /// Executable name or path
    pub program: String,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Working directory for the child (inherits ours when `None`)
    pub working_dir: Option<PathBuf>,
}

impl EngineCommand {
    /// Create a command from a program name and its arguments.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            working_dir: None,
        }
    }

    /// Run the child inside `dir`.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Insert `values` so that the first one lands at `index` of the full argv.
    ///
    /// Index 0 is the program itself, so argv index `i` maps to `args[i - 1]`.
    /// Out-of-range positions are clamped to the end.
    pub fn insert_at<I, S>(&mut self, index: usize, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let at = index.saturating_sub(1).min(self.args.len());
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        self.args.splice(at..at, values);
    }

    /// Splice the free-form pass-through string in at argv `index`.
    pub fn insert_pass_through(&mut self, index: usize, pass_through: &str) {
        let parts = split_pass_through(pass_through);
        if !parts.is_empty() {
            self.insert_at(index, parts);
        }
    }

    /// Full argv, program first.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.argv().join(" "))
    }
}

/// Split a pass-through argument string into argv entries.
///
/// Surrounding quote characters are stripped first: single quotes if any are
/// present, otherwise double quotes.
pub fn split_pass_through(raw: &str) -> Vec<String> {
    let cleaned = if raw.contains('\'') {
        raw.replace('\'', "")
    } else if raw.contains('"') {
        raw.replace('"', "")
    } else {
        raw.to_string()
    };

    cleaned.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_uses_argv_positions() {
        let mut cmd = EngineCommand::new("java", ["-jar", "forclift.jar", "-q", "Q", "m.mln"]);
        cmd.insert_at(1, ["-Xmx16384M"]);
        assert_eq!(
            cmd.argv(),
            vec!["java", "-Xmx16384M", "-jar", "forclift.jar", "-q", "Q", "m.mln"]
        );
    }

    #[test]
    fn pass_through_lands_after_jar() {
        let mut cmd = EngineCommand::new("java", ["-jar", "forclift.jar", "-q", "Q", "m.mln"]);
        cmd.insert_pass_through(3, "\"--verbose --seed 4\"");
        assert_eq!(
            cmd.to_string(),
            "java -jar forclift.jar --verbose --seed 4 -q Q m.mln"
        );
    }

    #[test]
    fn empty_pass_through_is_noop() {
        let mut cmd = EngineCommand::new("./engine", ["-q", "Q"]);
        cmd.insert_pass_through(1, "");
        cmd.insert_pass_through(1, "''");
        assert_eq!(cmd.args, vec!["-q", "Q"]);
    }

    #[test]
    fn out_of_range_insert_appends() {
        let mut cmd = EngineCommand::new("tool", ["a"]);
        cmd.insert_at(99, ["z"]);
        assert_eq!(cmd.args, vec!["a", "z"]);
    }

    #[test]
    fn split_strips_single_quotes_first() {
        assert_eq!(
            split_pass_through("'-a \"x\"'"),
            vec!["-a".to_string(), "\"x\"".to_string()]
        );
    }
}
