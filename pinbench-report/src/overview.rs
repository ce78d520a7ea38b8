//! Overview Log
//!
//! One status line per query (single mode) or per file (combined mode),
//! flushed immediately so a crashed run still leaves a usable log.

use pinbench_core::{ErrorKind, QueryOutcome};
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Status written to the overview log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverviewStatus {
    /// Valid record(s) produced
    AllOk,
    /// Process killed on timeout
    Timeout,
    /// Output could not be turned into a valid record
    InfoExtraction,
    /// Engine reported an error of the given kind
    Error(ErrorKind),
    /// File skipped because of the exclusion set
    Skipped,
}

impl OverviewStatus {
    /// Text used in the log.
    pub fn label(self) -> &'static str {
        match self {
            OverviewStatus::AllOk => "all ok",
            OverviewStatus::Timeout => "timeout",
            OverviewStatus::InfoExtraction => "error (info extraction)",
            OverviewStatus::Error(kind) => kind.label(),
            OverviewStatus::Skipped => "timeout or error skip",
        }
    }
}

impl fmt::Display for OverviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<&QueryOutcome> for OverviewStatus {
    fn from(outcome: &QueryOutcome) -> Self {
        match outcome {
            QueryOutcome::Success(_) => OverviewStatus::AllOk,
            QueryOutcome::Timeout => OverviewStatus::Timeout,
            QueryOutcome::ExecutionError { kind, .. } => OverviewStatus::Error(*kind),
            QueryOutcome::ExtractionError { .. } | QueryOutcome::ValidationError { .. } => {
                OverviewStatus::InfoExtraction
            }
        }
    }
}

/// Line-oriented overview writer
pub struct OverviewLog<W: Write> {
    writer: W,
    lines: usize,
}

impl OverviewLog<File> {
    /// Create the log file at `path`.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> OverviewLog<W> {
    /// Wrap `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer, lines: 0 }
    }

    /// Lines written so far.
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// `<file>, "<query>", <status>`
    pub fn write_query(&mut self, file: &str, query: &str, status: OverviewStatus) -> io::Result<()> {
        self.write_line(format_args!("{file}, \"{query}\", {status}"))
    }

    /// `<file>, <status>`
    pub fn write_file(&mut self, file: &str, status: OverviewStatus) -> io::Result<()> {
        self.write_line(format_args!("{file}, {status}"))
    }

    /// Skip line: per file in combined mode, `"all queries"` otherwise.
    pub fn write_skip(&mut self, file: &str, combined: bool) -> io::Result<()> {
        if combined {
            self.write_file(file, OverviewStatus::Skipped)
        } else {
            self.write_query(file, "all queries", OverviewStatus::Skipped)
        }
    }

    /// Return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, line: fmt::Arguments<'_>) -> io::Result<()> {
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        self.lines += 1;
        Ok(())
    }
}
