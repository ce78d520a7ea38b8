//! Query Objects
//!
//! A `Query` binds one extracted query string to its source model file and
//! the adapter that knows how to run it.

use crate::adapter::EngineAdapter;
use crate::error::CoreError;
use crate::options::RunOptions;
use crate::runner::{ExecutionOutput, ProcessRunner};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// One query of one model file
#[derive(Clone)]
pub struct Query {
    text: String,
    source: PathBuf,
    adapter: Arc<dyn EngineAdapter>,
}

impl Query {
    /// Bind `text` from `source` to `adapter`.
    pub fn new(
        text: impl Into<String>,
        source: impl Into<PathBuf>,
        adapter: Arc<dyn EngineAdapter>,
    ) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            adapter,
        }
    }

    /// Query string as written in the model file.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Model file the query came from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Adapter used to build and interpret the run.
    pub fn adapter(&self) -> &Arc<dyn EngineAdapter> {
        &self.adapter
    }

    /// Run this query on its own.
    ///
    /// Any scratch model file the adapter creates is deleted before this
    /// returns, whether or not the run succeeded.
    pub async fn execute(
        &self,
        runner: &ProcessRunner,
        options: &RunOptions,
    ) -> Result<ExecutionOutput, CoreError> {
        let invocation = self
            .adapter
            .build_single_command(&self.text, &self.source, options)?;
        if let Some(scratch) = &invocation.scratch {
            info!(
                "    More than 1 query found. Using temporary model file (with single query): {}",
                scratch.path().display()
            );
        }
        let output = runner.run(&invocation.command).await;
        drop(invocation);
        Ok(output?)
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("text", &self.text)
            .field("source", &self.source)
            .field("adapter", &self.adapter.name())
            .finish()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Extract every query of `contents` and bind it to `source`.
pub fn bind_queries(
    adapter: &Arc<dyn EngineAdapter>,
    contents: &str,
    source: &Path,
) -> Vec<Query> {
    adapter
        .query_strings(contents)
        .into_iter()
        .map(|text| Query::new(text, source, Arc::clone(adapter)))
        .collect()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::adapter::Invocation;
    use crate::command::EngineCommand;
    use crate::error::{AdapterError, ExtractionError};
    use crate::record::ResultRecord;
    use std::io::Write;
    use std::time::Duration;

    /// Writes the query to a scratch file and prints it back.
    struct EchoAdapter;

    impl EngineAdapter for EchoAdapter {
        fn name(&self) -> &str {
            "Echo"
        }
        fn tag(&self) -> String {
            "echo".into()
        }
        fn extension(&self) -> &str {
            "txt"
        }
        fn executable(&self) -> &Path {
            Path::new("sh")
        }
        fn record_template(&self, _options: &RunOptions) -> ResultRecord {
            ResultRecord::with_columns(["filename", "query", "answer"])
        }
        fn query_strings(&self, contents: &str) -> Vec<String> {
            contents
                .lines()
                .filter(|l| l.starts_with("query"))
                .map(str::to_string)
                .collect()
        }
        fn build_single_command(
            &self,
            query: &str,
            source: &Path,
            _options: &RunOptions,
        ) -> Result<Invocation, AdapterError> {
            let mut scratch = tempfile::NamedTempFile::new()?;
            writeln!(scratch, "{query}")?;
            let script = format!(
                "echo '{0}'; cat '{0}'; test -e '{1}'",
                scratch.path().display(),
                source.display()
            );
            let command = EngineCommand::new("sh", ["-c".to_string(), script]);
            Ok(Invocation::new(command).with_scratch(scratch))
        }
        fn detect_error(&self, _stdout: &str, stderr: &str) -> bool {
            !stderr.is_empty()
        }
        fn extract_record(
            &self,
            stdout: &str,
            options: &RunOptions,
        ) -> Result<ResultRecord, ExtractionError> {
            let mut record = self.record_template(options);
            record.set("answer", stdout.trim());
            Ok(record)
        }
    }

    #[test]
    fn binds_each_query_to_source() {
        let adapter: Arc<dyn EngineAdapter> = Arc::new(EchoAdapter);
        let queries = bind_queries(&adapter, "x\nquery A\nquery B\n", Path::new("m.txt"));
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[1].text(), "query B");
        assert_eq!(queries[0].source(), Path::new("m.txt"));
    }

    #[tokio::test]
    async fn execute_is_repeatable_and_cleans_scratch() {
        let adapter: Arc<dyn EngineAdapter> = Arc::new(EchoAdapter);
        let query = Query::new("query A", "/", adapter);
        let runner = ProcessRunner::new(Duration::from_secs(5));
        let options = RunOptions::default();

        let first = query.execute(&runner, &options).await.unwrap();
        let second = query.execute(&runner, &options).await.unwrap();
        let (scratch_path, body) = first.stdout.split_once('\n').unwrap();
        assert_eq!(body, "query A\n");
        assert!(!Path::new(scratch_path).exists());
        assert_eq!(second.stdout.split_once('\n').unwrap().1, "query A\n");
    }
}
