//! BLOG sampling engine (`blog.Main`), combined query mode only.

use crate::text::{keyword_lines, query_probabilities, value_after_tag};
use pinbench_core::{
    AdapterError, EngineAdapter, EngineCommand, ExtractionError, Invocation, ResultRecord,
    RunOptions,
};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default engine directory, looked up in the working directory
pub const BLOG_ENGINE_DIR: &str = "BLOGEngine";

const LIBRARIES: [&str; 11] = [
    "blog.blog-0.10.alpha1.jar",
    "java-cup-11b.jar",
    "zmq.jar",
    "org.scala-lang.scala-library-2.10.6.jar",
    "gov.nist.math.jama-1.0.3.jar",
    "com.google.code.gson.gson-2.2.4.jar",
    "org.apache.commons.commons-math3-3.0.jar",
    "de.jflex.jflex-1.6.0.jar",
    "org.apache.ant.ant-1.7.0.jar",
    "org.apache.ant.ant-launcher-1.7.0.jar",
    "com.github.tototoshi.scala-csv_2.10-1.1.1.jar",
];

const MAIN_CLASS: &str = "blog.Main";
const COLUMNS: [&str; 4] = ["filename", "query", "P(query)", "time"];
const ELAPSED_TAG: &str = "Total elapsed time:";

#[cfg(windows)]
const CLASS_PATH_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const CLASS_PATH_SEPARATOR: &str = ":";

/// BLOG adapter
#[derive(Debug, Clone)]
pub struct BlogAdapter {
    engine_dir: PathBuf,
}

impl BlogAdapter {
    /// Adapter using the jars under `<engine_dir>/lib`.
    pub fn new(engine_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine_dir: engine_dir.into(),
        }
    }

    fn class_path(&self) -> String {
        let lib = self.engine_dir.join("lib");
        LIBRARIES
            .iter()
            .map(|jar| lib.join(jar).display().to_string())
            .collect::<Vec<_>>()
            .join(CLASS_PATH_SEPARATOR)
    }
}

impl EngineAdapter for BlogAdapter {
    fn name(&self) -> &str {
        "BLOG"
    }

    fn tag(&self) -> String {
        "blog_SamplingEngine".to_string()
    }

    fn extension(&self) -> &str {
        "blog"
    }

    fn executable(&self) -> &Path {
        &self.engine_dir
    }

    fn inference_engine(&self) -> Option<&str> {
        Some("SamplingEngine")
    }

    fn record_template(&self, _options: &RunOptions) -> ResultRecord {
        ResultRecord::with_columns(COLUMNS)
    }

    fn query_strings(&self, contents: &str) -> Vec<String> {
        keyword_lines(contents, "query")
    }

    fn supports_single(&self) -> bool {
        false
    }

    fn supports_combined(&self) -> bool {
        true
    }

    fn build_single_command(
        &self,
        _query: &str,
        _source: &Path,
        _options: &RunOptions,
    ) -> Result<Invocation, AdapterError> {
        Err(AdapterError::NotImplemented(
            "Single query mode for BLOG (use combined query mode)".to_string(),
        ))
    }

    fn build_combined_command(
        &self,
        _composed: &str,
        source: &Path,
        options: &RunOptions,
    ) -> Result<Invocation, AdapterError> {
        let mut cmd = EngineCommand::new(
            "java",
            [
                "-cp".to_string(),
                self.class_path(),
                MAIN_CLASS.to_string(),
                source.display().to_string(),
            ],
        );
        cmd.insert_pass_through(4, &options.pass_through_args);
        if let Some(flag) = &options.memory_limit {
            cmd.insert_at(1, [flag.as_str()]);
        }
        Ok(Invocation::new(cmd))
    }

    fn detect_error(&self, _stdout: &str, stderr: &str) -> bool {
        !stderr.is_empty()
    }

    /// Elapsed time and the first query's probability.
    fn extract_record(
        &self,
        stdout: &str,
        options: &RunOptions,
    ) -> Result<ResultRecord, ExtractionError> {
        let mut record = self.record_template(options);

        match value_after_tag(stdout, ELAPSED_TAG) {
            Some(time) => {
                record.set("time", time);
            }
            None => warn!("Output from jar execution not in standard format (missing '{ELAPSED_TAG}')."),
        }

        let probabilities = query_probabilities(stdout, Some(ELAPSED_TAG))?;
        if let Some(first) = probabilities.first() {
            record.set("P(query)", first.value.clone());
        }
        Ok(record)
    }
}
