//! GC-FOVE lifted variable elimination over BLOG models.
//!
//! The jar-based BLOG engines (GC-FOVE and JT) share the command layout and
//! the single-query model rewrite defined here.

use crate::InferenceEngine;
use crate::text::{QueryProbability, keyword_lines, query_probabilities, value_after_tag};
use pinbench_core::{
    AdapterError, EngineAdapter, EngineCommand, ExtractionError, FieldValue, Invocation,
    ResultRecord, RunOptions,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::warn;

/// Default jar name, looked up in the working directory
pub const GCFOVE_JAR: &str = "gcfove.jar";

const COLUMNS: [&str; 4] = ["filename", "query", "P(query)", "time"];
const TIME_TAG: &str = "**TIME**";

/// `java [mem] -jar <jar> [pt...] -e <engine> <model>`
pub(crate) fn jar_engine_command(
    jar: &Path,
    engine: InferenceEngine,
    model: &Path,
    options: &RunOptions,
) -> EngineCommand {
    let mut cmd = EngineCommand::new(
        "java",
        [
            "-jar".to_string(),
            jar.display().to_string(),
            "-e".to_string(),
            engine.as_arg().to_string(),
            model.display().to_string(),
        ],
    );
    cmd.insert_pass_through(3, &options.pass_through_args);
    if let Some(flag) = &options.memory_limit {
        cmd.insert_at(1, [flag.as_str()]);
    }
    cmd
}

/// Single-query invocation for BLOG models.
///
/// The engines answer every query in a model, so a model mentioning `query`
/// more than once is rewritten into a scratch copy keeping all other lines
/// plus `query` itself.
pub(crate) fn single_query_invocation(
    jar: &Path,
    engine: InferenceEngine,
    query: &str,
    source: &Path,
    options: &RunOptions,
) -> Result<Invocation, AdapterError> {
    let contents = fs::read_to_string(source)?;
    if contents.to_lowercase().matches("query").count() <= 1 {
        return Ok(Invocation::new(jar_engine_command(
            jar, engine, source, options,
        )));
    }

    let scratch = single_query_model(&contents, query)?;
    let command = jar_engine_command(jar, engine, scratch.path(), options);
    Ok(Invocation::new(command).with_scratch(scratch))
}

fn single_query_model(contents: &str, query: &str) -> std::io::Result<NamedTempFile> {
    let mut lines: Vec<&str> = contents
        .split('\n')
        .filter(|line| !line.to_lowercase().contains("query"))
        .collect();
    lines.push(query);

    let mut file = tempfile::Builder::new()
        .prefix("temp_")
        .suffix(".blog")
        .tempfile()?;
    file.write_all(lines.join("\n").as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Fatal check shared by the jar engines: pass-through is single-query only.
pub(crate) fn reject_combined_pass_through(
    name: &str,
    options: &RunOptions,
) -> Result<(), AdapterError> {
    if options.combine_queries && options.has_pass_through() {
        return Err(AdapterError::NotImplemented(format!(
            "Passing arguments through in {name} combined query mode"
        )));
    }
    Ok(())
}

/// GC-FOVE adapter
#[derive(Debug, Clone)]
pub struct GcFoveAdapter {
    jar: PathBuf,
    engine: InferenceEngine,
}

impl GcFoveAdapter {
    /// Adapter for `fove.LiftedVarElim` or `ve.VarElimEngine`.
    pub fn new(jar: impl Into<PathBuf>, engine: InferenceEngine) -> Self {
        Self {
            jar: jar.into(),
            engine,
        }
    }
}

impl EngineAdapter for GcFoveAdapter {
    fn name(&self) -> &str {
        "GCFove"
    }

    fn tag(&self) -> String {
        format!("gcfove_{}", self.engine.short())
    }

    fn extension(&self) -> &str {
        "blog"
    }

    fn executable(&self) -> &Path {
        &self.jar
    }

    fn inference_engine(&self) -> Option<&str> {
        Some(self.engine.as_arg())
    }

    fn record_template(&self, _options: &RunOptions) -> ResultRecord {
        ResultRecord::with_columns(COLUMNS)
    }

    fn query_strings(&self, contents: &str) -> Vec<String> {
        keyword_lines(contents, "query")
    }

    fn supports_combined(&self) -> bool {
        true
    }

    fn validate(&self, options: &RunOptions) -> Result<(), AdapterError> {
        reject_combined_pass_through(self.name(), options)
    }

    fn build_single_command(
        &self,
        query: &str,
        source: &Path,
        options: &RunOptions,
    ) -> Result<Invocation, AdapterError> {
        single_query_invocation(&self.jar, self.engine, query, source, options)
    }

    fn build_combined_command(
        &self,
        _composed: &str,
        source: &Path,
        options: &RunOptions,
    ) -> Result<Invocation, AdapterError> {
        reject_combined_pass_through(self.name(), options)?;
        Ok(Invocation::new(jar_engine_command(
            &self.jar,
            self.engine,
            source,
            options,
        )))
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

        match value_after_tag(stdout, TIME_TAG) {
            Some(time) => {
                record.set("time", time);
            }
            None => warn!("Output from jar execution not in standard format (missing '{TIME_TAG}')."),
        }

        let probabilities = query_probabilities(stdout, None)?;
        match probabilities.as_slice() {
            [only] => {
                record.set("P(query)", only.value.clone());
            }
            other => warn!(
                "Expected exactly 1 probability outside combined query mode, found {}",
                other.len()
            ),
        }
        Ok(record)
    }

    /// One record per query; probabilities by position, times per query or shared.
    fn extract_combined_records(
        &self,
        queries: &[String],
        stdout: &str,
        options: &RunOptions,
    ) -> Result<Vec<ResultRecord>, ExtractionError> {
        let mut times: Vec<FieldValue> = stdout
            .lines()
            .filter_map(|line| line.strip_prefix(TIME_TAG))
            .map(|rest| FieldValue::from(rest.trim()))
            .collect();
        if times.is_empty() {
            warn!("Output from jar execution not in standard format (missing '{TIME_TAG}').");
            times.push(FieldValue::Unset);
        }

        let probabilities = query_probabilities(stdout, None)?;
        Ok(positional_records(
            queries,
            &probabilities,
            |i| {
                let idx = if times.len() > 1 { i } else { 0 };
                times.get(idx).cloned().unwrap_or(FieldValue::Unset)
            },
            || self.record_template(options),
        ))
    }
}

/// Records for `queries` taking the i-th probability for the i-th query.
pub(crate) fn positional_records(
    queries: &[String],
    probabilities: &[QueryProbability],
    time_for: impl Fn(usize) -> FieldValue,
    template: impl Fn() -> ResultRecord,
) -> Vec<ResultRecord> {
    queries
        .iter()
        .enumerate()
        .map(|(i, query)| {
            let mut record = template();
            record.set("query", query.as_str());
            if let Some(p) = probabilities.get(i) {
                record.set("P(query)", p.value.clone());
            }
            record.set("time", time_for(i));
            record
        })
        .collect()
}
