//! Lifted junction tree (`fojt.jar`) and its variable elimination engines.

use crate::InferenceEngine;
use crate::gcfove::{jar_engine_command, reject_combined_pass_through, single_query_invocation};
use crate::text::{QUERY_RESULTS_MARKER, first_integer, keyword_lines, query_probabilities};
use pinbench_core::{
    AdapterError, EngineAdapter, ExtractionError, FieldValue, Invocation, ResultRecord,
    RunOptions,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default jar name, looked up in the working directory
pub const JT_JAR: &str = "fojt.jar";

const COLUMNS: [&str; 16] = [
    "filename", "query", "P(query)", "|gr|", "|G|", "|E|", "|Q|", "width", "size", "mem",
    "VE_ops", "t_0", "t_1", "t_2", "t_queries", "time",
];

/// Columns the variable elimination engines never report
const JT_ONLY_COLUMNS: [&str; 5] = ["size", "width", "t_0", "t_1", "t_2"];

const INFO_MARKER: &str = "engine\t";
const TIMES_MARKER: &str = "Split times\n";
const IGNORED_INFO_KEYS: [&str; 2] = ["engine", "name"];

/// Which algorithm family produced the timings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BaseEngine {
    JunctionTree,
    VariableElimination,
}

/// JT adapter
#[derive(Debug, Clone)]
pub struct JtAdapter {
    jar: PathBuf,
    engine: InferenceEngine,
}

impl JtAdapter {
    /// Adapter for `fojt.LiftedJTEngine`, `jt.JTEngine`, `fove.LiftedVarElim` or `ve.VarElimEngine`.
    pub fn new(jar: impl Into<PathBuf>, engine: InferenceEngine) -> Self {
        Self {
            jar: jar.into(),
            engine,
        }
    }

    fn base(&self) -> BaseEngine {
        match self.engine {
            InferenceEngine::LiftedJt | InferenceEngine::Jt => BaseEngine::JunctionTree,
            _ => BaseEngine::VariableElimination,
        }
    }

    fn fill_info(record: &mut ResultRecord, info: &str) {
        for line in info.split('\n').filter(|line| !line.is_empty()) {
            let Some((key, rest)) = line.split_once('\t') else {
                continue;
            };
            if IGNORED_INFO_KEYS.contains(&key) {
                continue;
            }
            let value = rest.split('\t').next().unwrap_or(rest);
            record.set(key, value);
        }
    }
}

/// Output split into its probability, info and timing sections.
struct Sections<'a> {
    probabilities: &'a str,
    info: &'a str,
    times: &'a str,
}

fn split_sections(output: &str) -> Result<Sections<'_>, ExtractionError> {
    let find = |marker: &str| {
        output
            .find(marker)
            .ok_or_else(|| ExtractionError::MissingMarker(marker.trim_end().to_string()))
    };
    let prob_start = find(QUERY_RESULTS_MARKER)?;
    let info_start = find(INFO_MARKER)?;
    let times_start = find(TIMES_MARKER)?;
    if !(prob_start <= info_start && info_start <= times_start) {
        return Err(ExtractionError::Malformed(
            "result, info and timing sections out of order".to_string(),
        ));
    }
    Ok(Sections {
        probabilities: &output[prob_start..info_start],
        info: &output[info_start..times_start],
        times: &output[times_start + TIMES_MARKER.len()..],
    })
}

/// `key\t... value` lines of the timing section, in order.
///
/// Lines with two tabs carry the unit-converted value in the third column.
/// Timings and memory keep only their leading integer.
fn parse_times(times: &str) -> Vec<(String, FieldValue)> {
    let mut entries = Vec::new();
    for line in times.split('\n').filter(|line| !line.is_empty()) {
        let value_index = if line.matches('\t').count() == 1 { 1 } else { 2 };
        let columns: Vec<&str> = line.trim().split('\t').collect();
        let Some(raw) = columns.get(value_index) else {
            continue;
        };
        let key = columns[0].replace(' ', "_");

        let value = if key.starts_with("t_") || key == "mem" {
            match first_integer(raw) {
                Some(v) => FieldValue::Int(v),
                None => continue,
            }
        } else {
            FieldValue::from(*raw)
        };
        entries.push((key, value));
    }
    entries
}

/// Numeric suffix of a `t_N` key.
fn time_index(key: &str) -> Option<u32> {
    key.strip_prefix("t_").and_then(|n| n.parse().ok())
}

impl EngineAdapter for JtAdapter {
    fn name(&self) -> &str {
        "JT"
    }

    fn tag(&self) -> String {
        format!("JT_{}", self.engine.short())
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
        let mut record = ResultRecord::with_columns(COLUMNS)
            .preset("VE_ops", "")
            .preset("t_queries", "");
        if self.base() == BaseEngine::VariableElimination {
            for column in JT_ONLY_COLUMNS {
                record.set(column, FieldValue::NotApplicable);
            }
        }
        record
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

    fn detect_error(&self, stdout: &str, stderr: &str) -> bool {
        !stderr.is_empty() || stdout.contains("mem error")
    }

    fn error_message(&self, stdout: &str, stderr: &str) -> String {
        format!(" > std_out:\n{stdout}\n\n > std_err:\n{stderr}")
    }

    fn extract_record(
        &self,
        stdout: &str,
        options: &RunOptions,
    ) -> Result<ResultRecord, ExtractionError> {
        let mut record = self.record_template(options);
        let sections = split_sections(stdout)?;

        let probabilities = query_probabilities(sections.probabilities, None)?;
        match probabilities.as_slice() {
            [only] => {
                record.set("P(query)", only.value.clone());
            }
            other => warn!(
                "Expected exactly 1 probability outside combined query mode for JT, found {}",
                other.len()
            ),
        }

        Self::fill_info(&mut record, sections.info);

        let mut query_times = Vec::new();
        for (key, value) in parse_times(sections.times) {
            match time_index(&key) {
                _ if key == "t_total" => {
                    record.set("time", value);
                }
                Some(n) if n >= 3 => query_times.push(value.to_string()),
                _ => {
                    record.set(&key, value);
                }
            }
        }

        match self.base() {
            BaseEngine::VariableElimination => {
                record.set("t_queries", format!("[{}]", query_times.join(", ")));
            }
            BaseEngine::JunctionTree => {
                let t_0 = record.get("t_0").cloned().unwrap_or(FieldValue::Unset);
                record.set("t_queries", t_0);
                record.set("t_0", FieldValue::NotApplicable);
            }
        }
        Ok(record)
    }

    /// One record per query. Probabilities and per-query times are positional:
    /// `t_{i+2}` for junction tree engines, `t_i` for variable elimination.
    fn extract_combined_records(
        &self,
        queries: &[String],
        stdout: &str,
        options: &RunOptions,
    ) -> Result<Vec<ResultRecord>, ExtractionError> {
        let sections = split_sections(stdout)?;
        let probabilities = query_probabilities(sections.probabilities, None)?;

        let mut times: HashMap<String, FieldValue> =
            parse_times(sections.times).into_iter().collect();
        if let Some(total) = times.get("t_total").cloned() {
            times.insert("time".to_string(), total);
        }

        let (copied, offset): (&[&str], usize) = match self.base() {
            BaseEngine::JunctionTree => (&["time", "t_0", "t_1", "t_2", "VE_ops", "mem"], 2),
            BaseEngine::VariableElimination => (&["time", "VE_ops", "mem"], 0),
        };

        Ok(queries
            .iter()
            .enumerate()
            .map(|(i, query)| {
                let mut record = self.record_template(options);
                Self::fill_info(&mut record, sections.info);
                record.set("query", query.as_str());
                if let Some(p) = probabilities.get(i) {
                    record.set("P(query)", p.value.clone());
                }
                for key in copied {
                    if let Some(value) = times.get(*key) {
                        record.set(key, value.clone());
                    }
                }
                if let Some(t) = times.get(&format!("t_{}", i + offset)) {
                    record.set("t_queries", t.clone());
                }
                record
            })
            .collect())
    }
}
