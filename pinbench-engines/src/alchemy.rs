//! Alchemy lifted inference (`Alchemy_liftedinfer`, Linux only).

use crate::InferenceEngine;
use crate::text::{bracket_pair, mln_queries};
use pinbench_core::{
    AdapterError, EngineAdapter, EngineCommand, ExtractionError, FieldValue, Invocation,
    ResultRecord, RunOptions, sibling_with_extension,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default executable, looked up in the working directory
pub const ALCHEMY_EXECUTABLE: &str = "./Alchemy_liftedinfer";

/// Side files the engine leaves in its working directory
pub const DUMP_FILES: [&str; 3] = ["mlndump.dat", "result.dat", "symbolsdump.dat"];

const COLUMNS: [&str; 7] = [
    "filename",
    "query",
    "Z",
    "probs",
    "maxSteps",
    "total time",
    "millisecs",
];

const EXACT_Z: &str = "Exact Z =";
const SAMPLED_Z: &str = "Z-curr =";
const SAMPLED_Z_PREFIX: &str = "Z-curr =  (Actual)";
const LBG_SAMPLING: &str = "LBG Sampling Process";
const LBG_EXIT: &str = "Sampling Process exiting";

/// Alchemy adapter
#[derive(Debug, Clone)]
pub struct AlchemyAdapter {
    executable: PathBuf,
    engine: InferenceEngine,
    work_dir: PathBuf,
}

impl AlchemyAdapter {
    /// Adapter for `engine` (one of `ptpe`, `lis`, `lvg`).
    pub fn new(executable: impl Into<PathBuf>, engine: InferenceEngine) -> Self {
        Self {
            executable: executable.into(),
            engine,
            work_dir: PathBuf::from("."),
        }
    }

    /// Directory where the engine writes `result.dat` and its dumps.
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    fn command(&self, query: &str, source: &Path, options: &RunOptions) -> EngineCommand {
        let mut cmd = EngineCommand::new(
            self.executable.display().to_string(),
            [
                format!("-{}", self.engine.as_arg()),
                "true".to_string(),
                "-q".to_string(),
                query.to_string(),
                "-i".to_string(),
                source.display().to_string(),
            ],
        );

        let evidence = sibling_with_extension(source, "db");
        if evidence.exists() {
            info!(
                "    Including evidence file '{}' for model file '{}' in query",
                evidence.display(),
                source.display()
            );
            cmd.insert_at(1, ["-e".to_string(), evidence.display().to_string()]);
        }
        if let Some(steps) = options.max_sample_steps {
            cmd.insert_at(1, ["-maxSteps".to_string(), steps.to_string()]);
        }
        cmd.insert_pass_through(1, &options.pass_through_args);
        cmd
    }

    /// Marginals written by the engine, as `{Q(A):0.1;Q(B):0.2}`.
    fn read_probabilities(&self) -> Option<String> {
        let path = self.work_dir.join("result.dat");
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let entries: Vec<String> = contents
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(|line| line.replace(' ', ":"))
                    .collect();
                Some(format!("{{{}}}", entries.join(";")))
            }
            Err(e) => {
                warn!("Could not read {}: {e}", path.display());
                None
            }
        }
    }
}

impl EngineAdapter for AlchemyAdapter {
    fn name(&self) -> &str {
        "Alchemy"
    }

    fn tag(&self) -> String {
        "alchemy".to_string()
    }

    fn extension(&self) -> &str {
        "mln"
    }

    fn executable(&self) -> &Path {
        &self.executable
    }

    fn inference_engine(&self) -> Option<&str> {
        Some(self.engine.as_arg())
    }

    fn record_template(&self, options: &RunOptions) -> ResultRecord {
        let max_steps = match options.max_sample_steps {
            Some(steps) => FieldValue::Int(steps as i64),
            None => FieldValue::Text(String::new()),
        };
        ResultRecord::with_columns(COLUMNS).preset("maxSteps", max_steps)
    }

    fn query_strings(&self, contents: &str) -> Vec<String> {
        mln_queries(contents)
    }

    fn supports_combined(&self) -> bool {
        true
    }

    fn validate(&self, _options: &RunOptions) -> Result<(), AdapterError> {
        if cfg!(target_os = "linux") {
            Ok(())
        } else {
            Err(AdapterError::UnsupportedPlatform {
                engine: "Alchemy".to_string(),
                required: "Linux".to_string(),
                actual: std::env::consts::OS.to_string(),
            })
        }
    }

    fn build_single_command(
        &self,
        query: &str,
        source: &Path,
        options: &RunOptions,
    ) -> Result<Invocation, AdapterError> {
        Ok(Invocation::new(self.command(query, source, options)))
    }

    fn build_combined_command(
        &self,
        composed: &str,
        source: &Path,
        options: &RunOptions,
    ) -> Result<Invocation, AdapterError> {
        Ok(Invocation::new(self.command(composed, source, options)))
    }

    fn detect_error(&self, stdout: &str, stderr: &str) -> bool {
        stdout.contains("error") || stderr.contains("failed")
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

        // Exact counting, then importance sampling, then lifted blocked Gibbs
        let tail = if let Some(start) = stdout.find(EXACT_Z) {
            let tail = &stdout[start..];
            let mut lines = tail.split('\n');
            if let Some(z) = lines
                .by_ref()
                .position(|line| line.starts_with(EXACT_Z))
                .and_then(|_| lines.next())
            {
                record.set("Z", z.trim());
            }
            tail
        } else if let Some(start) = stdout.rfind(SAMPLED_Z) {
            let tail = &stdout[start..];
            if let Some(line) = tail.split('\n').find(|line| line.starts_with(SAMPLED_Z)) {
                record.set("Z", line.replace(SAMPLED_Z_PREFIX, "").trim());
            }
            tail
        } else if stdout.contains(LBG_SAMPLING) {
            record.set("Z", FieldValue::NotApplicable);
            stdout.rfind(LBG_EXIT).map_or(stdout, |start| &stdout[start..])
        } else {
            warn!("'{EXACT_Z}' or '{SAMPLED_Z}' not found in return string. Skipping information extraction.");
            return Err(ExtractionError::MissingMarker(EXACT_Z.to_string()));
        };

        for (key, value) in tail.split('\n').filter_map(bracket_pair) {
            record.set(key, value);
        }

        if let Some(probs) = self.read_probabilities() {
            record.set("probs", probs);
        }
        Ok(record)
    }

    fn cleanup(&self) -> std::io::Result<()> {
        for name in DUMP_FILES {
            let path = self.work_dir.join(name);
            if path.exists() {
                debug!("removing {}", path.display());
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXACT_OUTPUT: &str = "done writing dump files (mlndump.dat,symbolsdump.dat)\n\
        Exact Z = Starting Exact Lifted Model Counting\n\
        (Actual) 2.08035e+15\n\
        [total time] : {0.06 secs}\n\
        [millisecs] : {73}\n";

    const LIS_OUTPUT: &str = "iteration 975\n\
        Z-curr =  (Actual) 9.59097e+10\n\
        cumulative-Z =  (Actual) 1.31424e+14\n\
        iteration 1000\n\
        Z-curr =  (Actual) 9.61234e+10\n\
        cumulative-Z =  (Actual) 1.34819e+14>\n\
        [total time] : {0.44 secs}\n\
        [millisecs] : {455}\n";

    const LVG_OUTPUT: &str = "LBG Sampling Process::Sampling from cluster level 0,iter=975\n\
        LBG Sampling Process::Sampling from cluster level 0,iter=1000\n\
        Sampling Process exiting\n\
        [total time] : {0.84 secs}\n\
        [millisecs] : {866}\n";

    fn adapter(dir: &Path) -> AlchemyAdapter {
        AlchemyAdapter::new(ALCHEMY_EXECUTABLE, InferenceEngine::Ptpe).with_work_dir(dir)
    }

    fn write_result(dir: &Path) {
        fs::write(dir.join("result.dat"), "Smokes(A) 0.25\n\nCancer(B) 0.5\n").unwrap();
    }

    #[test]
    fn exact_z_comes_from_next_line() {
        let dir = tempfile::tempdir().unwrap();
        write_result(dir.path());
        let record = adapter(dir.path())
            .extract_record(EXACT_OUTPUT, &RunOptions::default())
            .unwrap();
        assert_eq!(record.get("Z"), Some(&FieldValue::from("(Actual) 2.08035e+15")));
        assert_eq!(record.get("total time"), Some(&FieldValue::from("0.06 secs")));
        assert_eq!(record.get("millisecs"), Some(&FieldValue::from("73")));
        assert_eq!(
            record.get("probs"),
            Some(&FieldValue::from("{Smokes(A):0.25;Cancer(B):0.5}"))
        );
        assert_eq!(record.get("maxSteps"), Some(&FieldValue::from("")));
    }

    #[test]
    fn sampled_z_uses_last_iteration() {
        let dir = tempfile::tempdir().unwrap();
        write_result(dir.path());
        let options = RunOptions {
            max_sample_steps: Some(1000),
            ..RunOptions::default()
        };
        let record = adapter(dir.path()).extract_record(LIS_OUTPUT, &options).unwrap();
        assert_eq!(record.get("Z"), Some(&FieldValue::from("9.61234e+10")));
        assert_eq!(record.get("maxSteps"), Some(&FieldValue::Int(1000)));
        assert_eq!(record.get("millisecs"), Some(&FieldValue::from("455")));
    }

    #[test]
    fn lbg_sampling_has_no_z() {
        let dir = tempfile::tempdir().unwrap();
        write_result(dir.path());
        let mut record = adapter(dir.path())
            .extract_record(LVG_OUTPUT, &RunOptions::default())
            .unwrap();
        record.set("filename", "a.mln");
        record.set("query", "Smokes(A)");
        assert_eq!(record.get("Z"), Some(&FieldValue::NotApplicable));
        assert!(record.is_valid());
    }

    #[test]
    fn missing_result_file_leaves_probs_unset() {
        let dir = tempfile::tempdir().unwrap();
        let record = adapter(dir.path())
            .extract_record(EXACT_OUTPUT, &RunOptions::default())
            .unwrap();
        assert_eq!(record.missing_fields(), vec!["probs"]);
    }

    #[test]
    fn command_includes_evidence_and_steps() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("smokers#2.mln");
        fs::write(&model, "").unwrap();
        fs::write(dir.path().join("smokers#2.db"), "").unwrap();

        let options = RunOptions {
            max_sample_steps: Some(50),
            pass_through_args: "'-seed 1'".into(),
            ..RunOptions::default()
        };
        let inv = AlchemyAdapter::new(ALCHEMY_EXECUTABLE, InferenceEngine::Lis)
            .build_single_command("Smokes(A)", &model, &options)
            .unwrap();
        let evidence = dir.path().join("smokers#2.db").display().to_string();
        let model = model.display().to_string();
        assert_eq!(
            inv.command.argv(),
            vec![
                ALCHEMY_EXECUTABLE,
                "-seed",
                "1",
                "-maxSteps",
                "50",
                "-e",
                evidence.as_str(),
                "-lis",
                "true",
                "-q",
                "Smokes(A)",
                "-i",
                model.as_str(),
            ]
        );
    }

    #[test]
    fn error_detection_checks_both_streams() {
        let a = AlchemyAdapter::new(ALCHEMY_EXECUTABLE, InferenceEngine::Ptpe);
        assert!(a.detect_error("parse error in line 3", ""));
        assert!(a.detect_error("", "loading failed"));
        assert!(!a.detect_error("fine", "warning"));
    }

    #[test]
    fn cleanup_removes_dump_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in DUMP_FILES {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        adapter(dir.path()).cleanup().unwrap();
        assert!(DUMP_FILES.iter().all(|n| !dir.path().join(n).exists()));
    }
}
