//! Run Planner
//!
//! Builds the execution plan by discovering model files and ordering them.
//!
//! Discovery: every regular, non-hidden file directly inside the directory
//! whose extension matches the adapter's (no recursion).
//!
//! Ordering: natural sort on the file name, so `model_2` runs before
//! `model_10`. Files of one setting share the name part before the first
//! `#` and therefore end up adjacent, smallest first.

use std::cmp::Ordering;
use std::io;
use std::path::{Path, PathBuf};

/// Delimiter separating the setting key from the size / variant suffix
pub const SETTING_DELIMITER: char = '#';

/// One model file of the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// Path as discovered (directory joined with the file name)
    pub path: PathBuf,
    /// File name without directory
    pub file_name: String,
    /// Name up to the first `#`, or the whole name
    pub setting_key: String,
    /// Prefix excluded when this file's setting is given up
    pub exclusion_prefix: String,
}

impl InputFile {
    /// Derive setting key and exclusion prefix from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (setting_key, exclusion_prefix) = match file_name.split_once(SETTING_DELIMITER) {
            Some((key, _)) => (key.to_string(), format!("{key}{SETTING_DELIMITER}")),
            None => (file_name.clone(), file_name.clone()),
        };
        Self {
            path,
            file_name,
            setting_key,
            exclusion_prefix,
        }
    }

    /// Path for logs and the overview.
    pub fn display(&self) -> String {
        self.path.display().to_string()
    }
}

/// Execution plan for one run
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// Directory that was scanned
    pub directory: PathBuf,
    /// Ordered list of files to run
    pub files: Vec<InputFile>,
}

impl ExecutionPlan {
    /// Consecutive files sharing a setting key, in plan order.
    pub fn settings(&self) -> Vec<(&str, Vec<&InputFile>)> {
        let mut groups: Vec<(&str, Vec<&InputFile>)> = Vec::new();
        for file in &self.files {
            match groups.last_mut() {
                Some((key, files)) if *key == file.setting_key => files.push(file),
                _ => groups.push((&file.setting_key, vec![file])),
            }
        }
        groups
    }
}

/// Build execution plan for `directory`
///
/// Collects files with `extension` and returns them in natural order.
pub fn build_plan(directory: &Path, extension: &str) -> io::Result<ExecutionPlan> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') {
            continue;
        }
        let matches = Path::new(name.as_ref())
            .extension()
            .is_some_and(|ext| ext == extension);
        if matches {
            files.push(InputFile::new(directory.join(name.as_ref())));
        }
    }

    files.sort_by(|a, b| {
        natural_cmp(&a.file_name, &b.file_name).then_with(|| a.file_name.cmp(&b.file_name))
    });

    Ok(ExecutionPlan {
        directory: directory.to_path_buf(),
        files,
    })
}

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Text(String),
    Number(&'a str),
}

impl Ord for Chunk<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Chunk::Text(a), Chunk::Text(b)) => a.cmp(b),
            (Chunk::Number(a), Chunk::Number(b)) => {
                // Arbitrary length: compare digit count, then digits
                let a = a.trim_start_matches('0');
                let b = b.trim_start_matches('0');
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Chunk<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn chunks(name: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut digits = None;
    for (i, c) in name.char_indices() {
        let is_digit = c.is_ascii_digit();
        match digits {
            Some(prev) if prev != is_digit => {
                out.push(chunk(&name[start..i], prev));
                start = i;
            }
            _ => {}
        }
        digits = Some(is_digit);
    }
    if let Some(prev) = digits {
        out.push(chunk(&name[start..], prev));
    }
    out
}

fn chunk(part: &str, digits: bool) -> Chunk<'_> {
    if digits {
        Chunk::Number(part)
    } else {
        Chunk::Text(part.to_lowercase())
    }
}

/// Compare names treating digit runs as numbers and text case-insensitively.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    chunks(a).cmp(&chunks(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn names(plan: &ExecutionPlan) -> Vec<&str> {
        plan.files.iter().map(|f| f.file_name.as_str()).collect()
    }

    #[test]
    fn test_natural_order() {
        let mut names = vec!["model_10.mln", "model_2.mln", "Model_1.mln", "model_02b.mln"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(
            names,
            vec!["Model_1.mln", "model_2.mln", "model_02b.mln", "model_10.mln"]
        );
    }

    #[test]
    fn test_large_numbers() {
        assert_eq!(
            natural_cmp("g#100000000000000000000001", "g#99999999999999999999999"),
            Ordering::Greater
        );
        assert_eq!(natural_cmp("a007", "a7"), Ordering::Equal);
    }

    #[test]
    fn test_setting_key() {
        let file = InputFile::new("models/run_cfg_A#3.mln");
        assert_eq!(file.setting_key, "run_cfg_A");
        assert_eq!(file.exclusion_prefix, "run_cfg_A#");

        let file = InputFile::new("models/run_cfg_A.mln");
        assert_eq!(file.setting_key, "run_cfg_A.mln");
        assert_eq!(file.exclusion_prefix, "run_cfg_A.mln");
    }

    #[test]
    fn test_build_plan_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "grid#10.blog",
            "grid#2.blog",
            "chain#1.blog",
            "notes.txt",
            ".hidden.blog",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }
        fs::create_dir(dir.path().join("nested.blog")).unwrap();

        let plan = build_plan(dir.path(), "blog").unwrap();
        assert_eq!(names(&plan), vec!["chain#1.blog", "grid#2.blog", "grid#10.blog"]);

        let settings = plan.settings();
        assert_eq!(settings.len(), 2);
        assert_eq!(settings[1].0, "grid");
        assert_eq!(settings[1].1.len(), 2);
    }

    #[test]
    fn test_missing_directory() {
        assert!(build_plan(Path::new("/definitely/not/here"), "mln").is_err());
    }
}
