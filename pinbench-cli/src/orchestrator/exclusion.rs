//! Adaptive Exclusion
//!
//! Files of one setting are ordered smallest first. Once two consecutive
//! files of a setting fail, every later file with the same prefix is skipped.

use crate::planner::InputFile;
use pinbench_core::QueryOutcome;
use serde::Serialize;

/// Consecutive failing files that trigger an exclusion
pub const FAILURE_THRESHOLD: u32 = 2;

/// Per-file outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounters {
    /// Successful queries (or combined runs)
    pub success: usize,
    /// Failed queries of any non-timeout kind
    pub errors: usize,
    /// Timed-out queries
    pub timeouts: usize,
}

impl StatusCounters {
    /// Count one outcome.
    pub fn record(&mut self, outcome: &QueryOutcome) {
        match outcome {
            QueryOutcome::Success(_) => self.success += 1,
            QueryOutcome::Timeout => self.timeouts += 1,
            QueryOutcome::ExecutionError { .. }
            | QueryOutcome::ExtractionError { .. }
            | QueryOutcome::ValidationError { .. } => self.errors += 1,
        }
    }

    /// Timeouts plus errors.
    pub fn failures(&self) -> usize {
        self.timeouts + self.errors
    }

    /// A file fails when its successes do not exceed its failures.
    pub fn is_failed_file(&self) -> bool {
        self.success <= self.failures()
    }

    /// Add `other` into `self`.
    pub fn accumulate(&mut self, other: &StatusCounters) {
        self.success += other.success;
        self.errors += other.errors;
        self.timeouts += other.timeouts;
    }
}

/// Prefixes of files that are no longer executed
///
/// Only grows during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    prefixes: Vec<String>,
}

impl ExclusionSet {
    /// Add `prefix`; returns false if it was already present.
    pub fn insert(&mut self, prefix: impl Into<String>) -> bool {
        let prefix = prefix.into();
        if self.prefixes.contains(&prefix) {
            return false;
        }
        self.prefixes.push(prefix);
        true
    }

    /// True when `file_name` starts with any excluded prefix.
    pub fn matches(&self, file_name: &str) -> bool {
        self.prefixes.iter().any(|prefix| file_name.starts_with(prefix))
    }

    /// Excluded prefixes in insertion order.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}

/// Tracks consecutive failing files of the current setting
#[derive(Debug, Clone, Default)]
pub struct FailureTracker {
    setting: Option<String>,
    consecutive: u32,
}

impl FailureTracker {
    /// Note the setting of the next file; a new setting resets the count.
    pub fn enter(&mut self, file: &InputFile) {
        if self.setting.as_deref() != Some(file.setting_key.as_str()) {
            self.setting = Some(file.setting_key.clone());
            self.consecutive = 0;
        }
    }

    /// Consecutive failing files seen for the current setting.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive
    }

    /// Account for a finished file.
    ///
    /// Returns the prefix to exclude once the threshold is reached and
    /// skipping is enabled; the count starts over afterwards.
    pub fn finish(
        &mut self,
        file: &InputFile,
        counters: &StatusCounters,
        timeout_skip: bool,
    ) -> Option<String> {
        if !counters.is_failed_file() {
            self.consecutive = 0;
            return None;
        }
        self.consecutive += 1;
        if !timeout_skip || self.consecutive < FAILURE_THRESHOLD {
            return None;
        }
        self.consecutive = 0;
        Some(file.exclusion_prefix.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(success: usize, errors: usize, timeouts: usize) -> StatusCounters {
        StatusCounters {
            success,
            errors,
            timeouts,
        }
    }

    #[test]
    fn test_counts_outcomes() {
        let mut c = StatusCounters::default();
        c.record(&QueryOutcome::Success(Vec::new()));
        c.record(&QueryOutcome::Timeout);
        c.record(&QueryOutcome::ExtractionError {
            message: String::new(),
        });
        assert_eq!(c, counters(1, 1, 1));
        assert!(c.is_failed_file());
        assert!(counters(1, 1, 0).is_failed_file());
        assert!(!counters(2, 1, 0).is_failed_file());
    }

    #[test]
    fn test_two_failures_exclude_setting() {
        let mut tracker = FailureTracker::default();
        let first = InputFile::new("m/grid#1.mln");
        let second = InputFile::new("m/grid#2.mln");

        tracker.enter(&first);
        assert_eq!(tracker.finish(&first, &counters(0, 0, 1), true), None);
        tracker.enter(&second);
        assert_eq!(
            tracker.finish(&second, &counters(0, 1, 0), true),
            Some("grid#".to_string())
        );
        assert_eq!(tracker.consecutive_failures(), 0);
    }

    #[test]
    fn test_success_resets() {
        let mut tracker = FailureTracker::default();
        let files: Vec<_> = (1..=3)
            .map(|i| InputFile::new(format!("m/grid#{i}.mln")))
            .collect();

        tracker.enter(&files[0]);
        tracker.finish(&files[0], &counters(0, 0, 1), true);
        tracker.enter(&files[1]);
        assert_eq!(tracker.finish(&files[1], &counters(1, 0, 0), true), None);
        assert_eq!(tracker.consecutive_failures(), 0);
        tracker.enter(&files[2]);
        assert_eq!(tracker.finish(&files[2], &counters(0, 0, 1), true), None);
    }

    #[test]
    fn test_new_setting_resets() {
        let mut tracker = FailureTracker::default();
        let a = InputFile::new("m/a#1.mln");
        let b = InputFile::new("m/b#1.mln");

        tracker.enter(&a);
        tracker.finish(&a, &counters(0, 1, 0), true);
        tracker.enter(&b);
        assert_eq!(tracker.consecutive_failures(), 0);
        assert_eq!(tracker.finish(&b, &counters(0, 1, 0), true), None);
    }

    #[test]
    fn test_skip_disabled() {
        let mut tracker = FailureTracker::default();
        let a = InputFile::new("m/a#1.mln");
        let b = InputFile::new("m/a#2.mln");
        tracker.enter(&a);
        tracker.finish(&a, &counters(0, 1, 0), false);
        tracker.enter(&b);
        assert_eq!(tracker.finish(&b, &counters(0, 1, 0), false), None);
        assert_eq!(tracker.consecutive_failures(), 2);
    }

    #[test]
    fn test_exclusion_set_prefix_match() {
        let mut set = ExclusionSet::default();
        assert!(set.insert("grid#"));
        assert!(!set.insert("grid#"));
        assert!(set.matches("grid#10.mln"));
        assert!(!set.matches("gridlock#1.mln"));
        assert_eq!(set.prefixes(), ["grid#".to_string()]);
    }
}
