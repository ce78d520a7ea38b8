//! JSON Output

use crate::summary::RunSummary;

/// Generate a prettified JSON summary.
pub fn generate_json_summary(summary: &RunSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::tests::sample;

    #[test]
    fn json_round_trips() {
        let json = generate_json_summary(&sample()).unwrap();
        let back: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());
        assert!(json.contains("\"excluded_prefixes\""));
    }
}
