//! Score tiers — label, advice and severity for a fit score.
//!
//! Label tiers and advice brackets use independent cutoffs.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreTier {
    pub label: &'static str,
    pub advice: &'static str,
    pub severity: Severity,
}

/// Resolves the tier for `score`, clamping it into 0..=100 first.
pub fn resolve(score: i64) -> ScoreTier {
    let score = score.clamp(0, 100);
    let (label, severity) = label_for(score);
    ScoreTier {
        label,
        advice: advice_for(score),
        severity,
    }
}

fn label_for(score: i64) -> (&'static str, Severity) {
    match score {
        90.. => ("Excellent Match!", Severity::Success),
        80..=89 => ("Great Match!", Severity::Success),
        70..=79 => ("Good Match!", Severity::Success),
        60..=69 => ("Fair Match", Severity::Warning),
        50..=59 => ("Moderate Match", Severity::Warning),
        _ => ("Needs Improvement", Severity::Info),
    }
}

fn advice_for(score: i64) -> &'static str {
    match score {
        80.. => "strong candidate, apply confidently",
        60..=79 => "meets most requirements, highlight strengths",
        40..=59 => "has potential, close missing-skill gaps",
        _ => "significant skill gaps, develop key missing skills first",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_cutoffs() {
        assert_eq!(resolve(100).label, "Excellent Match!");
        assert_eq!(resolve(90).label, "Excellent Match!");
        assert_eq!(resolve(89).label, "Great Match!");
        assert_eq!(resolve(80).label, "Great Match!");
        assert_eq!(resolve(79).label, "Good Match!");
        assert_eq!(resolve(70).label, "Good Match!");
        assert_eq!(resolve(69).label, "Fair Match");
        assert_eq!(resolve(60).label, "Fair Match");
        assert_eq!(resolve(59).label, "Moderate Match");
        assert_eq!(resolve(50).label, "Moderate Match");
        assert_eq!(resolve(49).label, "Needs Improvement");
        assert_eq!(resolve(0).label, "Needs Improvement");
    }

    #[test]
    fn test_advice_cutoffs_are_independent_of_labels() {
        // 50-59 is "Moderate Match" but shares advice with 40-49
        assert_eq!(resolve(55).advice, resolve(40).advice);
        assert_ne!(resolve(55).label, resolve(40).label);
        assert_eq!(resolve(39).advice, "significant skill gaps, develop key missing skills first");
        assert_eq!(resolve(40).advice, "has potential, close missing-skill gaps");
    }

    #[test]
    fn test_boundary_79_to_80() {
        let below = resolve(79);
        assert_eq!(below.label, "Good Match!");
        assert_eq!(below.advice, "meets most requirements, highlight strengths");

        let at = resolve(80);
        assert_eq!(at.label, "Great Match!");
        assert_eq!(at.advice, "strong candidate, apply confidently");
    }

    #[test]
    fn test_advice_constant_within_bracket() {
        for score in 60..80 {
            assert_eq!(resolve(score).advice, resolve(60).advice, "score {score}");
        }
    }

    #[test]
    fn test_severity_by_tier() {
        assert_eq!(resolve(70).severity, Severity::Success);
        assert_eq!(resolve(65).severity, Severity::Warning);
        assert_eq!(resolve(50).severity, Severity::Warning);
        assert_eq!(resolve(49).severity, Severity::Info);
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        assert_eq!(resolve(250), resolve(100));
        assert_eq!(resolve(-12), resolve(0));
    }
}
