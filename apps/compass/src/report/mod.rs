//! Report — presentation data for a succeeded analysis.
//!
//! Everything here is derived from an `AnalysisResult` on demand. Nothing is
//! cached; a report is rebuilt each time a session view is rendered.

pub mod tier;

use serde::Serialize;

use crate::insights::{extract_insights, Insight};
use crate::models::analysis::{AnalysisResult, SkillsMatch};
use tier::ScoreTier;

/// A fixed call-to-action card shown under every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextStep {
    pub title: &'static str,
    pub detail: &'static str,
}

pub const NEXT_STEPS: [NextStep; 3] = [
    NextStep {
        title: "Update Resume",
        detail: "Highlight the matched skills and address missing ones",
    },
    NextStep {
        title: "Skill Development",
        detail: "Focus on learning the missing technical skills",
    },
    NextStep {
        title: "Apply Strategically",
        detail: "Tailor your application to emphasize strengths",
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub fit_score: u8,
    pub percentage: String,
    pub tier: ScoreTier,
    pub insights: Vec<Insight>,
    pub feedback: String,
    pub skills_match: Option<SkillsMatch>,
    pub improvement_suggestions: Option<Vec<String>>,
    pub missing_skills: Option<Vec<String>>,
    pub next_steps: Vec<NextStep>,
}

pub fn build_report(result: &AnalysisResult) -> AnalysisReport {
    AnalysisReport {
        fit_score: result.fit_score,
        percentage: result.percentage.clone(),
        tier: tier::resolve(i64::from(result.fit_score)),
        insights: extract_insights(Some(&result.feedback), result.fit_score),
        feedback: result.feedback.clone(),
        skills_match: result.skills_match.clone(),
        // empty lists render the same as absent ones
        improvement_suggestions: result
            .improvement_suggestions
            .clone()
            .filter(|s| !s.is_empty()),
        missing_skills: result.missing_skills.clone().filter(|s| !s.is_empty()),
        next_steps: NEXT_STEPS.to_vec(),
    }
}
