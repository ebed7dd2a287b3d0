use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// How the user supplies the résumé and job description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMethod {
    File,
    Text,
}

impl InputMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputMethod::File => "file",
            InputMethod::Text => "text",
        }
    }
}

/// A file received from the client. Contents are passed through untouched.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Bytes) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }

    /// Lower-cased extension of the file name, if any.
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
    }
}

/// One submission's worth of input. Either part may be missing until validated.
#[derive(Debug, Clone)]
pub enum AnalysisInput {
    File {
        resume: Option<UploadedFile>,
        job_description: Option<UploadedFile>,
    },
    Text {
        resume: String,
        job_description: String,
    },
}

impl AnalysisInput {
    pub fn method(&self) -> InputMethod {
        match self {
            AnalysisInput::File { .. } => InputMethod::File,
            AnalysisInput::Text { .. } => InputMethod::Text,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillsMatch {
    #[serde(default)]
    pub matched: Vec<String>,
    #[serde(default)]
    pub missing: Vec<String>,
}

/// Raw reply of the scoring service, before any checks.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisReply {
    #[serde(deserialize_with = "whole_number")]
    pub fit_score: i64,
    #[serde(default)]
    pub percentage: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub skills_match: Option<SkillsMatch>,
    #[serde(default)]
    pub improvement_suggestions: Option<Vec<String>>,
    #[serde(default)]
    pub missing_skills: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScore {
    Int(i64),
    Float(f64),
}

/// Accepts `85` and `85.0`; rejects fractional scores.
fn whole_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawScore::deserialize(deserializer)? {
        RawScore::Int(n) => Ok(n),
        RawScore::Float(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i64),
        RawScore::Float(f) => Err(serde::de::Error::custom(format!(
            "fit_score {f} is not a whole number"
        ))),
    }
}

/// A checked analysis. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub fit_score: u8,
    pub percentage: String,
    pub feedback: String,
    pub skills_match: Option<SkillsMatch>,
    pub improvement_suggestions: Option<Vec<String>>,
    pub missing_skills: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedResult {
    #[error("fit score {0} is outside 0-100")]
    ScoreOutOfRange(i64),

    #[error("feedback is missing")]
    MissingFeedback,
}

impl TryFrom<AnalysisReply> for AnalysisResult {
    type Error = MalformedResult;

    fn try_from(reply: AnalysisReply) -> Result<Self, Self::Error> {
        let fit_score = u8::try_from(reply.fit_score)
            .ok()
            .filter(|s| *s <= 100)
            .ok_or(MalformedResult::ScoreOutOfRange(reply.fit_score))?;
        let feedback = reply.feedback.ok_or(MalformedResult::MissingFeedback)?;

        Ok(AnalysisResult {
            fit_score,
            percentage: reply
                .percentage
                .unwrap_or_else(|| format!("{fit_score}%")),
            feedback,
            skills_match: reply.skills_match,
            improvement_suggestions: reply.improvement_suggestions,
            missing_skills: reply.missing_skills,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(fit_score: i64, feedback: Option<&str>) -> AnalysisReply {
        AnalysisReply {
            fit_score,
            percentage: None,
            feedback: feedback.map(str::to_string),
            skills_match: None,
            improvement_suggestions: None,
            missing_skills: None,
        }
    }

    #[test]
    fn test_percentage_defaults_from_score() {
        let result = AnalysisResult::try_from(reply(72, Some("ok"))).unwrap();
        assert_eq!(result.fit_score, 72);
        assert_eq!(result.percentage, "72%");
    }

    #[test]
    fn test_score_above_100_is_malformed() {
        let err = AnalysisResult::try_from(reply(101, Some("ok"))).unwrap_err();
        assert_eq!(err, MalformedResult::ScoreOutOfRange(101));
    }

    #[test]
    fn test_negative_score_is_malformed() {
        let err = AnalysisResult::try_from(reply(-3, Some("ok"))).unwrap_err();
        assert_eq!(err, MalformedResult::ScoreOutOfRange(-3));
    }

    #[test]
    fn test_missing_feedback_is_malformed() {
        let err = AnalysisResult::try_from(reply(50, None)).unwrap_err();
        assert_eq!(err, MalformedResult::MissingFeedback);
    }

    #[test]
    fn test_reply_deserializes_with_optional_fields_absent() {
        let reply: AnalysisReply =
            serde_json::from_str(r#"{"fit_score": 64, "feedback": "Solid."}"#).unwrap();
        assert!(reply.skills_match.is_none());
        assert!(reply.improvement_suggestions.is_none());

        let result = AnalysisResult::try_from(reply).unwrap();
        assert_eq!(result.percentage, "64%");
    }

    #[test]
    fn test_skills_match_tolerates_partial_object() {
        let reply: AnalysisReply = serde_json::from_str(
            r#"{"fit_score": 80, "feedback": "x", "skills_match": {"matched": ["Rust"]}}"#,
        )
        .unwrap();
        let skills = reply.skills_match.unwrap();
        assert_eq!(skills.matched, vec!["Rust".to_string()]);
        assert!(skills.missing.is_empty());
    }

    #[test]
    fn test_extension_is_lowercased() {
        let file = UploadedFile::new("CV.Final.PDF", None, Bytes::from_static(b"%PDF"));
        assert_eq!(file.extension().as_deref(), Some("pdf"));
        let bare = UploadedFile::new("resume", None, Bytes::new());
        assert_eq!(bare.extension(), None);
    }

    #[test]
    fn test_integral_float_score_is_accepted() {
        let reply: AnalysisReply =
            serde_json::from_str(r#"{"fit_score": 85.0, "feedback": "Solid."}"#).unwrap();
        assert_eq!(reply.fit_score, 85);
        assert_eq!(AnalysisResult::try_from(reply).unwrap().percentage, "85%");

        let fractional = serde_json::from_str::<AnalysisReply>(r#"{"fit_score": 85.5, "feedback": "x"}"#);
        assert!(fractional.is_err());
    }
}
