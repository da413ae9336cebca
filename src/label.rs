use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of semantic categories a message can be assigned.
///
/// Pattern files and model artifacts refer to labels by their snake_case
/// string form (`job_application`, `head_hunter`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    JobApplication,
    Rejection,
    InterviewInvite,
    Prescreen,
    Offer,
    HeadHunter,
    Referral,
    Ghosted,
    Noise,
    Response,
    Blank,
    Other,
    Unknown,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::JobApplication => "job_application",
            Label::Rejection => "rejection",
            Label::InterviewInvite => "interview_invite",
            Label::Prescreen => "prescreen",
            Label::Offer => "offer",
            Label::HeadHunter => "head_hunter",
            Label::Referral => "referral",
            Label::Ghosted => "ghosted",
            Label::Noise => "noise",
            Label::Response => "response",
            Label::Blank => "blank",
            Label::Other => "other",
            Label::Unknown => "unknown",
        }
    }

    /// Parse the snake_case string form. Unrecognized strings map to
    /// `Unknown` so a model artifact with an unexpected class list can
    /// never poison the pipeline.
    pub fn parse(s: &str) -> Label {
        match s.trim().to_lowercase().as_str() {
            "job_application" => Label::JobApplication,
            "rejection" => Label::Rejection,
            "interview_invite" => Label::InterviewInvite,
            "prescreen" => Label::Prescreen,
            "offer" => Label::Offer,
            "head_hunter" => Label::HeadHunter,
            "referral" => Label::Referral,
            "ghosted" => Label::Ghosted,
            "noise" => Label::Noise,
            "response" => Label::Response,
            "blank" => Label::Blank,
            "other" => Label::Other,
            _ => Label::Unknown,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for label in [
            Label::JobApplication,
            Label::Rejection,
            Label::InterviewInvite,
            Label::Prescreen,
            Label::Offer,
            Label::HeadHunter,
            Label::Referral,
            Label::Ghosted,
            Label::Noise,
            Label::Response,
            Label::Blank,
            Label::Other,
        ] {
            assert_eq!(Label::parse(label.as_str()), label);
        }
    }

    #[test]
    fn test_parse_unrecognized_maps_to_unknown() {
        assert_eq!(Label::parse("spam"), Label::Unknown);
        assert_eq!(Label::parse(""), Label::Unknown);
        assert_eq!(Label::parse("HEAD_HUNTER"), Label::HeadHunter);
    }
}
