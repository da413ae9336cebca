use lazy_static::lazy_static;
use regex::RegexSet;

use crate::headers::HeaderHints;
use crate::label::Label;
use crate::patterns::CompiledPatterns;

/// A definitive rule-sweep hit: the label and the pattern that fired.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub label: Label,
    pub pattern: String,
}

impl RuleMatch {
    fn new(label: Label, pattern: &str) -> Self {
        RuleMatch {
            label,
            pattern: pattern.to_string(),
        }
    }
}

// Fixed phrase tables for the early stages. These encode ordering
// guarantees (prescreen must beat generic scheduling, assessment
// completions must not read as interview traffic) and are deliberately
// not part of the reloadable pattern file.
lazy_static! {
    static ref ASSESSMENT_DONE: RegexSet = RegexSet::new([
        r"(?i)thank you for completing (?:the|your) assessment",
        r"(?i)you(?:'ve| have) completed (?:the|your) assessment",
        r"(?i)assessment (?:complete|completed|submitted|received)",
    ])
    .unwrap();
    static ref INCOMPLETE_APPLICATION: RegexSet = RegexSet::new([
        r"(?i)(?:finish|complete) your application",
        r"(?i)your application is (?:incomplete|waiting|almost done)",
        r"(?i)you(?:'re| are) almost (?:there|done)",
        r"(?i)don'?t forget to (?:finish|submit)",
    ])
    .unwrap();
    static ref PRESCREEN: RegexSet = RegexSet::new([
        r"(?i)phone[ -]screen",
        r"(?i)pre-?screen",
        r"(?i)screening call",
        r"(?i)introductory call with (?:a |our )?recruiter",
    ])
    .unwrap();
    static ref SCHEDULING: RegexSet = RegexSet::new([
        r"(?i)schedul(?:e|ing)",
        r"(?i)your availability",
        r"(?i)book a time",
        r"(?i)pick a time",
        r"(?i)calendar invite",
        r"(?i)find a time",
    ])
    .unwrap();
    static ref REJECTION_PHRASES: RegexSet = RegexSet::new([
        r"(?i)we regret to inform",
        r"(?i)(?:decided|chosen) (?:not to|to not) move forward",
        r"(?i)(?:will not|won'?t) be (?:moving|proceeding) forward",
        r"(?i)(?:move|moving) forward with other candidates",
        r"(?i)unable to offer you (?:a|the) position",
    ])
    .unwrap();
    static ref REFERRAL_PHRASES: RegexSet = RegexSet::new([
        r"(?i)employee referral",
        r"(?i)referred you (?:for|to)",
        r"(?i)has referred you",
    ])
    .unwrap();
    static ref APPLICATION_CONFIRMATION: RegexSet = RegexSet::new([
        r"(?i)we(?:'ve| have)? received your application",
        r"(?i)thank you for applying",
        r"(?i)application has been (?:received|submitted)",
        r"(?i)successfully (?:submitted|applied)",
    ])
    .unwrap();
    static ref NETWORKING_INTRO: RegexSet = RegexSet::new([
        r"(?i)(?:would |'d )?(?:like|love) to introduce",
        r"(?i)introducing you",
        r"(?i)wanted to connect you",
    ])
    .unwrap();
    static ref JOB_REFERRAL: RegexSet = RegexSet::new([
        r"(?i)employee referral",
        r"(?i)referred you for a (?:position|role|job)",
    ])
    .unwrap();
    static ref ATS_FOOTER: RegexSet = RegexSet::new([
        r"(?i)powered by (?:greenhouse|lever|workday|ashby|icims|smartrecruiters)",
        r"(?i)sent (?:via|through) (?:greenhouse|lever|workday|ashby)",
        r"(?i)applicant tracking",
    ])
    .unwrap();
}

/// Used by the arbiter's internal-introduction override.
pub fn has_networking_intro(text: &str) -> bool {
    NETWORKING_INTRO.is_match(text)
}

/// Used by the arbiter's internal-introduction override.
pub fn has_job_referral_phrasing(text: &str) -> bool {
    JOB_REFERRAL.is_match(text)
}

/// ATS footer token check, one of the markers the arbiter's
/// internal-recruiter re-validation accepts.
pub fn has_ats_footer(text: &str) -> bool {
    ATS_FOOTER.is_match(text)
}

pub fn has_application_confirmation(text: &str) -> bool {
    APPLICATION_CONFIRMATION.is_match(text)
}

pub fn has_scheduling_language(text: &str) -> bool {
    PRESCREEN.is_match(text) || SCHEDULING.is_match(text)
}

pub fn has_rejection_phrasing(text: &str) -> bool {
    REJECTION_PHRASES.is_match(text)
}

/// Staged rule classification. First definitive match wins; returns None
/// when no rule fires and the caller should fall back to the model.
pub fn classify(
    subject: &str,
    body: &str,
    _hints: &HeaderHints,
    patterns: &CompiledPatterns,
) -> Option<RuleMatch> {
    let text = format!("{subject}\n{body}");

    // Stage 1: subject-only phrases. These are higher-specificity than
    // anything in the body, and their relative order matters: prescreen
    // invites contain scheduling verbs, so prescreen is checked first.
    if ASSESSMENT_DONE.is_match(subject) {
        log::debug!("rule stage 1: assessment completion in subject");
        return Some(RuleMatch::new(Label::Other, "assessment_completion"));
    }
    if INCOMPLETE_APPLICATION.is_match(subject) {
        log::debug!("rule stage 1: incomplete-application nudge in subject");
        return Some(RuleMatch::new(Label::Other, "incomplete_application"));
    }
    if PRESCREEN.is_match(subject) {
        log::debug!("rule stage 1: prescreen phrase in subject");
        return Some(RuleMatch::new(Label::Prescreen, "prescreen_subject"));
    }
    if SCHEDULING.is_match(subject) {
        log::debug!("rule stage 1: scheduling phrase in subject");
        return Some(RuleMatch::new(Label::InterviewInvite, "scheduling_subject"));
    }

    // Stage 2: whole-text phrases with unambiguous meaning.
    if REJECTION_PHRASES.is_match(&text) {
        log::debug!("rule stage 2: explicit rejection phrasing");
        return Some(RuleMatch::new(Label::Rejection, "rejection_phrase"));
    }
    if REFERRAL_PHRASES.is_match(&text) {
        log::debug!("rule stage 2: referral phrasing");
        return Some(RuleMatch::new(Label::Referral, "referral_phrase"));
    }
    if APPLICATION_CONFIRMATION.is_match(&text) {
        log::debug!("rule stage 2: application confirmation phrasing");
        return Some(RuleMatch::new(
            Label::JobApplication,
            "application_confirmation",
        ));
    }

    // Stage 3: priority sweep over the configured label rules, in file
    // order. An exclusion hit disqualifies that label only; the sweep
    // continues with the next label rather than restarting.
    for rule in &patterns.label_rules {
        let matched = rule.patterns.iter().find(|p| p.is_match(&text));
        let Some(matched) = matched else {
            continue;
        };
        if let Some(excl) = rule.exclusions.iter().find(|e| e.is_match(&text)) {
            log::debug!(
                "rule sweep: {} matched '{}' but excluded by '{}'",
                rule.label,
                matched.as_str(),
                excl.as_str()
            );
            continue;
        }
        log::debug!("rule sweep: {} via '{}'", rule.label, matched.as_str());
        return Some(RuleMatch::new(rule.label, matched.as_str()));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::PatternsFile;

    fn compiled() -> CompiledPatterns {
        PatternsFile::default().compile()
    }

    fn sweep(subject: &str, body: &str) -> Option<RuleMatch> {
        classify(subject, body, &HeaderHints::default(), &compiled())
    }

    #[test]
    fn test_prescreen_beats_generic_scheduling() {
        let m = sweep("Schedule Your Phone Screen for Senior Analyst", "anything").unwrap();
        assert_eq!(m.label, Label::Prescreen);
    }

    #[test]
    fn test_scheduling_subject_is_interview_invite() {
        let m = sweep("Please share your availability next week", "").unwrap();
        assert_eq!(m.label, Label::InterviewInvite);
    }

    #[test]
    fn test_assessment_completion_is_other() {
        let m = sweep("Assessment complete - next steps", "").unwrap();
        assert_eq!(m.label, Label::Other);
        assert_eq!(m.pattern, "assessment_completion");
    }

    #[test]
    fn test_incomplete_application_nudge_is_other() {
        let m = sweep("Don't forget: complete your application", "").unwrap();
        assert_eq!(m.label, Label::Other);
    }

    #[test]
    fn test_explicit_rejection_in_body() {
        let m = sweep(
            "Your application to Acme",
            "We regret to inform you that we will not be moving forward.",
        )
        .unwrap();
        assert_eq!(m.label, Label::Rejection);
    }

    #[test]
    fn test_application_confirmation_early_check() {
        let m = sweep("Thank you for applying to Acme Corp", "").unwrap();
        assert_eq!(m.label, Label::JobApplication);
        assert_eq!(m.pattern, "application_confirmation");
    }

    #[test]
    fn test_referral_phrase_wins_over_sweep() {
        let m = sweep("Intro", "Sam has referred you for the backend role.").unwrap();
        assert_eq!(m.label, Label::Referral);
    }

    #[test]
    fn test_exclusion_moves_to_next_label_in_sweep() {
        // "exciting opportunity" matches head_hunter, but the application
        // confirmation exclusion disqualifies it; the sweep continues and
        // job_application matches lower down.
        let m = sweep(
            "An exciting opportunity",
            "Your application to Acme is being reviewed.",
        )
        .unwrap();
        assert_ne!(m.label, Label::HeadHunter);
        assert_eq!(m.label, Label::JobApplication);
    }

    #[test]
    fn test_noise_sweep_label() {
        let m = sweep("Weekly digest: 14 new jobs for you", "unsubscribe below").unwrap();
        assert_eq!(m.label, Label::Noise);
    }

    #[test]
    fn test_blank_message_matches_blank() {
        let m = sweep("", "   ").unwrap();
        assert_eq!(m.label, Label::Blank);
    }

    #[test]
    fn test_no_match_returns_none() {
        assert!(sweep("Lunch on Friday?", "See you at noon.").is_none());
    }

    #[test]
    fn test_helper_phrasing_probes() {
        assert!(has_networking_intro("I'd like to introduce you to Pat"));
        assert!(!has_networking_intro("status update"));
        assert!(has_job_referral_phrasing(
            "Sam referred you for a position on our team"
        ));
        assert!(has_ats_footer("This message was powered by Greenhouse"));
    }
}
