use crate::headers::HeaderHints;
use crate::label::Label;
use crate::message::{ClassificationResult, Method};
use crate::ml::MlPrediction;
use crate::patterns::CompiledPatterns;
use crate::rules::{self, RuleMatch};
use crate::settings::Settings;

/// Everything the arbiter needs to decide one message.
pub struct ArbiterInput<'a> {
    pub rule_match: Option<&'a RuleMatch>,
    pub ml: &'a MlPrediction,
    pub hints: &'a HeaderHints,
    /// Bare, lowercased sender address.
    pub sender_address: &'a str,
    pub sender_domain: &'a str,
    /// Combined subject + body text.
    pub text: &'a str,
    pub patterns: &'a CompiledPatterns,
    pub settings: &'a Settings,
}

type OverrideStep = fn(ClassificationResult, &ArbiterInput) -> ClassificationResult;

/// The override chain, applied strictly in this order. Each step is a
/// pure transformation; the order here is the contract, not incidental
/// code placement.
const OVERRIDES: &[(&str, OverrideStep)] = &[
    ("internal_recruiter", internal_recruiter),
    ("internal_introduction", internal_introduction),
    ("personal_domain", personal_domain),
    ("self_sent", self_sent),
    ("label_upgrade", label_upgrade),
];

pub fn arbitrate(input: &ArbiterInput) -> ClassificationResult {
    let mut result = base_decision(input);
    for (name, step) in OVERRIDES {
        let before = result.label;
        result = step(result, input);
        if result.label != before {
            log::debug!("override {name}: {before} -> {}", result.label);
        }
    }
    result.ignore = input.settings.is_ignored(result.label);
    result
}

/// Precedence: a rule-sweep label wins outright; otherwise the model label
/// if confident enough; otherwise blank (upgraded to noise by the final
/// override pass). The one place a rule match does not settle things is
/// head_hunter against an internal company domain, which the
/// internal-recruiter override re-validates below.
fn base_decision(input: &ArbiterInput) -> ClassificationResult {
    if let Some(rule) = input.rule_match {
        return ClassificationResult {
            label: rule.label,
            confidence: 1.0,
            method: Method::Rules,
            ignore: false,
            matched_rule: Some(rule.pattern.clone()),
        };
    }
    if input.ml.confidence >= input.settings.ml_acceptance_threshold {
        return ClassificationResult {
            label: input.ml.label,
            confidence: input.ml.confidence,
            method: Method::Ml,
            ignore: false,
            matched_rule: None,
        };
    }
    ClassificationResult {
        label: Label::Blank,
        confidence: input.ml.confidence,
        method: Method::Override,
        ignore: false,
        matched_rule: None,
    }
}

fn is_internal_company_domain(input: &ArbiterInput) -> bool {
    input
        .patterns
        .company_for_domain(input.sender_domain)
        .is_some()
        && !input.patterns.is_headhunter_domain(input.sender_domain)
}

fn has_ats_marker(input: &ArbiterInput) -> bool {
    rules::has_ats_footer(input.text)
        || input.hints.is_newsletter
        || input.patterns.is_ats_domain(input.sender_domain)
}

/// Scan a single configured label rule against the text, honoring its
/// exclusions. Used for re-validation, not for the priority sweep.
fn label_rule_matches(patterns: &CompiledPatterns, label: Label, text: &str) -> bool {
    patterns
        .label_rules
        .iter()
        .filter(|rule| rule.label == label)
        .any(|rule| {
            rule.patterns.iter().any(|p| p.is_match(text))
                && !rule.exclusions.iter().any(|e| e.is_match(text))
        })
}

/// head_hunter from a domain that maps to a known company is an internal
/// recruiter, not an external agency. Re-validate what the message
/// actually is instead of trusting the head_hunter label.
fn internal_recruiter(
    mut result: ClassificationResult,
    input: &ArbiterInput,
) -> ClassificationResult {
    if result.label != Label::HeadHunter || !is_internal_company_domain(input) {
        return result;
    }

    let replacement = if rules::has_application_confirmation(input.text) {
        // An application confirmation from an internal sender only keeps
        // the job_application label when an ATS marker backs it up.
        if has_ats_marker(input) {
            Label::JobApplication
        } else {
            Label::Other
        }
    } else if rules::has_rejection_phrasing(input.text)
        || label_rule_matches(input.patterns, Label::Rejection, input.text)
    {
        Label::Rejection
    } else if label_rule_matches(input.patterns, Label::Offer, input.text) {
        Label::Offer
    } else if rules::has_scheduling_language(input.text)
        || label_rule_matches(input.patterns, Label::InterviewInvite, input.text)
    {
        Label::InterviewInvite
    } else {
        Label::Other
    };

    result.label = replacement;
    result.method = Method::Override;
    result
}

/// A colleague's social introduction from a company domain reads like a
/// referral or interview invite but is neither.
fn internal_introduction(
    mut result: ClassificationResult,
    input: &ArbiterInput,
) -> ClassificationResult {
    if !matches!(result.label, Label::Referral | Label::InterviewInvite) {
        return result;
    }
    if is_internal_company_domain(input)
        && rules::has_networking_intro(input.text)
        && !rules::has_job_referral_phrasing(input.text)
    {
        result.label = Label::Other;
        result.method = Method::Override;
    }
    result
}

/// Free consumer email providers never carry legitimate ATS or company
/// correspondence here, so personal senders are forced to noise no matter
/// what matched earlier. Known to suppress genuine personal referrals;
/// intentional.
fn personal_domain(mut result: ClassificationResult, input: &ArbiterInput) -> ClassificationResult {
    if input.patterns.is_personal_domain(input.sender_domain) && result.label != Label::Noise {
        result.label = Label::Noise;
        result.method = Method::Override;
    }
    result
}

/// Mail from the mailbox owner to themselves is never job traffic.
fn self_sent(mut result: ClassificationResult, input: &ArbiterInput) -> ClassificationResult {
    if result.label != Label::Noise
        && input.settings.is_owner(input.sender_address)
        && result.label != Label::Other
    {
        result.label = Label::Other;
        result.method = Method::Override;
    }
    result
}

/// Final pass: the generic catch-alls get one more look. A "response"
/// with concrete application or scheduling signals is upgraded; a still-
/// blank result is downgraded to noise.
fn label_upgrade(mut result: ClassificationResult, input: &ArbiterInput) -> ClassificationResult {
    match result.label {
        Label::Response => {
            if rules::has_application_confirmation(input.text) {
                result.label = Label::JobApplication;
                result.method = Method::Override;
            } else if rules::has_scheduling_language(input.text) {
                result.label = Label::InterviewInvite;
                result.method = Method::Override;
            }
        }
        Label::Blank => {
            result.label = Label::Noise;
            result.method = Method::Override;
        }
        _ => {}
    }
    result
}
