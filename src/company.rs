use lazy_static::lazy_static;
use regex::{Regex, RegexSet};

use crate::domain;
use crate::headers::HeaderHints;
use crate::label::Label;
use crate::message::{CompanyResolution, CompanySource};
use crate::patterns::CompiledPatterns;
use crate::settings::Settings;

lazy_static! {
    static ref CORPORATE_SUFFIX: RegexSet = RegexSet::new([
        r"(?i)\b(?:inc|incorporated|llc|llp|ltd|limited|corp|corporation|co|gmbh|ag|plc|sa|bv)\.?$",
        r"(?i)\b(?:labs|technologies|technology|tech|systems|solutions|software|group|holdings|partners|ventures|studio|studios|games|health|bank|capital)\b",
    ])
    .unwrap();
    static ref CAPITALIZED_TOKEN: Regex = Regex::new(r"^[A-Z][a-z]+$").unwrap();
    static ref MIDDLE_INITIAL: Regex = Regex::new(r"^[A-Z]\.?$").unwrap();
    /// Job boards relay postings from a separate employer named inline.
    static ref JOB_BOARD_EMPLOYER: Vec<Regex> = [
        r"(?i)employer:\s*([A-Za-z][\w&.' -]{1,50})",
        r"(?i)company:\s*([A-Za-z][\w&.' -]{1,50})",
        r"(?i)([A-Za-z][\w&.' -]{1,50}?) is (?:hiring|looking for)",
        r"(?i)new job at ([A-Za-z][\w&.' -]{1,50})",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
    /// Subject-line tail after a spaced separator ("Acme Corp - Next
    /// Steps", "Globex | Status Update"). Requires space on both sides so
    /// hyphenated names like "Coca-Cola" survive.
    static ref TRAILING_SEGMENT: Regex = Regex::new(r"\s+[-–—|]\s.*$").unwrap();
}

/// Heuristic: does this string look like a human's name rather than a
/// company? Two capitalized word tokens (optionally a middle initial)
/// with no corporate suffix or legal-entity marker.
pub fn is_probable_person_name(candidate: &str) -> bool {
    let candidate = candidate.trim();
    if candidate.contains(['&', '@']) || candidate.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    if CORPORATE_SUFFIX.is_match(candidate) {
        return false;
    }
    let tokens: Vec<&str> = candidate.split_whitespace().collect();
    match tokens.as_slice() {
        [first, last] => CAPITALIZED_TOKEN.is_match(first) && CAPITALIZED_TOKEN.is_match(last),
        [first, middle, last] => {
            CAPITALIZED_TOKEN.is_match(first)
                && MIDDLE_INITIAL.is_match(middle)
                && CAPITALIZED_TOKEN.is_match(last)
        }
        _ => false,
    }
}

/// Resolve the company a message pertains to. First tier producing a
/// validated name wins; every tier's candidate passes through the same
/// validation (invalid-prefix list + person-name heuristic).
pub fn resolve(
    sender: &str,
    from_header: Option<&str>,
    subject: &str,
    body: &str,
    hints: &HeaderHints,
    label: Label,
    patterns: &CompiledPatterns,
    settings: &Settings,
) -> CompanyResolution {
    // Absolute guard: suppressed labels never get a company, no matter
    // what signals the message carries.
    if settings.suppresses_company(label) {
        return CompanyResolution::unresolved();
    }

    let sender_domain = domain::extract_domain(sender)
        .or_else(|| from_header.and_then(domain::extract_domain))
        .unwrap_or_default();
    let sender_name = from_header
        .and_then(domain::display_name)
        .or_else(|| domain::display_name(sender));

    // Tier 1: whitelist match on candidate tokens.
    let mut candidates: Vec<&str> = Vec::new();
    if let Some(name) = sender_name.as_deref() {
        candidates.push(name);
    }
    if let Some(org) = hints.organization.as_deref() {
        candidates.push(org);
    }
    for candidate in candidates {
        if let Some(canonical) = patterns.known_company(candidate) {
            return found(canonical, CompanySource::Whitelist);
        }
    }

    // Tier 2: sender-domain mapping with hierarchy walk-up. Skipped
    // internally when the root is an ATS platform.
    if let Some(company) = patterns.company_for_domain(&sender_domain) {
        return found(company, CompanySource::DomainMapping);
    }

    // Tier 3: ATS senders carry the employer in the display name.
    if patterns.is_ats_domain(&sender_domain) {
        if let Some(name) = sender_name.as_deref() {
            if let Some(valid) = validate(name, patterns) {
                return found(&valid, CompanySource::AtsExtraction);
            }
        }
    }

    // Tier 4: job boards relay postings; the employer is named in the body.
    if patterns.is_job_board_domain(&sender_domain) {
        for re in JOB_BOARD_EMPLOYER.iter() {
            if let Some(valid) = capture(re, body, patterns) {
                return found(&valid, CompanySource::BodyParse);
            }
        }
    }

    // Tier 5: subject-line capture patterns.
    for re in &patterns.subject_company_patterns {
        if let Some(valid) = capture(re, subject, patterns) {
            return found(&valid, CompanySource::SubjectParse);
        }
    }

    // Tier 6: body-text fallback patterns.
    for re in &patterns.body_company_patterns {
        if let Some(valid) = capture(re, body, patterns) {
            return found(&valid, CompanySource::BodyParse);
        }
    }

    // Tier 7: organization header.
    if let Some(org) = hints.organization.as_deref() {
        if let Some(valid) = validate(org, patterns) {
            return found(&valid, CompanySource::OrganizationHeader);
        }
    }

    // Tier 8: sender display name.
    if let Some(name) = sender_name.as_deref() {
        if let Some(valid) = validate(name, patterns) {
            return found(&valid, CompanySource::SenderName);
        }
    }

    CompanyResolution::unresolved()
}

fn found(name: &str, source: CompanySource) -> CompanyResolution {
    log::debug!("company resolved via {source:?}: {name}");
    CompanyResolution {
        company_name: Some(name.to_string()),
        source,
    }
}

fn capture(re: &Regex, text: &str, patterns: &CompiledPatterns) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| validate(m.as_str(), patterns))
}

/// Shared candidate validation: trim decoration, reject generic prefixes
/// and person-looking names.
fn validate(candidate: &str, patterns: &CompiledPatterns) -> Option<String> {
    let cleaned = TRAILING_SEGMENT
        .replace(candidate, "")
        .trim()
        .trim_end_matches(['.', ',', '-', '!', ':', ';'])
        .trim()
        .to_string();
    if cleaned.len() < 2 {
        return None;
    }
    if patterns.has_invalid_prefix(&cleaned) {
        log::debug!("company candidate '{cleaned}' rejected by prefix list");
        return None;
    }
    if is_probable_person_name(&cleaned) {
        log::debug!("company candidate '{cleaned}' looks like a person name");
        return None;
    }
    Some(cleaned)
}
