use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::domain;
use crate::label::Label;

/// Raw, serde-facing shape of the pattern backing file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternsFile {
    /// Ordered: file order is sweep priority.
    #[serde(default)]
    pub labels: Vec<LabelPatterns>,
    #[serde(default)]
    pub known_companies: Vec<String>,
    #[serde(default)]
    pub domain_map: HashMap<String, String>,
    #[serde(default)]
    pub ats_domains: Vec<String>,
    #[serde(default)]
    pub headhunter_domains: Vec<String>,
    #[serde(default)]
    pub job_board_domains: Vec<String>,
    #[serde(default)]
    pub personal_domains: Vec<String>,
    /// Candidate company names starting with any of these are rejected.
    #[serde(default)]
    pub invalid_name_prefixes: Vec<String>,
    /// Capture-group regexes run against the subject; group 1 is the company.
    #[serde(default)]
    pub subject_company_patterns: Vec<String>,
    /// Fallback capture-group regexes run against the body.
    #[serde(default)]
    pub body_company_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelPatterns {
    pub label: Label,
    pub patterns: Vec<String>,
    #[serde(default)]
    pub exclusions: Vec<String>,
}

impl PatternsFile {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: PatternsFile = serde_yaml::from_str(&content)?;
        Ok(file)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Compile into matchers. A pattern that fails to compile is skipped
    /// with a warning; the rest of the set stays active.
    pub fn compile(&self) -> CompiledPatterns {
        let label_rules = self
            .labels
            .iter()
            .map(|lp| LabelRule {
                label: lp.label,
                patterns: compile_list(lp.label.as_str(), &lp.patterns),
                exclusions: compile_list(lp.label.as_str(), &lp.exclusions),
            })
            .collect();

        CompiledPatterns {
            label_rules,
            known_companies: self
                .known_companies
                .iter()
                .map(|c| (c.to_lowercase(), c.clone()))
                .collect(),
            domain_map: self
                .domain_map
                .iter()
                .map(|(d, c)| (d.to_lowercase(), c.clone()))
                .collect(),
            ats_domains: lower_set(&self.ats_domains),
            headhunter_domains: lower_set(&self.headhunter_domains),
            job_board_domains: lower_set(&self.job_board_domains),
            personal_domains: lower_set(&self.personal_domains),
            invalid_name_prefixes: self
                .invalid_name_prefixes
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
            subject_company_patterns: compile_list("subject_company", &self.subject_company_patterns),
            body_company_patterns: compile_list("body_company", &self.body_company_patterns),
        }
    }
}

fn compile_list(context: &str, raw: &[String]) -> Vec<Regex> {
    raw.iter()
        .filter_map(|p| match Regex::new(p) {
            Ok(re) => Some(re),
            Err(e) => {
                log::warn!("skipping invalid {context} pattern '{p}': {e}");
                None
            }
        })
        .collect()
}

fn lower_set(raw: &[String]) -> HashSet<String> {
    raw.iter().map(|d| d.to_lowercase()).collect()
}

/// One entry in the priority sweep: label plus its matchers and guards.
#[derive(Debug)]
pub struct LabelRule {
    pub label: Label,
    pub patterns: Vec<Regex>,
    pub exclusions: Vec<Regex>,
}

/// Fully compiled, immutable pattern snapshot. Replaced wholesale on
/// reload; never mutated in place.
#[derive(Debug)]
pub struct CompiledPatterns {
    pub label_rules: Vec<LabelRule>,
    /// lowercase -> canonical casing
    pub known_companies: HashMap<String, String>,
    pub domain_map: HashMap<String, String>,
    pub ats_domains: HashSet<String>,
    pub headhunter_domains: HashSet<String>,
    pub job_board_domains: HashSet<String>,
    pub personal_domains: HashSet<String>,
    pub invalid_name_prefixes: Vec<String>,
    pub subject_company_patterns: Vec<Regex>,
    pub body_company_patterns: Vec<Regex>,
}

impl CompiledPatterns {
    pub fn is_ats_domain(&self, domain: &str) -> bool {
        domain::in_domain_set(domain, &self.ats_domains)
    }

    pub fn is_headhunter_domain(&self, domain: &str) -> bool {
        domain::in_domain_set(domain, &self.headhunter_domains)
    }

    pub fn is_job_board_domain(&self, domain: &str) -> bool {
        domain::in_domain_set(domain, &self.job_board_domains)
    }

    pub fn is_personal_domain(&self, domain: &str) -> bool {
        domain::in_domain_set(domain, &self.personal_domains)
    }

    /// Map a sender domain to its canonical company, walking up the label
    /// hierarchy (`mail.careers.acme.com` -> `careers.acme.com` ->
    /// `acme.com`). The walk-up is skipped entirely when the registrable
    /// root is an ATS domain: ATS platforms host many unrelated tenants on
    /// shared subdomains and must not collapse into one company.
    pub fn company_for_domain(&self, sender_domain: &str) -> Option<&str> {
        if self.ats_domains.contains(&domain::root_domain(sender_domain)) {
            return None;
        }
        for candidate in domain::parent_domains(sender_domain) {
            if let Some(company) = self.domain_map.get(&candidate) {
                return Some(company.as_str());
            }
        }
        None
    }

    /// Exact whitelist lookup, case-insensitive; returns canonical casing.
    pub fn known_company(&self, candidate: &str) -> Option<&str> {
        self.known_companies
            .get(&candidate.trim().to_lowercase())
            .map(|c| c.as_str())
    }

    pub fn has_invalid_prefix(&self, candidate: &str) -> bool {
        let lower = candidate.trim().to_lowercase();
        self.invalid_name_prefixes
            .iter()
            .any(|p| lower.starts_with(p.as_str()))
    }
}

impl Default for PatternsFile {
    /// A usable starter pattern set. Sweep order here is the label
    /// priority order; tune per mailbox by editing the backing file.
    fn default() -> Self {
        let label = |label: Label, patterns: &[&str], exclusions: &[&str]| LabelPatterns {
            label,
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            exclusions: exclusions.iter().map(|s| s.to_string()).collect(),
        };
        let strs = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };

        PatternsFile {
            labels: vec![
                label(
                    Label::Offer,
                    &[
                        r"(?i)pleased to (?:extend|offer)",
                        r"(?i)offer letter",
                        r"(?i)formal(?:ly extend an)? offer",
                        r"(?i)congratulations.{0,60}offer",
                        r"(?i)offer of employment",
                    ],
                    &[
                        r"(?i)special offer",
                        r"(?i)offer (?:alert|expires)",
                        r"(?i)job offers? (?:for|near) you",
                    ],
                ),
                label(
                    Label::Rejection,
                    &[
                        r"(?i)unfortunately",
                        r"(?i)(?:decided|chosen) (?:not )?to (?:move|proceed) (?:forward )?with other",
                        r"(?i)not (?:be )?(?:moving|proceeding) forward",
                        r"(?i)pursu(?:e|ing) other (?:candidates|applicants)",
                        r"(?i)wish you (?:the best|every success|success)",
                        r"(?i)your application was not selected",
                    ],
                    &[r"(?i)job alert", r"(?i)newsletter"],
                ),
                label(
                    Label::HeadHunter,
                    &[
                        r"(?i)came across your (?:profile|resume|background)",
                        r"(?i)exciting opportunit",
                        r"(?i)staffing (?:agency|firm|solutions)",
                        r"(?i)recruit(?:er|ing) (?:at|with|on behalf of)",
                        r"(?i)currently hiring for",
                        r"(?i)your (?:skills|experience) (?:are|is) a (?:great|perfect) (?:fit|match)",
                    ],
                    &[
                        r"(?i)thank you for applying",
                        r"(?i)we(?:'ve| have)? received your application",
                        r"(?i)your application (?:to|has been)",
                    ],
                ),
                label(
                    Label::Noise,
                    &[
                        r"(?i)newsletter",
                        r"(?i)job alert",
                        r"(?i)(?:daily|weekly) digest",
                        r"(?i)recommended (?:jobs|for you)",
                        r"(?i)jobs you (?:may|might) (?:like|be interested in)",
                        r"(?i)trending (?:jobs|articles)",
                    ],
                    &[
                        r"(?i)your application",
                        r"(?i)interview",
                        r"(?i)offer letter",
                    ],
                ),
                label(
                    Label::JobApplication,
                    &[
                        r"(?i)application (?:was |has been )?(?:received|submitted)",
                        r"(?i)thank you for (?:your interest|applying)",
                        r"(?i)we(?:'ve| have)? received your application",
                        r"(?i)your application (?:to|for|is being reviewed)",
                        r"(?i)application status",
                        r"(?i)successfully applied",
                    ],
                    &[
                        r"(?i)unfortunately",
                        r"(?i)not (?:be )?moving forward",
                    ],
                ),
                label(
                    Label::InterviewInvite,
                    &[
                        r"(?i)schedule (?:an|your|the) interview",
                        r"(?i)interview (?:invitation|request|confirmation)",
                        r"(?i)would (?:love|like) to (?:chat|speak|talk) with you",
                        r"(?i)next (?:step|round) (?:is|will be) an? interview",
                        r"(?i)invite you to interview",
                    ],
                    &[r"(?i)newsletter", r"(?i)interview tips"],
                ),
                label(
                    Label::Other,
                    &[
                        r"(?i)background check",
                        r"(?i)assessment",
                        r"(?i)complete your (?:application|profile)",
                        r"(?i)action required",
                        r"(?i)verify your email",
                    ],
                    &[],
                ),
                label(
                    Label::Referral,
                    &[
                        r"(?i)employee referral",
                        r"(?i)referred you",
                        r"(?i)referral (?:for|to) (?:a|the) (?:position|role)",
                    ],
                    &[r"(?i)refer a friend", r"(?i)referral bonus program"],
                ),
                label(
                    Label::Ghosted,
                    &[
                        r"(?i)still under (?:review|consideration)",
                        r"(?i)no update at this time",
                        r"(?i)application is (?:still )?(?:pending|in progress)",
                    ],
                    &[],
                ),
                label(Label::Blank, &[r"\A\s*\z"], &[]),
            ],
            known_companies: vec![],
            domain_map: HashMap::new(),
            ats_domains: strs(&[
                "myworkdayjobs.com",
                "greenhouse.io",
                "greenhouse-mail.io",
                "lever.co",
                "hire.lever.co",
                "icims.com",
                "smartrecruiters.com",
                "jobvite.com",
                "ashbyhq.com",
                "bamboohr.com",
                "successfactors.com",
                "taleo.net",
            ]),
            headhunter_domains: strs(&[
                "roberthalf.com",
                "randstadusa.com",
                "adeccona.com",
                "kforce.com",
                "insightglobal.com",
                "cybercoders.com",
                "teksystems.com",
            ]),
            job_board_domains: strs(&[
                "indeed.com",
                "ziprecruiter.com",
                "glassdoor.com",
                "monster.com",
                "dice.com",
                "wellfound.com",
            ]),
            personal_domains: strs(&[
                "gmail.com",
                "yahoo.com",
                "hotmail.com",
                "outlook.com",
                "aol.com",
                "icloud.com",
                "me.com",
                "proton.me",
                "protonmail.com",
                "msn.com",
                "live.com",
            ]),
            invalid_name_prefixes: strs(&[
                "noreply",
                "no-reply",
                "donotreply",
                "notifications",
                "notification",
                "support",
                "info",
                "admin",
                "hello",
                "careers",
                "jobs",
                "talent acquisition",
                "recruiting team",
                "hiring team",
                "the team",
            ]),
            subject_company_patterns: strs(&[
                r"(?i)your application (?:to|at|with) ([A-Za-z][\w&.,' -]{1,50})",
                r"(?i)thank you for applying (?:to|at) ([A-Za-z][\w&.,' -]{1,50})",
                r"(?i)application (?:for|to) .{1,60} at ([A-Za-z][\w&.,' -]{1,50})",
                r"(?i)application (?:status|update).{0,40} at ([A-Za-z][\w&.,' -]{1,50})",
                r"(?i)interview (?:with|at) ([A-Za-z][\w&.,' -]{1,50})",
                r"(?i)([A-Za-z][\w&.' -]{1,50}) has an open(?:ing| position)",
                r"(?i)update (?:from|on your application (?:to|at)) ([A-Za-z][\w&.,' -]{1,50})",
            ]),
            body_company_patterns: strs(&[
                r"(?i)apply(?:ing)? to ([A-Za-z][\w&.' -]{1,40})",
                r"(?i)(?:position|role|opening) at ([A-Za-z][\w&.' -]{1,40})",
                r"(?i)the ([A-Za-z][\w&.' -]{1,40}) (?:talent|recruiting|hiring) team",
                r"(?i)on behalf of ([A-Za-z][\w&.' -]{1,40})",
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_set_compiles_fully() {
        let file = PatternsFile::default();
        let compiled = file.compile();
        assert_eq!(compiled.label_rules.len(), file.labels.len());
        for (rule, raw) in compiled.label_rules.iter().zip(&file.labels) {
            assert_eq!(rule.patterns.len(), raw.patterns.len());
            assert_eq!(rule.exclusions.len(), raw.exclusions.len());
        }
        assert_eq!(
            compiled.subject_company_patterns.len(),
            file.subject_company_patterns.len()
        );
    }

    #[test]
    fn test_invalid_pattern_is_skipped_not_fatal() {
        let mut file = PatternsFile::default();
        file.labels[0].patterns.push("(unclosed".to_string());
        let good = file.labels[0].patterns.len() - 1;
        let compiled = file.compile();
        assert_eq!(compiled.label_rules[0].patterns.len(), good);
    }

    #[test]
    fn test_company_for_domain_walks_up() {
        let mut file = PatternsFile::default();
        file.domain_map
            .insert("acme.com".to_string(), "Acme Inc".to_string());
        let compiled = file.compile();

        assert_eq!(compiled.company_for_domain("acme.com"), Some("Acme Inc"));
        assert_eq!(
            compiled.company_for_domain("careers.acme.com"),
            Some("Acme Inc")
        );
        assert_eq!(
            compiled.company_for_domain("mail.careers.acme.com"),
            Some("Acme Inc")
        );
        assert_eq!(compiled.company_for_domain("other.com"), None);
    }

    #[test]
    fn test_walk_up_skipped_for_ats_root() {
        let mut file = PatternsFile::default();
        // Even with a (mis)configured mapping for the ATS root, tenant
        // subdomains must not collapse into one company.
        file.domain_map.insert(
            "myworkdayjobs.com".to_string(),
            "Workday".to_string(),
        );
        let compiled = file.compile();
        assert_eq!(compiled.company_for_domain("someuser.myworkdayjobs.com"), None);
        assert_eq!(compiled.company_for_domain("myworkdayjobs.com"), None);
    }

    #[test]
    fn test_domain_sets_are_subdomain_aware() {
        let compiled = PatternsFile::default().compile();
        assert!(compiled.is_ats_domain("acme.greenhouse.io"));
        assert!(compiled.is_personal_domain("gmail.com"));
        assert!(!compiled.is_personal_domain("gmail.com.evil.org"));
        assert!(compiled.is_job_board_domain("mail.indeed.com"));
    }

    #[test]
    fn test_known_company_and_invalid_prefix() {
        let mut file = PatternsFile::default();
        file.known_companies.push("Acme Corp".to_string());
        let compiled = file.compile();

        assert_eq!(compiled.known_company("acme corp"), Some("Acme Corp"));
        assert_eq!(compiled.known_company("Acme Corp "), Some("Acme Corp"));
        assert_eq!(compiled.known_company("acme"), None);

        assert!(compiled.has_invalid_prefix("Noreply"));
        assert!(compiled.has_invalid_prefix("Recruiting Team at Acme"));
        assert!(!compiled.has_invalid_prefix("Acme Corp"));
    }

    #[test]
    fn test_yaml_round_trip() {
        let file = PatternsFile::default();
        let yaml = serde_yaml::to_string(&file).unwrap();
        let parsed: PatternsFile = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.labels.len(), file.labels.len());
        assert_eq!(parsed.ats_domains, file.ats_domains);
    }
}
