use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::label::Label;

/// A raw message as handed over by the mailbox client. Immutable once built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMessage {
    /// Sender address or full From field (`Jane <jane@acme.com>` accepted).
    pub sender: String,
    pub subject: String,
    pub body: String,
    /// Header map; keys are lowercased on construction.
    pub headers: HashMap<String, String>,
    pub received_at: Option<DateTime<Utc>>,
    pub thread_id: String,
}

impl RawMessage {
    /// Case-insensitive header lookup. Keys are stored lowercased, but a
    /// message built by hand may not have normalized them.
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.headers
            .get(&name)
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(k, _)| k.to_lowercase() == name)
                    .map(|(_, v)| v)
            })
            .map(|v| v.as_str())
    }

    /// Lowercase all header keys in place. Called once at ingestion.
    pub fn normalize_headers(&mut self) {
        let normalized: HashMap<String, String> = self
            .headers
            .drain()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        self.headers = normalized;
    }
}

/// How the final label was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Rules,
    Ml,
    Override,
}

/// Which resolution tier produced the company name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanySource {
    Whitelist,
    DomainMapping,
    AtsExtraction,
    SubjectParse,
    BodyParse,
    OrganizationHeader,
    SenderName,
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub label: Label,
    pub confidence: f64,
    pub method: Method,
    pub ignore: bool,
    /// The rule pattern that fired, for log traceability. Not persisted.
    pub matched_rule: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyResolution {
    pub company_name: Option<String>,
    pub source: CompanySource,
}

impl CompanyResolution {
    pub fn unresolved() -> Self {
        CompanyResolution {
            company_name: None,
            source: CompanySource::Unresolved,
        }
    }
}

/// The final structured record handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionRecord {
    pub sender: String,
    pub subject: String,
    pub thread_id: String,
    pub received_at: Option<DateTime<Utc>>,
    pub label: Label,
    pub confidence: f64,
    pub method: Method,
    pub ignore: bool,
    pub ignored_reason: Option<String>,
    pub company_name: Option<String>,
    pub company_source: CompanySource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut msg = RawMessage {
            sender: "jane@acme.com".to_string(),
            ..Default::default()
        };
        msg.headers
            .insert("List-Id".to_string(), "<jobs.acme.com>".to_string());

        assert_eq!(msg.header("list-id"), Some("<jobs.acme.com>"));
        assert_eq!(msg.header("LIST-ID"), Some("<jobs.acme.com>"));

        msg.normalize_headers();
        assert!(msg.headers.contains_key("list-id"));
        assert_eq!(msg.header("List-Id"), Some("<jobs.acme.com>"));
    }
}
