use std::collections::HashMap;

use crate::domain;

/// Structural signals pulled out of the header block. Computed once per
/// message and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderHints {
    pub is_newsletter: bool,
    pub is_bulk: bool,
    pub is_automated: bool,
    pub is_noreply: bool,
    pub reply_to: Option<String>,
    pub organization: Option<String>,
    pub auto_submitted: Option<String>,
}

/// Header names whose presence marks list/campaign mail.
const LIST_HEADERS: &[&str] = &["list-id", "list-unsubscribe", "list-post"];
const CAMPAIGN_HEADERS: &[&str] = &[
    "x-campaign",
    "x-campaign-id",
    "x-mailchimp-id",
    "x-mc-user",
    "x-sg-eid",
    "x-ses-outgoing",
    "x-mailgun-tag",
];

/// Extract header hints. Pure: missing headers produce false/None fields,
/// never an error.
pub fn analyze(sender: &str, headers: &HashMap<String, String>) -> HeaderHints {
    let get = |name: &str| -> Option<&str> {
        let name = name.to_lowercase();
        headers
            .iter()
            .find(|(k, _)| k.to_lowercase() == name)
            .map(|(_, v)| v.as_str())
    };

    let is_newsletter = LIST_HEADERS.iter().any(|h| get(h).is_some())
        || CAMPAIGN_HEADERS.iter().any(|h| get(h).is_some());

    let is_bulk = get("precedence")
        .map(|v| {
            let v = v.trim().to_lowercase();
            v == "bulk" || v == "list"
        })
        .unwrap_or(false);

    let auto_submitted = get("auto-submitted")
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let is_automated = auto_submitted
        .as_deref()
        .map(|v| !v.eq_ignore_ascii_case("no"))
        .unwrap_or(false);

    let is_noreply = sender_is_noreply(sender, get("from"));

    let organization = get("organization")
        .or_else(|| get("x-organization"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let reply_to = get("reply-to")
        .and_then(domain::extract_address)
        .filter(|addr| domain::is_email_address(addr));

    HeaderHints {
        is_newsletter,
        is_bulk,
        is_automated,
        is_noreply,
        reply_to,
        organization,
        auto_submitted,
    }
}

fn sender_is_noreply(sender: &str, from_header: Option<&str>) -> bool {
    let marker = |s: &str| {
        let s = s.to_lowercase();
        s.contains("noreply") || s.contains("no-reply") || s.contains("donotreply")
    };

    if let Some(local) = domain::extract_local_part(sender) {
        if marker(&local) {
            return true;
        }
    }
    if let Some(from) = from_header {
        if let Some(name) = domain::display_name(from) {
            if marker(&name) {
                return true;
            }
        }
        if let Some(local) = domain::extract_local_part(from) {
            if marker(&local) {
                return true;
            }
        }
    }
    false
}
