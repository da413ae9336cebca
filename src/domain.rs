use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref EMAIL_SYNTAX: Regex =
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").unwrap();
}

/// Extract the bare address from a From/Reply-To style field.
/// Handles both `Jane Doe <jane@acme.com>` and bare `jane@acme.com`.
pub fn extract_address(field: &str) -> Option<String> {
    let field = field.trim();
    let addr = if let Some(start) = field.rfind('<') {
        let rest = &field[start + 1..];
        rest.split('>').next().unwrap_or(rest)
    } else {
        field
    };
    let addr = addr.trim().trim_end_matches('>');
    if addr.contains('@') {
        Some(addr.to_lowercase())
    } else {
        None
    }
}

/// Extract the lowercased domain from an address or addr-spec field.
pub fn extract_domain(field: &str) -> Option<String> {
    extract_address(field).and_then(|addr| addr.split('@').nth(1).map(|d| d.to_string()))
}

/// Extract the local part (before the @) of an address field.
pub fn extract_local_part(field: &str) -> Option<String> {
    extract_address(field).and_then(|addr| addr.split('@').next().map(|l| l.to_string()))
}

/// Extract the display name from a `Jane Doe <jane@acme.com>` style field.
/// Returns None for bare addresses or blank display names.
pub fn display_name(field: &str) -> Option<String> {
    let field = field.trim();
    let start = field.rfind('<')?;
    let name = field[..start].trim().trim_matches('"').trim();
    if name.is_empty() || name.contains('@') {
        None
    } else {
        Some(name.to_string())
    }
}

/// Syntactic check that a string is a plausible email address.
pub fn is_email_address(s: &str) -> bool {
    EMAIL_SYNTAX.is_match(s.trim())
}

/// Check domain membership in a set, subdomain-aware:
/// `mail.acme.com` matches a set containing `acme.com`.
pub fn in_domain_set(domain: &str, set: &HashSet<String>) -> bool {
    let domain = domain.to_lowercase();
    if set.contains(&domain) {
        return true;
    }
    set.iter()
        .any(|entry| domain.ends_with(&format!(".{entry}")))
}

/// Iterate a domain and its successive parent domains:
/// `mail.careers.acme.com` yields itself, `careers.acme.com`, `acme.com`.
/// Stops at the two-label root.
pub fn parent_domains(domain: &str) -> Vec<String> {
    let domain = domain.to_lowercase();
    let labels: Vec<&str> = domain.split('.').collect();
    let mut out = Vec::new();
    if labels.len() < 2 {
        return out;
    }
    for start in 0..=labels.len() - 2 {
        out.push(labels[start..].join("."));
    }
    out
}

/// The registrable root of a domain, approximated as its last two labels.
pub fn root_domain(domain: &str) -> String {
    let domain = domain.to_lowercase();
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() <= 2 {
        domain
    } else {
        labels[labels.len() - 2..].join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_address() {
        assert_eq!(
            extract_address("Jane Doe <Jane@Acme.com>"),
            Some("jane@acme.com".to_string())
        );
        assert_eq!(
            extract_address("jane@acme.com"),
            Some("jane@acme.com".to_string())
        );
        assert_eq!(extract_address("Jane Doe"), None);
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("noreply@mail.acme.com"),
            Some("mail.acme.com".to_string())
        );
        assert_eq!(
            extract_domain("Acme Careers <jobs@acme.com>"),
            Some("acme.com".to_string())
        );
        assert_eq!(extract_domain("not-an-address"), None);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            display_name("Acme Recruiting <jobs@acme.com>"),
            Some("Acme Recruiting".to_string())
        );
        assert_eq!(
            display_name("\"Doe, Jane\" <jane@acme.com>"),
            Some("Doe, Jane".to_string())
        );
        assert_eq!(display_name("jane@acme.com"), None);
        assert_eq!(display_name("<jane@acme.com>"), None);
    }

    #[test]
    fn test_in_domain_set() {
        let set: HashSet<String> = ["acme.com".to_string()].into_iter().collect();
        assert!(in_domain_set("acme.com", &set));
        assert!(in_domain_set("mail.acme.com", &set));
        assert!(!in_domain_set("notacme.com", &set));
        assert!(!in_domain_set("acme.com.evil.org", &set));
    }

    #[test]
    fn test_parent_domains() {
        assert_eq!(
            parent_domains("mail.careers.acme.com"),
            vec![
                "mail.careers.acme.com".to_string(),
                "careers.acme.com".to_string(),
                "acme.com".to_string()
            ]
        );
        assert_eq!(parent_domains("acme.com"), vec!["acme.com".to_string()]);
        assert!(parent_domains("localhost").is_empty());
    }

    #[test]
    fn test_root_domain() {
        assert_eq!(root_domain("someuser.myworkdayjobs.com"), "myworkdayjobs.com");
        assert_eq!(root_domain("acme.com"), "acme.com");
    }

    #[test]
    fn test_is_email_address() {
        assert!(is_email_address("jane@acme.com"));
        assert!(!is_email_address("jane at acme"));
    }
}
