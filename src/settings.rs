use serde::{Deserialize, Serialize};

use crate::label::Label;

/// Top-level tunables for the triage pipeline. Everything here is a policy
/// knob, not an algorithm constant: the acceptance threshold and the label
/// sets are expected to be tuned per mailbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the pattern set backing file (YAML).
    pub patterns_path: String,
    /// Path to the serialized text classifier artifact (JSON). Optional;
    /// without it the pipeline runs rules-only.
    #[serde(default)]
    pub model_path: Option<String>,
    /// Minimum model confidence for an ML label to be accepted when no
    /// rule matched.
    #[serde(default = "default_ml_threshold")]
    pub ml_acceptance_threshold: f64,
    /// Labels whose records are flagged `ignore = true`.
    #[serde(default = "default_ignore_labels")]
    pub ignore_labels: Vec<Label>,
    /// Labels for which company resolution is suppressed entirely.
    #[serde(default = "default_suppressed_labels")]
    pub company_suppressed_labels: Vec<Label>,
    /// The mailbox owner's own address; self-sent mail is forced to "other".
    #[serde(default)]
    pub owner_address: Option<String>,
}

fn default_ml_threshold() -> f64 {
    0.55
}

fn default_ignore_labels() -> Vec<Label> {
    vec![Label::Noise, Label::HeadHunter]
}

fn default_suppressed_labels() -> Vec<Label> {
    vec![Label::Noise]
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            patterns_path: "config/patterns.yaml".to_string(),
            model_path: None,
            ml_acceptance_threshold: default_ml_threshold(),
            ignore_labels: default_ignore_labels(),
            company_suppressed_labels: default_suppressed_labels(),
            owner_address: None,
        }
    }
}

impl Settings {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    pub fn to_file(&self, path: &str) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn is_ignored(&self, label: Label) -> bool {
        self.ignore_labels.contains(&label)
    }

    pub fn suppresses_company(&self, label: Label) -> bool {
        self.company_suppressed_labels.contains(&label)
    }

    pub fn is_owner(&self, sender_address: &str) -> bool {
        self.owner_address
            .as_deref()
            .map(|owner| owner.eq_ignore_ascii_case(sender_address.trim()))
            .unwrap_or(false)
    }
}
