use crate::arbiter::{self, ArbiterInput};
use crate::company;
use crate::domain;
use crate::headers;
use crate::label::Label;
use crate::message::{IngestionRecord, RawMessage};
use crate::ml::MlClassifier;
use crate::rules;
use crate::settings::Settings;
use crate::store::PatternStore;

/// The single entry point exposed to the calling persistence/UI layer.
///
/// Per-message processing is pure and synchronous: all derived state is
/// owned by the call, and the only shared resource is the read-mostly
/// pattern snapshot, so `process` is safe to call concurrently across
/// different messages.
pub struct Pipeline {
    settings: Settings,
    store: PatternStore,
    ml: MlClassifier,
}

impl Pipeline {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let store = PatternStore::open(&settings.patterns_path)?;
        let ml = match settings.model_path.as_deref() {
            Some(path) => MlClassifier::load(path),
            None => MlClassifier::disabled(),
        };
        if !ml.is_enabled() {
            log::info!("no usable model, pipeline runs rules-only");
        }
        Ok(Pipeline {
            settings,
            store,
            ml,
        })
    }

    /// Assemble from pre-built parts. Used by tests and by callers that
    /// manage configuration themselves.
    pub fn from_parts(settings: Settings, store: PatternStore, ml: MlClassifier) -> Self {
        Pipeline {
            settings,
            store,
            ml,
        }
    }

    pub fn process(&self, raw: &RawMessage) -> IngestionRecord {
        let patterns = self.store.current();

        let sender_address = domain::extract_address(&raw.sender)
            .or_else(|| raw.header("from").and_then(domain::extract_address))
            .unwrap_or_default();
        let sender_domain = sender_address
            .split('@')
            .nth(1)
            .unwrap_or_default()
            .to_string();

        let hints = headers::analyze(&raw.sender, &raw.headers);
        let rule_match = rules::classify(&raw.subject, &raw.body, &hints, &patterns);
        let ml_prediction = self.ml.predict(&raw.subject, &raw.body);
        let text = format!("{}\n{}", raw.subject, raw.body);

        let classification = arbiter::arbitrate(&ArbiterInput {
            rule_match: rule_match.as_ref(),
            ml: &ml_prediction,
            hints: &hints,
            sender_address: &sender_address,
            sender_domain: &sender_domain,
            text: &text,
            patterns: &patterns,
            settings: &self.settings,
        });

        let resolution = company::resolve(
            &raw.sender,
            raw.header("from"),
            &raw.subject,
            &raw.body,
            &hints,
            classification.label,
            &patterns,
            &self.settings,
        );

        let ignored_reason = if classification.ignore {
            Some(ignored_reason(
                classification.label,
                patterns.is_personal_domain(&sender_domain),
            ))
        } else {
            None
        };

        log::debug!(
            "processed message from {}: label={} method={:?} company={:?}",
            sender_address,
            classification.label,
            classification.method,
            resolution.company_name
        );

        IngestionRecord {
            sender: sender_address,
            subject: raw.subject.clone(),
            thread_id: raw.thread_id.clone(),
            received_at: raw.received_at,
            label: classification.label,
            confidence: classification.confidence,
            method: classification.method,
            ignore: classification.ignore,
            ignored_reason,
            company_name: resolution.company_name,
            company_source: resolution.source,
        }
    }
}

fn ignored_reason(label: Label, personal_sender: bool) -> String {
    match label {
        Label::Noise if personal_sender => "personal sender domain".to_string(),
        Label::Noise => "newsletter or noise".to_string(),
        Label::HeadHunter => "headhunter outreach".to_string(),
        other => format!("ignored label: {other}"),
    }
}
