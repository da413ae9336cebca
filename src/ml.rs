use serde::Deserialize;
use std::collections::HashMap;

use crate::label::Label;

/// Serialized one-vs-rest linear text model. Produced by an external
/// training pipeline; this crate only consumes it.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    pub labels: Vec<String>,
    pub vocabulary: HashMap<String, usize>,
    /// One weight row per label, indexed by vocabulary position.
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl ModelArtifact {
    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.labels.is_empty(), "model has no labels");
        anyhow::ensure!(
            self.weights.len() == self.labels.len(),
            "weight rows ({}) do not match labels ({})",
            self.weights.len(),
            self.labels.len()
        );
        anyhow::ensure!(
            self.bias.len() == self.labels.len(),
            "bias terms ({}) do not match labels ({})",
            self.bias.len(),
            self.labels.len()
        );
        let n_features = self.vocabulary.len();
        anyhow::ensure!(
            self.weights.iter().all(|row| row.len() == n_features),
            "weight row length does not match vocabulary size {n_features}"
        );
        anyhow::ensure!(
            self.vocabulary.values().all(|&idx| idx < n_features),
            "vocabulary index exceeds feature count {n_features}"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MlPrediction {
    pub label: Label,
    pub confidence: f64,
}

impl MlPrediction {
    /// The degraded-mode sentinel: lets the arbiter fall back to
    /// rules-only operation without a special code path.
    pub fn sentinel() -> Self {
        MlPrediction {
            label: Label::Unknown,
            confidence: 0.0,
        }
    }
}

/// Adapter over the trained scorer. Construction never fails: a missing
/// or corrupt artifact yields a disabled adapter whose predictions are
/// the zero-confidence sentinel.
pub struct MlClassifier {
    model: Option<ModelArtifact>,
}

impl MlClassifier {
    pub fn disabled() -> Self {
        MlClassifier { model: None }
    }

    pub fn from_artifact(artifact: ModelArtifact) -> anyhow::Result<Self> {
        artifact.validate()?;
        Ok(MlClassifier {
            model: Some(artifact),
        })
    }

    pub fn load(path: &str) -> Self {
        match Self::try_load(path) {
            Ok(classifier) => {
                log::info!("loaded text classifier model from {path}");
                classifier
            }
            Err(e) => {
                log::warn!("model load from {path} failed, running rules-only: {e}");
                MlClassifier::disabled()
            }
        }
    }

    fn try_load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let artifact: ModelArtifact = serde_json::from_str(&content)?;
        Self::from_artifact(artifact)
    }

    pub fn is_enabled(&self) -> bool {
        self.model.is_some()
    }

    pub fn predict(&self, subject: &str, body: &str) -> MlPrediction {
        let Some(model) = &self.model else {
            return MlPrediction::sentinel();
        };

        let text = format!("{subject} {body}");
        let mut term_counts: HashMap<usize, f64> = HashMap::new();
        for token in tokenize(&text) {
            if let Some(&idx) = model.vocabulary.get(token.as_str()) {
                *term_counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let scores: Vec<f64> = model
            .weights
            .iter()
            .zip(&model.bias)
            .map(|(row, bias)| {
                bias + term_counts
                    .iter()
                    .map(|(&idx, &tf)| row[idx] * tf)
                    .sum::<f64>()
            })
            .collect();

        let (best, confidence) = softmax_argmax(&scores);
        let label = Label::parse(&model.labels[best]);
        log::debug!("model predicted {label} ({confidence:.3})");
        MlPrediction { label, confidence }
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(|t| t.to_string())
        .collect()
}

/// Index of the highest score and its softmax probability.
fn softmax_argmax(scores: &[f64]) -> (usize, f64) {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    let (best, _) = scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .unwrap_or((0, &0.0));
    (best, exps[best] / total.max(f64::MIN_POSITIVE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_model() -> ModelArtifact {
        // Two features, two labels: "opportunity" votes head_hunter,
        // "application" votes job_application.
        let vocabulary = [("opportunity", 0usize), ("application", 1usize)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        ModelArtifact {
            labels: vec!["head_hunter".to_string(), "job_application".to_string()],
            vocabulary,
            weights: vec![vec![2.0, -1.0], vec![-1.0, 2.0]],
            bias: vec![0.0, 0.0],
        }
    }

    #[test]
    fn test_disabled_adapter_returns_sentinel() {
        let clf = MlClassifier::disabled();
        let pred = clf.predict("Subject", "Body");
        assert_eq!(pred, MlPrediction::sentinel());
        assert_eq!(pred.label, Label::Unknown);
        assert_eq!(pred.confidence, 0.0);
    }

    #[test]
    fn test_load_missing_artifact_degrades() {
        let clf = MlClassifier::load("/nonexistent/model.json");
        assert!(!clf.is_enabled());
        assert_eq!(clf.predict("a", "b"), MlPrediction::sentinel());
    }

    #[test]
    fn test_toy_model_prediction() {
        let clf = MlClassifier::from_artifact(toy_model()).unwrap();

        let pred = clf.predict("An exciting opportunity for you", "great opportunity");
        assert_eq!(pred.label, Label::HeadHunter);
        assert!(pred.confidence > 0.9);

        let pred = clf.predict("Your application", "application received");
        assert_eq!(pred.label, Label::JobApplication);
        assert!(pred.confidence > 0.9);
    }

    #[test]
    fn test_unseen_tokens_split_confidence() {
        let clf = MlClassifier::from_artifact(toy_model()).unwrap();
        let pred = clf.predict("Lunch plans", "see you there");
        // No vocabulary hits: scores tie at the bias, softmax splits evenly.
        assert!((pred.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_artifact_validation_rejects_mismatched_shapes() {
        let mut artifact = toy_model();
        artifact.bias.pop();
        assert!(MlClassifier::from_artifact(artifact).is_err());

        let mut artifact = toy_model();
        artifact.weights[0].pop();
        assert!(MlClassifier::from_artifact(artifact).is_err());
    }

    #[test]
    fn test_artifact_validation_rejects_out_of_range_vocabulary_index() {
        // A parseable artifact can still point a token past the weight
        // rows; it must be rejected at load, not crash in predict.
        let mut artifact = toy_model();
        artifact.vocabulary.insert("boom".to_string(), 5);
        artifact.weights = vec![vec![2.0, -1.0, 0.0], vec![-1.0, 2.0, 0.0]];
        assert!(MlClassifier::from_artifact(artifact).is_err());
    }
}
