pub mod arbiter;
pub mod company;
pub mod domain;
pub mod headers;
pub mod label;
pub mod message;
pub mod ml;
pub mod patterns;
pub mod pipeline;
pub mod rules;
pub mod settings;
pub mod store;

pub use label::Label;
pub use message::{ClassificationResult, CompanyResolution, IngestionRecord, RawMessage};
pub use ml::MlClassifier;
pub use patterns::PatternsFile;
pub use pipeline::Pipeline;
pub use settings::Settings;
pub use store::PatternStore;
