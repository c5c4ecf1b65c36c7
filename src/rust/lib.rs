//! A thread-safe URL phishing scorer: lexical feature extraction feeding a
//! trained classifier, with the classifier output turned into a risk report.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use phishshield::{OnnxClassifier, Scorer};
//! use std::sync::Arc;
//!
//! let classifier = OnnxClassifier::builder()
//!     .with_model_file("url_phishshield.onnx")?
//!     .with_feature_schema_file("feature_names.json")?
//!     .with_class_labels(vec!["legitimate", "phishing"])
//!     .build()?;
//!
//! let schema = Arc::new(classifier.schema().clone());
//! let scorer = Scorer::new(Arc::new(classifier), schema);
//!
//! let report = scorer.score("http://bit.ly/abc123")?;
//! println!("{} ({}): {}", report.predicted_label, report.phishing_score, report.advice);
//! # Ok(())
//! # }
//! ```
//!
//! # Feature Extraction Only
//!
//! Extraction and alignment need no model:
//!
//! ```rust
//! use phishshield::features::{extract, FeatureSchema};
//!
//! let features = extract("http://192.168.1.1/login?a=1&b=2");
//! assert_eq!(features.get("has_ip"), Some(1.0));
//!
//! let schema = FeatureSchema::new(vec!["has_ip", "page_rank"]).unwrap();
//! assert_eq!(schema.align(&features), vec![1.0, 0.0]);
//! ```
//!
//! # Thread Safety
//!
//! A [`Scorer`] only holds read-only state and can be shared across threads
//! using `Arc`; no locking happens on the scoring path.

pub mod classifier;
pub mod config;
pub mod features;
pub mod model_manager;
mod runtime;
pub mod scoring;
pub mod server;

pub use classifier::{
    interpret, ClassifierBuilder, ClassifierError, ClassifierInfo, OnnxClassifier, ProbabilityModel,
};
pub use config::ServiceConfig;
pub use model_manager::{ArtifactInfo, ModelError, ModelManager};
pub use runtime::{create_session_builder, RuntimeConfig};
pub use scoring::{RiskColor, RiskTier, ScoreError, ScoreReport, Scorer};

pub fn init_logger() {
    env_logger::init();
}
