mod builder;
mod classifier;
mod error;
pub mod interpreter;
mod probability;

pub use builder::ClassifierBuilder;
pub use classifier::OnnxClassifier;
pub use error::ClassifierError;
pub use interpreter::{interpret, resolve_phishing_index, Resolution, ResolutionRule};
pub use probability::ProbabilityModel;

/// Information about the current state and configuration of a classifier
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file
    pub model_path: String,
    /// Number of features the model consumes
    pub num_features: usize,
    /// Feature names in the order the model expects them
    pub feature_names: Vec<String>,
    /// Number of known class labels (0 when unknown)
    pub num_classes: usize,
    /// Labels of the classes, in output order
    pub class_labels: Vec<String>,
    /// Name of the model output holding class probabilities
    pub probability_output: String,
}
