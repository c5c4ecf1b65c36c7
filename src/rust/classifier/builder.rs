use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{error, info, warn};
use ort::session::Session;
use ort::value::ValueType;

use super::classifier::OnnxClassifier;
use super::error::ClassifierError;
use crate::features::FeatureSchema;
use crate::model_manager::ModelManager;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// Output names `skl2onnx` gives the class probability tensor.
const PROBABILITY_OUTPUT_NAMES: &[&str] = &["probabilities", "output_probability"];

/// A builder for constructing an OnnxClassifier with a fluent interface.
#[derive(Default, Debug)]
pub struct ClassifierBuilder {
    model_path: Option<String>,
    session: Option<Session>,
    schema: Option<FeatureSchema>,
    class_labels: Vec<String>,
    runtime_config: RuntimeConfig,
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use phishshield::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            model_path: None,
            session: None,
            schema: None,
            class_labels: Vec::new(),
            runtime_config: RuntimeConfig::default(),
        }
    }

    /// Sets the runtime configuration for ONNX model execution.
    ///
    /// Must be called before [`with_model_file`](Self::with_model_file), which
    /// creates the session.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Loads the ONNX model the classifier will run
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or an error if:
    ///   - The path is empty or a model is already set
    ///   - The file doesn't exist
    ///   - The model failed to load
    ///   - The model has no inputs or no outputs
    pub fn with_model_file<P: AsRef<Path>>(mut self, model_path: P) -> Result<Self, ClassifierError> {
        let model_path = model_path.as_ref();
        if model_path.as_os_str().is_empty() {
            return Err(ClassifierError::BuildError("Model path cannot be empty".to_string()));
        }
        if self.model_path.is_some() {
            return Err(ClassifierError::BuildError("Model path already set".to_string()));
        }
        if !model_path.exists() {
            return Err(ClassifierError::BuildError(format!(
                "Model file not found: {}",
                model_path.display()
            )));
        }

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(model_path)
            .map_err(|e| {
                error!("Failed to load model {}: {}", model_path.display(), e);
                ClassifierError::ModelError(format!("Failed to load model: {}", e))
            })?;

        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.session = Some(session);
        Ok(self)
    }

    /// Loads the model, schema and (if present) labels of a downloaded
    /// artifact set
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or an error if:
    ///   - The artifacts are not downloaded
    ///   - Any of the files fails to load
    ///
    /// # Example
    /// ```no_run
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use phishshield::{ClassifierBuilder, ModelManager};
    ///
    /// let manager = ModelManager::new_default()?;
    /// let classifier = ClassifierBuilder::new()
    ///     .with_artifacts(&manager, "url-phishshield")?
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_artifacts(self, manager: &ModelManager, name: &str) -> Result<Self, ClassifierError> {
        let paths = manager.downloaded_paths(name).map_err(|e| {
            ClassifierError::BuildError(format!(
                "{}. Please download it first using ModelManager::download_model()",
                e
            ))
        })?;

        let builder = self
            .with_model_file(&paths.model)?
            .with_feature_schema_file(&paths.schema)?;
        if paths.labels.exists() {
            builder.with_class_labels_file(&paths.labels)
        } else {
            Ok(builder)
        }
    }

    /// Sets the feature schema the model was trained on
    pub fn with_feature_schema(mut self, schema: FeatureSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Loads the feature schema from a JSON array of names
    pub fn with_feature_schema_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ClassifierError> {
        let schema = FeatureSchema::from_file(path)?;
        Ok(self.with_feature_schema(schema))
    }

    /// Sets the class labels, in the model's output order
    ///
    /// # Example
    /// ```
    /// use phishshield::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new()
    ///     .with_class_labels(vec!["legitimate", "phishing"]);
    /// ```
    pub fn with_class_labels(mut self, labels: Vec<impl Into<String>>) -> Self {
        self.class_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Loads class labels from a JSON array.
    ///
    /// Label encoders may store classes as numbers or booleans; every entry is
    /// converted to its string form.
    pub fn with_class_labels_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ClassifierError> {
        let labels = load_class_labels(path.as_ref())?;
        Ok(self.with_class_labels(labels))
    }

    /// Builds and returns the final OnnxClassifier instance
    ///
    /// # Returns
    /// * `Result<OnnxClassifier, ClassifierError>` - The constructed classifier if successful, or an error if:
    ///   - No model has been loaded
    ///   - No feature schema has been set
    ///   - The model's input width disagrees with the schema
    pub fn build(mut self) -> Result<OnnxClassifier, ClassifierError> {
        let session = self
            .session
            .take()
            .ok_or_else(|| ClassifierError::BuildError("No ONNX model loaded".into()))?;
        let schema = self
            .schema
            .take()
            .ok_or_else(|| ClassifierError::BuildError("Feature schema must be set".into()))?;
        let model_path = self
            .model_path
            .take()
            .ok_or_else(|| ClassifierError::BuildError("Model path must be set".into()))?;

        let input = &session.inputs[0];
        if let Some(width) = fixed_last_dimension(&input.input_type) {
            if width != schema.len() {
                return Err(ClassifierError::BuildError(format!(
                    "Model input '{}' expects {} features but the schema lists {}",
                    input.name,
                    width,
                    schema.len()
                )));
            }
        }
        let input_name = input.name.clone();

        let probability_output = Self::find_probability_output(&session);
        info!(
            "Using output '{}' as class probabilities",
            session.outputs[probability_output].name
        );

        if let Some(width) = fixed_last_dimension(&session.outputs[probability_output].output_type) {
            if !self.class_labels.is_empty() && width != self.class_labels.len() {
                warn!(
                    "Model produces {} probabilities but {} class labels were given",
                    width,
                    self.class_labels.len()
                );
            }
        }
        if self.class_labels.is_empty() {
            info!("No class labels supplied; phishing column will be chosen by position");
        }

        Ok(OnnxClassifier {
            model_path,
            session: Arc::new(session),
            schema: Arc::new(schema),
            class_labels: self.class_labels,
            input_name,
            probability_output,
        })
    }

    /// Picks the probability output by its conventional name, else the last
    /// output (label outputs come first in converted classifiers).
    fn find_probability_output(session: &Session) -> usize {
        session
            .outputs
            .iter()
            .position(|o| PROBABILITY_OUTPUT_NAMES.contains(&o.name.as_str()))
            .unwrap_or(session.outputs.len() - 1)
    }

    /// Validates that the model has the expected input/output structure
    ///
    /// # Returns
    /// * `Result<(), ClassifierError>` - Ok if validation passes, or an error if:
    ///   - The model doesn't have an input tensor
    ///   - The model doesn't have any output tensors
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        if session.inputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 input for the feature vector".to_string(),
            ));
        }
        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for class probabilities".to_string(),
            ));
        }
        Ok(())
    }
}

/// The last dimension of a tensor type, if it is statically known.
fn fixed_last_dimension(value_type: &ValueType) -> Option<usize> {
    match value_type {
        ValueType::Tensor { dimensions, .. } => dimensions
            .last()
            .copied()
            .filter(|&d| d > 0)
            .map(|d| d as usize),
        _ => None,
    }
}

fn load_class_labels(path: &Path) -> Result<Vec<String>, ClassifierError> {
    let content = fs::read_to_string(path).map_err(|e| {
        ClassifierError::SchemaError(format!("Failed to read class labels {:?}: {}", path, e))
    })?;
    let labels = parse_class_labels(&content)?;
    info!("Loaded {} class labels from {:?}", labels.len(), path);
    Ok(labels)
}

fn parse_class_labels(json: &str) -> Result<Vec<String>, ClassifierError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(json).map_err(|e| {
        ClassifierError::SchemaError(format!("Class labels must be a JSON array: {}", e))
    })?;
    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| match value {
            serde_json::Value::String(s) => Ok(s),
            serde_json::Value::Number(n) => Ok(n.to_string()),
            serde_json::Value::Bool(b) => Ok(if b { "True" } else { "False" }.to_string()),
            other => Err(ClassifierError::SchemaError(format!(
                "Class label {} has unsupported type: {}",
                i + 1,
                other
            ))),
        })
        .collect()
}
