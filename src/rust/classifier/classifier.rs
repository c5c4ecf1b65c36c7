use std::collections::HashMap;
use std::sync::Arc;

use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;

use super::error::ClassifierError;
use super::probability::ProbabilityModel;
use crate::features::FeatureSchema;

/// A thread-safe URL classifier backed by an ONNX model exported from a
/// scikit-learn style pipeline.
///
/// # Thread Safety
///
/// This type is automatically `Send + Sync` because all of its fields are thread-safe:
/// - `String`, `usize` and `Vec<String>` are `Send + Sync`
/// - `Arc<T>` provides thread-safe shared ownership of the session and schema
///
/// ```rust,no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use phishshield::{OnnxClassifier, ProbabilityModel};
///
/// let classifier = OnnxClassifier::builder()
///     .with_model_file("artifacts/model.onnx")?
///     .with_feature_schema_file("artifacts/feature_names.json")?
///     .with_class_labels_file("artifacts/labels.json")?
///     .build()?;
///
/// let distribution = classifier.predict_probability(&vec![0.0; classifier.num_features()])?;
/// println!("{:?} over {:?}", distribution, classifier.class_labels());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OnnxClassifier {
    pub model_path: String,
    pub session: Arc<Session>,
    pub schema: Arc<FeatureSchema>,
    pub class_labels: Vec<String>,
    pub input_name: String,
    /// Position of the probability tensor among the model outputs
    pub probability_output: usize,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<OnnxClassifier>();
    }
};

impl OnnxClassifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            num_features: self.schema.len(),
            feature_names: self.schema.names().to_vec(),
            num_classes: self.class_labels.len(),
            class_labels: self.class_labels.clone(),
            probability_output: self
                .session
                .outputs
                .get(self.probability_output)
                .map(|o| o.name.clone())
                .unwrap_or_default(),
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn num_features(&self) -> usize {
        self.schema.len()
    }
}

impl ProbabilityModel for OnnxClassifier {
    /// Runs the model on a single feature row.
    ///
    /// # Model Input Format
    /// - float32 tensor of shape [1, num_features]
    ///
    /// # Model Output Format
    /// - float32 probability tensor of shape [1, num_classes] (or [num_classes])
    ///
    /// # Errors
    /// - `PredictionError` if the vector length does not match the schema
    /// - `PredictionError` if tensor creation, model execution or output
    ///   extraction fails
    fn predict_probability(&self, features: &[f64]) -> Result<Vec<f64>, ClassifierError> {
        if features.len() != self.schema.len() {
            return Err(ClassifierError::PredictionError(format!(
                "Expected {} features, got {}",
                self.schema.len(),
                features.len()
            )));
        }

        let input_array = Array2::from_shape_vec(
            (1, features.len()),
            features.iter().map(|&x| x as f32).collect(),
        )
        .map_err(|e| ClassifierError::PredictionError(format!("Failed to create input array: {}", e)))?;

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(input_array).map_err(|e| {
                ClassifierError::PredictionError(format!("Failed to create input tensor: {}", e))
            })?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| ClassifierError::PredictionError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[self.probability_output]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                ClassifierError::PredictionError(format!("Failed to extract probabilities: {}", e))
            })?;

        first_row(output_tensor.shape(), output_tensor.iter().copied())
    }

    fn class_labels(&self) -> &[String] {
        &self.class_labels
    }
}

/// Row 0 of a probability tensor of shape `[n]` or `[rows, n]`, as f64.
fn first_row(shape: &[usize], values: impl Iterator<Item = f32>) -> Result<Vec<f64>, ClassifierError> {
    let row_len = match shape {
        [n] => *n,
        [rows, n] if *rows >= 1 => *n,
        _ => {
            return Err(ClassifierError::PredictionError(format!(
                "Unexpected probability tensor shape {:?}",
                shape
            )))
        }
    };

    Ok(values.take(row_len).map(f64::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_row_flat_output() {
        let row = first_row(&[3], [0.25f32, 0.5, 0.25].into_iter()).unwrap();
        assert_eq!(row, vec![0.25, 0.5, 0.25]);
    }

    #[test]
    fn test_first_row_batched_output() {
        let row = first_row(&[1, 2], [0.75f32, 0.25].into_iter()).unwrap();
        assert_eq!(row, vec![0.75, 0.25]);

        // Only the first row is returned
        let row = first_row(&[2, 2], [0.5f32, 0.5, 0.125, 0.875].into_iter()).unwrap();
        assert_eq!(row, vec![0.5, 0.5]);
    }

    #[test]
    fn test_first_row_rejects_bad_shapes() {
        assert!(matches!(
            first_row(&[0, 2], std::iter::empty()),
            Err(ClassifierError::PredictionError(_))
        ));
        assert!(matches!(
            first_row(&[1, 1, 2], [0.5f32, 0.5].into_iter()),
            Err(ClassifierError::PredictionError(_))
        ));
        assert!(matches!(
            first_row(&[], std::iter::empty()),
            Err(ClassifierError::PredictionError(_))
        ));
    }
}
