use super::error::ClassifierError;

/// A trained classifier that maps a positional feature vector to a
/// probability distribution over its classes.
///
/// Implementations are shared read-only across request handlers, so they
/// must be `Send + Sync` and must not mutate state in `predict_probability`.
///
/// ```rust
/// use phishshield::{ClassifierError, ProbabilityModel};
///
/// struct Constant(Vec<String>);
///
/// impl ProbabilityModel for Constant {
///     fn predict_probability(&self, _features: &[f64]) -> Result<Vec<f64>, ClassifierError> {
///         Ok(vec![0.25, 0.75])
///     }
///
///     fn class_labels(&self) -> &[String] {
///         &self.0
///     }
/// }
///
/// let model = Constant(vec!["legitimate".into(), "phishing".into()]);
/// assert_eq!(model.predict_probability(&[0.0]).unwrap()[1], 0.75);
/// ```
pub trait ProbabilityModel: Send + Sync {
    /// Returns one probability per class, in the classifier's class order.
    ///
    /// # Errors
    /// - `PredictionError` if the input has the wrong length or the model
    ///   cannot be evaluated
    fn predict_probability(&self, features: &[f64]) -> Result<Vec<f64>, ClassifierError>;

    /// Class identifiers parallel to the predicted distribution.
    ///
    /// Empty when the class vocabulary is unknown.
    fn class_labels(&self) -> &[String];
}
