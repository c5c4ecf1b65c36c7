use log::debug;

use super::error::ClassifierError;

/// Labels naming the risky class, in priority order.
pub const POSITIVE_LABELS: &[&str] = &["phishing", "malicious", "phish", "fraud", "bad"];

/// Labels naming the benign class of a binary classifier, in priority order.
pub const COMPLEMENT_LABELS: &[&str] = &["legitimate", "benign", "good", "safe"];

/// One step of the phishing-column resolution cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionRule {
    /// A class label names the risky class directly
    PositiveLabel(&'static [&'static str]),
    /// A binary classifier names its benign class; the other column is risky
    ComplementLabel(&'static [&'static str]),
    /// No usable labels: the second column if there is one, else the first
    Positional,
}

/// The resolution cascade, tried in order. The first rule that matches wins.
pub const RESOLUTION_RULES: &[ResolutionRule] = &[
    ResolutionRule::PositiveLabel(POSITIVE_LABELS),
    ResolutionRule::ComplementLabel(COMPLEMENT_LABELS),
    ResolutionRule::Positional,
];

/// Which column holds the phishing probability, and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub index: usize,
    pub rule: ResolutionRule,
}

impl ResolutionRule {
    /// Applies this rule to lower-cased `labels`.
    fn apply(&self, labels: &[String], distribution_len: usize) -> Option<usize> {
        match self {
            Self::PositiveLabel(candidates) => first_match(labels, candidates),
            // Only meaningful for exactly two classes; otherwise fall through.
            Self::ComplementLabel(candidates) if labels.len() == 2 => {
                first_match(labels, candidates).map(|i| 1 - i)
            }
            Self::ComplementLabel(_) => None,
            Self::Positional => Some(if distribution_len > 1 { 1 } else { 0 }),
        }
    }
}

/// Position of the first label equal to the highest-priority candidate present.
fn first_match(labels: &[String], candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|candidate| labels.iter().position(|label| label == candidate))
}

/// Determines which output column of a classifier is the phishing class.
///
/// `classes` may be empty when the class vocabulary is unknown.
pub fn resolve_phishing_index<S: AsRef<str>>(classes: &[S], distribution_len: usize) -> Resolution {
    let lowered: Vec<String> = classes.iter().map(|c| c.as_ref().to_lowercase()).collect();
    RESOLUTION_RULES
        .iter()
        .find_map(|rule| {
            rule.apply(&lowered, distribution_len)
                .map(|index| Resolution { index, rule: *rule })
        })
        .unwrap_or(Resolution {
            index: 0,
            rule: ResolutionRule::Positional,
        })
}

/// Extracts the phishing probability from a classifier's output distribution.
///
/// `distribution` is parallel to `classes` whenever `classes` is non-empty.
///
/// # Errors
/// - `PredictionError` if the distribution is empty, the resolved column does
///   not exist, or the probability is not a finite number
pub fn interpret<S: AsRef<str>>(distribution: &[f64], classes: &[S]) -> Result<f64, ClassifierError> {
    if distribution.is_empty() {
        return Err(ClassifierError::PredictionError(
            "Classifier returned an empty distribution".into(),
        ));
    }

    let resolution = resolve_phishing_index(classes, distribution.len());
    debug!(
        "Phishing column resolved to index {} via {:?}",
        resolution.index, resolution.rule
    );

    let probability = *distribution.get(resolution.index).ok_or_else(|| {
        ClassifierError::PredictionError(format!(
            "Phishing class index {} out of range for distribution of length {}",
            resolution.index,
            distribution.len()
        ))
    })?;

    if !probability.is_finite() {
        return Err(ClassifierError::PredictionError(format!(
            "Classifier returned a non-finite probability: {}",
            probability
        )));
    }

    Ok(probability)
}
