//! Turns a URL into a risk report: features, classifier call, phishing
//! column resolution and risk tier.

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;

use crate::classifier::{interpret, ClassifierError, ProbabilityModel};
use crate::features::{FeatureExtractor, FeatureMap, FeatureSchema, FEATURE_NAMES};

/// Display bucket for a phishing score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskColor {
    Green,
    Orange,
    Red,
}

impl RiskColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Orange => "orange",
            Self::Red => "red",
        }
    }
}

impl fmt::Display for RiskColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const LABEL_PHISHING: &str = "phishing";
pub const LABEL_LEGITIMATE: &str = "legitimate";

const ADVICE_HIGH_RISK: &str = "High risk. Do not enter credentials or download anything.";
const ADVICE_RISKY: &str = "Risky. Proceed only if you fully trust the sender/site.";
const ADVICE_UNCLEAR: &str = "Unclear. Double-check the URL, sender, and HTTPS certificate.";
const ADVICE_LIKELY_SAFE: &str = "Likely safe but be cautious with sensitive info.";
const ADVICE_LOOKS_SAFE: &str = "Looks safe. Stay alert for unusual requests.";

/// Everything derived from a phishing score for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskTier {
    /// `round(100 * P(phishing))`, ties to even
    pub phishing_score: i64,
    pub legitimate_score: i64,
    pub color: RiskColor,
    pub label: &'static str,
    pub advice: &'static str,
}

impl RiskTier {
    pub fn from_probability(probability: f64) -> Self {
        Self::from_score((probability * 100.0).round_ties_even() as i64)
    }

    pub fn from_score(pct: i64) -> Self {
        let color = if pct >= 70 {
            RiskColor::Red
        } else if pct >= 30 {
            RiskColor::Orange
        } else {
            RiskColor::Green
        };
        let label = if pct >= 50 { LABEL_PHISHING } else { LABEL_LEGITIMATE };
        let advice = match pct {
            p if p >= 90 => ADVICE_HIGH_RISK,
            p if p >= 70 => ADVICE_RISKY,
            p if p >= 50 => ADVICE_UNCLEAR,
            p if p >= 30 => ADVICE_LIKELY_SAFE,
            _ => ADVICE_LOOKS_SAFE,
        };
        Self {
            phishing_score: pct,
            legitimate_score: (100 - pct).max(0),
            color,
            label,
            advice,
        }
    }
}

/// The response payload for one scored URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub url: String,
    pub predicted_label: String,
    pub phishing_score: i64,
    pub legitimate_score: i64,
    pub rating_color: RiskColor,
    pub advice: String,
    pub features_used: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    #[error("Missing url parameter")]
    MissingInput,
    #[error("Model error: {0}")]
    ModelEvaluation(String),
}

impl From<ClassifierError> for ScoreError {
    fn from(err: ClassifierError) -> Self {
        ScoreError::ModelEvaluation(err.to_string())
    }
}

/// Scores URLs against a loaded classifier.
///
/// Holds only read-only state, so one instance can be shared across threads
/// behind an `Arc` without locking.
pub struct Scorer {
    extractor: FeatureExtractor,
    schema: Arc<FeatureSchema>,
    model: Arc<dyn ProbabilityModel>,
}

impl fmt::Debug for Scorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scorer")
            .field("extractor", &self.extractor)
            .field("schema", &self.schema)
            .field("class_labels", &self.model.class_labels())
            .finish()
    }
}

impl Scorer {
    pub fn new(model: Arc<dyn ProbabilityModel>, schema: Arc<FeatureSchema>) -> Self {
        Self::with_extractor(model, schema, FeatureExtractor::default())
    }

    pub fn with_extractor(
        model: Arc<dyn ProbabilityModel>,
        schema: Arc<FeatureSchema>,
        extractor: FeatureExtractor,
    ) -> Self {
        let unknown: Vec<&str> = schema
            .names()
            .iter()
            .map(String::as_str)
            .filter(|name| !FEATURE_NAMES.contains(name))
            .collect();
        if !unknown.is_empty() {
            warn!("Schema names the extractor never produces will be 0: {:?}", unknown);
        }
        Self {
            extractor,
            schema,
            model,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn class_labels(&self) -> &[String] {
        self.model.class_labels()
    }

    /// Extracts features only; no classifier call.
    pub fn features(&self, url: &str) -> FeatureMap {
        self.extractor.extract(url)
    }

    /// Probability that `url` is phishing, in [0, 1].
    ///
    /// # Errors
    /// - `MissingInput` if `url` is empty after trimming
    /// - `ModelEvaluation` if the classifier fails or its output cannot be
    ///   interpreted
    pub fn phishing_probability(&self, url: &str) -> Result<f64, ScoreError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ScoreError::MissingInput);
        }

        let features = self.extractor.extract(url);
        let vector = self.schema.align(&features);
        let distribution = self.model.predict_probability(&vector).map_err(|e| {
            warn!("Classifier failed for {}: {}", url, e);
            ScoreError::from(e)
        })?;
        let probability = interpret(&distribution, self.model.class_labels())?;
        debug!("{} -> distribution {:?}, phishing {:.4}", url, distribution, probability);
        Ok(probability)
    }

    /// Scores `url` and builds the full report.
    pub fn score(&self, url: &str) -> Result<ScoreReport, ScoreError> {
        let probability = self.phishing_probability(url)?;
        let tier = RiskTier::from_probability(probability);
        Ok(ScoreReport {
            url: url.trim().to_string(),
            predicted_label: tier.label.to_string(),
            phishing_score: tier.phishing_score,
            legitimate_score: tier.legitimate_score,
            rating_color: tier.color,
            advice: tier.advice.to_string(),
            features_used: self.schema.names().to_vec(),
        })
    }
}
