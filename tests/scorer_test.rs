use std::sync::{Arc, Mutex};
use std::thread;

use env_logger::{Builder, Env};
use phishshield::features::{FeatureSchema, FEATURE_NAMES};
use phishshield::scoring::{LABEL_LEGITIMATE, LABEL_PHISHING};
use phishshield::{ClassifierError, ProbabilityModel, RiskColor, ScoreError, Scorer};

fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

/// Returns a fixed distribution and records the vectors it was given.
struct FixedModel {
    distribution: Vec<f64>,
    labels: Vec<String>,
    seen: Mutex<Vec<Vec<f64>>>,
}

impl FixedModel {
    fn new(distribution: Vec<f64>, labels: &[&str]) -> Self {
        Self {
            distribution,
            labels: labels.iter().map(|s| s.to_string()).collect(),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl ProbabilityModel for FixedModel {
    fn predict_probability(&self, features: &[f64]) -> Result<Vec<f64>, ClassifierError> {
        self.seen.lock().unwrap().push(features.to_vec());
        Ok(self.distribution.clone())
    }

    fn class_labels(&self) -> &[String] {
        &self.labels
    }
}

struct FailingModel;

impl ProbabilityModel for FailingModel {
    fn predict_probability(&self, _features: &[f64]) -> Result<Vec<f64>, ClassifierError> {
        Err(ClassifierError::PredictionError("session crashed".to_string()))
    }

    fn class_labels(&self) -> &[String] {
        &[]
    }
}

fn full_schema() -> Arc<FeatureSchema> {
    Arc::new(FeatureSchema::new(FEATURE_NAMES.iter().copied()).unwrap())
}

#[test]
fn test_shortener_url_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let model = Arc::new(FixedModel::new(vec![0.2, 0.8], &["legitimate", "phishing"]));
    let scorer = Scorer::new(model.clone(), full_schema());

    let report = scorer.score("http://bit.ly/abc123")?;
    assert_eq!(report.url, "http://bit.ly/abc123");
    assert_eq!(report.phishing_score, 80);
    assert_eq!(report.legitimate_score, 20);
    assert_eq!(report.rating_color, RiskColor::Red);
    assert_eq!(report.predicted_label, LABEL_PHISHING);
    assert_eq!(report.features_used.len(), FEATURE_NAMES.len());

    let seen = model.seen.lock().unwrap();
    let vector = &seen[0];
    let position = |name: &str| FEATURE_NAMES.iter().position(|n| *n == name).unwrap();
    assert_eq!(vector[position("is_shortener")], 1.0);
    assert_eq!(vector[position("https")], 0.0);
    assert_eq!(vector[position("url_length")], 20.0);
    Ok(())
}

#[test]
fn test_vector_follows_schema_order() -> Result<(), Box<dyn std::error::Error>> {
    let model = Arc::new(FixedModel::new(vec![0.9, 0.1], &["legitimate", "phishing"]));
    let schema = Arc::new(FeatureSchema::new(vec!["has_ip", "page_rank", "url_length"])?);
    let scorer = Scorer::new(model.clone(), schema);

    let report = scorer.score("http://192.168.1.1/login?a=1&b=2")?;
    assert_eq!(report.phishing_score, 10);
    assert_eq!(report.rating_color, RiskColor::Green);
    assert_eq!(report.features_used, vec!["has_ip", "page_rank", "url_length"]);

    let seen = model.seen.lock().unwrap();
    assert_eq!(seen[0], vec![1.0, 0.0, 32.0]);
    Ok(())
}

#[test]
fn test_label_resolution_through_scorer() -> Result<(), Box<dyn std::error::Error>> {
    // Phishing column first
    let model = Arc::new(FixedModel::new(vec![0.55, 0.45], &["phishing", "legitimate"]));
    let report = Scorer::new(model, full_schema()).score("https://example.com")?;
    assert_eq!(report.phishing_score, 55);
    assert_eq!(report.predicted_label, LABEL_PHISHING);

    // Only the benign label is recognizable
    let model = Arc::new(FixedModel::new(vec![0.65, 0.35], &["benign", "other"]));
    let report = Scorer::new(model, full_schema()).score("https://example.com")?;
    assert_eq!(report.phishing_score, 35);

    // No labels: positional
    let model = Arc::new(FixedModel::new(vec![0.4, 0.6], &[]));
    let report = Scorer::new(model, full_schema()).score("https://example.com")?;
    assert_eq!(report.phishing_score, 60);
    Ok(())
}

#[test]
fn test_missing_input() {
    let model = Arc::new(FixedModel::new(vec![0.5, 0.5], &[]));
    let scorer = Scorer::new(model.clone(), full_schema());

    for input in ["", "   ", "\t\n"] {
        let err = scorer.score(input).unwrap_err();
        assert!(matches!(err, ScoreError::MissingInput));
        assert_eq!(err.to_string(), "Missing url parameter");
    }
    assert!(model.seen.lock().unwrap().is_empty());
}

#[test]
fn test_model_failure_is_reported() {
    let scorer = Scorer::new(Arc::new(FailingModel), full_schema());
    let err = scorer.score("http://example.com").unwrap_err();
    match err {
        ScoreError::ModelEvaluation(msg) => assert!(msg.contains("session crashed")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_uninterpretable_distribution() {
    let model = Arc::new(FixedModel::new(vec![0.3, 0.7], &["a", "b", "phishing"]));
    let scorer = Scorer::new(model, full_schema());
    assert!(matches!(
        scorer.score("http://example.com"),
        Err(ScoreError::ModelEvaluation(_))
    ));

    let model = Arc::new(FixedModel::new(vec![0.5, f64::NAN], &[]));
    let scorer = Scorer::new(model, full_schema());
    assert!(matches!(
        scorer.score("http://example.com"),
        Err(ScoreError::ModelEvaluation(_))
    ));
}

#[test]
fn test_report_serialization() -> Result<(), Box<dyn std::error::Error>> {
    let model = Arc::new(FixedModel::new(vec![0.6, 0.4], &["legitimate", "phishing"]));
    let scorer = Scorer::new(model, Arc::new(FeatureSchema::new(vec!["https"])?));
    let report = scorer.score("https://example.com")?;

    let json = serde_json::to_value(&report)?;
    assert_eq!(json["phishing_score"], 40);
    assert_eq!(json["legitimate_score"], 60);
    assert_eq!(json["rating_color"], "orange");
    assert_eq!(json["predicted_label"], LABEL_LEGITIMATE);
    assert_eq!(json["features_used"], serde_json::json!(["https"]));
    Ok(())
}

#[test]
fn test_concurrent_scoring() -> Result<(), Box<dyn std::error::Error>> {
    let model = Arc::new(FixedModel::new(vec![0.25, 0.75], &["legitimate", "phishing"]));
    let scorer = Arc::new(Scorer::new(model.clone(), full_schema()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let scorer = Arc::clone(&scorer);
            thread::spawn(move || scorer.score(&format!("http://host{}.example.com/login", i)))
        })
        .collect();

    for handle in handles {
        let report = handle.join().unwrap()?;
        assert_eq!(report.phishing_score, 75);
    }
    assert_eq!(model.seen.lock().unwrap().len(), 8);
    Ok(())
}
