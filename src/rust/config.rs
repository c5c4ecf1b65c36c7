//! Service configuration

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::classifier::{ClassifierError, OnnxClassifier};
use crate::runtime::RuntimeConfig;

pub const DEFAULT_MODEL_FILE: &str = "url_phishshield.onnx";
pub const DEFAULT_FEATURES_FILE: &str = "feature_names.json";
pub const DEFAULT_LABELS_FILE: &str = "label_encoder.json";
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Where the scoring artifacts live and where to listen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// ONNX model file
    pub model_path: PathBuf,

    /// JSON array of feature names, in model input order
    pub features_path: PathBuf,

    /// Optional JSON array of class labels; a missing file means unknown classes
    pub labels_path: PathBuf,

    /// Address the HTTP service binds to
    pub bind_addr: SocketAddr,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_FILE),
            features_path: PathBuf::from(DEFAULT_FEATURES_FILE),
            labels_path: PathBuf::from(DEFAULT_LABELS_FILE),
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

impl ServiceConfig {
    /// Load configuration from environment variables, reading `.env` first
    /// when present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads the classifier described by this configuration.
    ///
    /// The labels file is optional: when it does not exist the classifier is
    /// built without class labels.
    pub fn build_classifier(&self, runtime: RuntimeConfig) -> Result<OnnxClassifier, ClassifierError> {
        let builder = OnnxClassifier::builder()
            .with_runtime_config(runtime)
            .with_model_file(&self.model_path)?
            .with_feature_schema_file(&self.features_path)?;

        let builder = if self.labels_path.exists() {
            builder.with_class_labels_file(&self.labels_path)?
        } else {
            log::info!("No class labels at {:?}", self.labels_path);
            builder
        };

        builder.build()
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let defaults = Self::default();
        Self {
            model_path: lookup("PHISH_MODEL")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),

            features_path: lookup("PHISH_FEATURES")
                .map(PathBuf::from)
                .unwrap_or(defaults.features_path),

            labels_path: lookup("PHISH_LABELS")
                .map(PathBuf::from)
                .unwrap_or(defaults.labels_path),

            bind_addr: match lookup("PHISH_BIND") {
                Some(raw) => raw.parse().unwrap_or_else(|e| {
                    log::warn!("Ignoring invalid PHISH_BIND '{}': {}", raw, e);
                    defaults.bind_addr
                }),
                None => defaults.bind_addr,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND);
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("PHISH_MODEL", "/srv/model.onnx"),
            ("PHISH_FEATURES", "/srv/features.json"),
            ("PHISH_LABELS", "/srv/labels.json"),
            ("PHISH_BIND", "0.0.0.0:9000"),
        ]));
        assert_eq!(config.model_path, PathBuf::from("/srv/model.onnx"));
        assert_eq!(config.features_path, PathBuf::from("/srv/features.json"));
        assert_eq!(config.labels_path, PathBuf::from("/srv/labels.json"));
        assert_eq!(config.bind_addr.port(), 9000);
    }

    #[test]
    fn test_invalid_bind_falls_back() {
        let config = ServiceConfig::from_lookup(lookup_from(&[("PHISH_BIND", "not-an-address")]));
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND);
    }
}
