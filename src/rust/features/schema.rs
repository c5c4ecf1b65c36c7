use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::map::FeatureMap;
use crate::classifier::ClassifierError;

/// The ordered feature names a trained classifier expects as input.
///
/// Immutable once loaded: its order must match the column order the model
/// was trained on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Builds a schema, rejecting an empty list and duplicate names.
    pub fn new<I, S>(names: I) -> Result<Self, ClassifierError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(ClassifierError::SchemaError(
                "Feature schema cannot be empty".into(),
            ));
        }
        let mut seen = HashSet::with_capacity(names.len());
        if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(ClassifierError::SchemaError(format!(
                "Duplicate feature name in schema: {}",
                dup
            )));
        }
        Ok(Self { names })
    }

    /// Loads a schema from a JSON array of feature names.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ClassifierError::SchemaError(format!(
                "Failed to read feature schema {:?}: {}",
                path, e
            ))
        })?;
        let schema = Self::from_json(&content)?;
        info!("Loaded feature schema with {} names from {:?}", schema.len(), path);
        Ok(schema)
    }

    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        let names: Vec<String> = serde_json::from_str(json).map_err(|e| {
            ClassifierError::SchemaError(format!("Feature schema must be a JSON array of names: {}", e))
        })?;
        Self::new(names)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Lays out `features` in schema order. See [`align`].
    pub fn align(&self, features: &FeatureMap) -> Vec<f64> {
        align(features, &self.names)
    }
}

impl TryFrom<Vec<String>> for FeatureSchema {
    type Error = ClassifierError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<FeatureSchema> for Vec<String> {
    fn from(schema: FeatureSchema) -> Self {
        schema.names
    }
}

/// Produces one value per schema name, in schema order.
///
/// Names the extractor did not produce become 0. Extracted features the
/// schema does not list are ignored.
pub fn align(features: &FeatureMap, schema: &[String]) -> Vec<f64> {
    schema
        .iter()
        .map(|name| match features.get(name) {
            Some(value) => value,
            None => {
                debug!("Feature '{}' not produced by extractor, using 0", name);
                0.0
            }
        })
        .collect()
}
