use serde::ser::{Serialize, SerializeMap, Serializer};

/// Named feature values in extraction order.
///
/// Lookups are linear; with ~20 entries that is faster than hashing and keeps
/// the order stable for display and serialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMap {
    entries: Vec<(&'static str, f64)>,
}

impl FeatureMap {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Sets `name` to `value`, replacing an earlier value in place.
    pub fn insert(&mut self, name: &'static str, value: f64) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|&(n, _)| n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FeatureMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order_and_replaces() {
        let mut map = FeatureMap::new();
        map.insert("b", 1.0);
        map.insert("a", 2.0);
        map.insert("b", 3.0);
        assert_eq!(map.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(map.get("b"), Some(3.0));
        assert_eq!(map.get("missing"), None);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_serializes_as_ordered_object() {
        let mut map = FeatureMap::new();
        map.insert("z", 1.0);
        map.insert("a", 0.5);
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"z":1.0,"a":0.5}"#);
    }
}
