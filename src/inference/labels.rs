//! Class label sets, index-aligned to a model's output vector

use std::collections::HashSet;

use serde::Serialize;

use crate::utils::error::{CropSightError, Result};

/// Ordered, unique class labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClassLabelSet(Vec<String>);

impl ClassLabelSet {
    /// Validate and wrap a label list. Labels must be non-empty and unique.
    pub fn new(labels: Vec<String>) -> Result<Self> {
        if labels.is_empty() {
            return Err(CropSightError::Config("class label list is empty".to_string()));
        }

        let mut seen = HashSet::with_capacity(labels.len());
        for label in &labels {
            if label.trim().is_empty() {
                return Err(CropSightError::Config("class label list contains a blank label".to_string()));
            }
            if !seen.insert(label.as_str()) {
                return Err(CropSightError::Config(format!("duplicate class label '{}'", label)));
            }
        }

        Ok(Self(labels))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_accepts_unique_labels() {
        let set = ClassLabelSet::new(labels(&["Healthy", "Powdery", "Rust"])).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(2), Some("Rust"));
        assert_eq!(set.get(3), None);
    }

    #[test]
    fn test_rejects_duplicates_and_blanks() {
        assert!(ClassLabelSet::new(labels(&["Rust", "Rust"])).is_err());
        assert!(ClassLabelSet::new(labels(&["Rust", " "])).is_err());
        assert!(ClassLabelSet::new(Vec::new()).is_err());
    }
}
