//! Pest label -> crop family
//!
//! Case-insensitive substring rules checked in order; the first rule with a
//! matching keyword wins. Keywords overlap across crops ("stem borer" pests
//! exist on rice too), so the order below is part of the behavior.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Crop family a pest label belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CategoryTag {
    Rice,
    Wheat,
    Cotton,
    Sugarcane,
    Unknown,
}

impl CategoryTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryTag::Rice => "Rice",
            CategoryTag::Wheat => "Wheat",
            CategoryTag::Cotton => "Cotton",
            CategoryTag::Sugarcane => "Sugarcane",
            CategoryTag::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for CategoryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered (category, keywords) rules
pub const CATEGORY_RULES: [(CategoryTag, &[&str]); 4] = [
    (
        CategoryTag::Rice,
        &[
            "rice",
            "paddy",
            "asiatic",
            "brown plant",
            "small brown",
            "white backed",
            "yellow rice",
        ],
    ),
    (CategoryTag::Wheat, &["wheat", "sawfly"]),
    (CategoryTag::Cotton, &["bollworm", "stem borer", "whitefly"]),
    (CategoryTag::Sugarcane, &["thrips"]),
];

/// Crops that have at least one rule, in rule order
pub fn supported_crops() -> Vec<&'static str> {
    CATEGORY_RULES.iter().map(|(tag, _)| tag.as_str()).collect()
}

/// Map a label to its crop family; `Unknown` when no rule matches
pub fn categorize(label: &str) -> CategoryTag {
    let lower = label.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(tag, _)| *tag)
        .unwrap_or(CategoryTag::Unknown)
}

/// Labels grouped by category, categories in rule order
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryPartition {
    groups: Vec<(CategoryTag, Vec<String>)>,
}

impl CategoryPartition {
    pub fn get(&self, tag: CategoryTag) -> &[String] {
        self.groups
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, labels)| labels.as_slice())
            .unwrap_or(&[])
    }
}

/// Group `labels` by [`categorize`]. Every ruled crop is present even when
/// empty; `Unknown` appears only if some label matched nothing.
pub fn partition<'a, I>(labels: I) -> CategoryPartition
where
    I: IntoIterator<Item = &'a str>,
{
    let mut groups: Vec<(CategoryTag, Vec<String>)> = CATEGORY_RULES
        .iter()
        .map(|(tag, _)| (*tag, Vec::new()))
        .collect();
    let mut unknown = Vec::new();

    for label in labels {
        match categorize(label) {
            CategoryTag::Unknown => unknown.push(label.to_string()),
            tag => {
                if let Some((_, group)) = groups.iter_mut().find(|(t, _)| *t == tag) {
                    group.push(label.to_string());
                }
            }
        }
    }

    if !unknown.is_empty() {
        groups.push((CategoryTag::Unknown, unknown));
    }
    CategoryPartition { groups }
}

impl Serialize for CategoryPartition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (tag, labels) in &self.groups {
            map.serialize_entry(tag.as_str(), labels)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        assert_eq!(categorize("Rice_Stem_Borer"), CategoryTag::Rice);
        assert_eq!(categorize("Cotton_Bollworm"), CategoryTag::Cotton);
        assert_eq!(categorize("wheat sawfly"), CategoryTag::Wheat);
        assert_eq!(categorize("Thrips"), CategoryTag::Sugarcane);
        assert_eq!(categorize("Brown Plant Hopper"), CategoryTag::Rice);
    }

    #[test]
    fn test_unknown_label() {
        assert_eq!(categorize("Locust"), CategoryTag::Unknown);
        assert_eq!(categorize(""), CategoryTag::Unknown);
    }

    #[test]
    fn test_rule_order_resolves_overlap() {
        // matches both the rice and cotton keyword sets
        assert_eq!(categorize("yellow rice stem borer"), CategoryTag::Rice);
        assert_eq!(categorize("pink stem borer"), CategoryTag::Cotton);
    }

    #[test]
    fn test_partition_keeps_order_and_buckets() {
        let labels = ["rice leaf roller", "wheat blossom midge", "whitefly", "aphids"];
        let parts = partition(labels.iter().copied());

        assert_eq!(parts.get(CategoryTag::Rice), &["rice leaf roller".to_string()]);
        assert_eq!(parts.get(CategoryTag::Cotton), &["whitefly".to_string()]);
        assert!(parts.get(CategoryTag::Sugarcane).is_empty());
        assert_eq!(parts.get(CategoryTag::Unknown), &["aphids".to_string()]);

        let json = serde_json::to_value(&parts).unwrap();
        assert_eq!(json["Wheat"][0], "wheat blossom midge");
        assert!(json["Sugarcane"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_partition_omits_empty_unknown() {
        let parts = partition(["thrips"].iter().copied());
        let json = serde_json::to_value(&parts).unwrap();
        assert!(json.get("Unknown").is_none());
        assert_eq!(supported_crops(), vec!["Rice", "Wheat", "Cotton", "Sugarcane"]);
    }
}
