//! Recommendation knowledge document
//!
//! JSON shape: `{ disease: { crop: { region: RecommendationFields } } }`.
//! Key order of the source file is kept at every level since crop fallback
//! picks the first crop listed.

use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{info, warn};

use crate::utils::error::{CropSightError, Result};

/// Region key holding crop-wide defaults
pub const GENERAL_REGION: &str = "General";

/// One region entry. Missing fields default to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationFields {
    #[serde(default)]
    pub disease_info: String,
    #[serde(default)]
    pub preventative_cultural: Vec<String>,
    #[serde(default)]
    pub organic_low_cost: Vec<String>,
    #[serde(default)]
    pub chemical_control: Vec<String>,
}

/// String-keyed map that remembers insertion order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn first(&self) -> Option<(&str, &V)> {
        self.entries.first().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Later duplicates replace the earlier value in place, as JSON objects do
    fn insert(&mut self, key: String, value: V) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut map = OrderedMap::default();
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

pub type RegionMap = OrderedMap<RecommendationFields>;
pub type CropMap = OrderedMap<RegionMap>;

/// Disease -> crop -> region -> fields, loaded once and never mutated
#[derive(Debug, Clone, Default)]
pub struct KnowledgeDocument {
    diseases: OrderedMap<CropMap>,
    warnings: Vec<String>,
}

impl KnowledgeDocument {
    /// Load and validate a knowledge document from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CropSightError::PathNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        let doc = Self::from_json(&text)?;
        info!(
            "Loaded knowledge base from {:?}: {} diseases",
            path,
            doc.diseases.len()
        );
        Ok(doc)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let diseases: OrderedMap<CropMap> = serde_json::from_str(text)
            .map_err(|e| CropSightError::KnowledgeBase(format!("invalid knowledge document: {}", e)))?;

        let mut warnings = Vec::new();
        for (disease, crops) in diseases.iter() {
            if crops.is_empty() {
                warnings.push(format!("disease '{}' has no crop entries", disease));
            }
            for (crop, regions) in crops.iter() {
                if regions.get(GENERAL_REGION).is_none() {
                    warnings.push(format!(
                        "'{}' / '{}' has no {} entry; descriptive fields will be empty",
                        disease, crop, GENERAL_REGION
                    ));
                }
            }
        }
        for w in &warnings {
            warn!("Knowledge base: {}", w);
        }

        Ok(Self { diseases, warnings })
    }

    pub fn disease(&self, name: &str) -> Option<&CropMap> {
        self.diseases.get(name)
    }

    /// Known disease keys in document order
    pub fn diseases(&self) -> Vec<&str> {
        self.diseases.keys().collect()
    }

    /// Problems found while loading
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.diseases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diseases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_preserves_key_order() {
        let doc = KnowledgeDocument::from_json(
            r#"{"Zeta": {"Wheat": {}}, "Alpha": {"Rice": {}, "Cotton": {}}, "Mid": {}}"#,
        )
        .unwrap();
        assert_eq!(doc.diseases(), vec!["Zeta", "Alpha", "Mid"]);

        let crops: Vec<&str> = doc.disease("Alpha").unwrap().keys().collect();
        assert_eq!(crops, vec!["Rice", "Cotton"]);
    }

    #[test]
    fn test_missing_fields_default_empty() {
        let doc = KnowledgeDocument::from_json(
            r#"{"Rust": {"Wheat": {"General": {"disease_info": "Fungal"}}}}"#,
        )
        .unwrap();
        let fields = doc
            .disease("Rust")
            .and_then(|c| c.get("Wheat"))
            .and_then(|r| r.get(GENERAL_REGION))
            .unwrap();
        assert_eq!(fields.disease_info, "Fungal");
        assert!(fields.chemical_control.is_empty());
        assert!(doc.warnings().is_empty());
    }

    #[test]
    fn test_missing_general_is_a_warning() {
        let doc = KnowledgeDocument::from_json(
            r#"{"Rust": {"Wheat": {"Arid": {"chemical_control": ["x"]}}}, "Blight": {}}"#,
        )
        .unwrap();
        assert_eq!(doc.warnings().len(), 2);
        assert!(doc.warnings().iter().any(|w| w.contains("'Rust' / 'Wheat'")));
    }

    #[test]
    fn test_rejects_wrong_shape() {
        assert!(matches!(
            KnowledgeDocument::from_json(r#"["not", "a", "map"]"#),
            Err(CropSightError::KnowledgeBase(_))
        ));
        assert!(matches!(
            KnowledgeDocument::from_json(r#"{"Rust": {"Wheat": {"General": {"chemical_control": "one"}}}}"#),
            Err(CropSightError::KnowledgeBase(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"Powdery": {{"Wheat": {{"General": {{}}}}}}}}"#).unwrap();

        let doc = KnowledgeDocument::load(file.path()).unwrap();
        assert_eq!(doc.len(), 1);

        assert!(matches!(
            KnowledgeDocument::load("/definitely/not/here.json"),
            Err(CropSightError::PathNotFound(_))
        ));
    }
}
