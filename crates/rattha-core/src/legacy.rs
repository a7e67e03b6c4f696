//! Read-only legacy transcription of one constitution edition.

use std::collections::HashMap;

use serde::Deserialize;

use crate::record::deserialize_id;

/// Section id → trusted legacy text, scoped to a single edition.
///
/// Built once at pipeline start and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct LegacyMap {
    sections: HashMap<String, String>,
}

/// One edition in the legacy reference collection.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyEdition {
    pub id: String,
    #[serde(default)]
    pub sections: Vec<LegacySection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacySection {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub content: String,
}

impl LegacyMap {
    /// Select `edition_id` from a parsed collection; an absent edition yields an empty map.
    pub fn from_editions(editions: Vec<LegacyEdition>, edition_id: &str) -> Self {
        editions
            .into_iter()
            .find(|e| e.id == edition_id)
            .map(|e| e.sections.into_iter().map(|s| (s.id, s.content)).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.sections.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl FromIterator<(String, String)> for LegacyMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            sections: iter.into_iter().collect(),
        }
    }
}
