//! Reduced projection of the canonical sequence for publishing.

use serde::{Deserialize, Serialize};

use crate::numerals::normalize_numerals;
use crate::record::{SectionRecord, Status};

/// A published section: id, chosen wording, and reconciliation confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalSection {
    pub id: String,
    pub content: String,
    pub confidence: f64,
}

/// Project healed records into published sections.
///
/// The OCR wording is kept (for disputed sections, the OCR side of the audit pair).
/// Headers are layout markers and are dropped; canonical order is preserved.
pub fn finalize(records: &[SectionRecord]) -> Vec<FinalSection> {
    records
        .iter()
        .filter(|r| !r.is_header())
        .map(|r| {
            let content = match (r.status, &r.legacy_reference) {
                (Status::ReviewNeeded, Some(reference)) => reference.ocr.as_str(),
                _ => r.content.as_str(),
            };
            FinalSection {
                id: normalize_numerals(&r.id),
                content: normalize_numerals(content),
                confidence: r.similarity.unwrap_or(0.0),
            }
        })
        .collect()
}
