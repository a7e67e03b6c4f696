//! Reconciliation of OCR wording against the legacy transcription.
//!
//! Two stages use two different thresholds and must not be unified:
//!
//! - batch stage ([`reconcile_batch`]): above [`SUBSTITUTE_THRESHOLD`] the legacy wording
//!   replaces the OCR wording outright;
//! - healing stage ([`apply_legacy`]): above [`VERIFY_THRESHOLD`] the OCR wording is
//!   accepted as final and marked verified.

use tracing::debug;

use crate::legacy::LegacyMap;
use crate::numerals::normalize_numerals;
use crate::record::{LegacyReference, SectionRecord, Status};
use crate::similarity::similarity;

/// Healing stage: strictly above this, OCR wording is `VERIFIED`.
pub const VERIFY_THRESHOLD: f64 = 0.85;

/// Batch stage: strictly above this, legacy wording is substituted.
pub const SUBSTITUTE_THRESHOLD: f64 = 0.80;

/// Healing-stage status for a computed similarity.
pub fn verify_status(similarity: f64) -> Status {
    if similarity > VERIFY_THRESHOLD {
        Status::Verified
    } else {
        Status::ReviewNeeded
    }
}

/// Healing phase E: numeral-normalise content and assign final status.
///
/// Runs once per fully merged record. Records without a legacy counterpart become
/// `OCR_ONLY` with no similarity.
pub fn apply_legacy(records: &mut [SectionRecord], legacy: Option<&LegacyMap>) {
    for record in records.iter_mut() {
        record.content = normalize_numerals(&record.content);

        match legacy.and_then(|map| map.get(&record.id)) {
            Some(legacy_text) => {
                let score = similarity(&record.content, legacy_text);
                record.status = verify_status(score);
                record.similarity = Some(score);
                record.legacy_reference = Some(LegacyReference {
                    ocr: record.content.clone(),
                    legacy: legacy_text.to_string(),
                });
                debug!(id = %record.id, similarity = score, status = record.status.as_str(), "reconciled");
            }
            None => {
                record.status = Status::OcrOnly;
                record.similarity = None;
                record.legacy_reference = None;
            }
        }
    }
}

/// Batch stage: reconcile freshly extracted records and substitute legacy wording
/// where it is close enough to trust outright.
pub fn reconcile_batch(records: Vec<SectionRecord>, legacy: &LegacyMap) -> Vec<SectionRecord> {
    records
        .into_iter()
        .map(|mut record| {
            let key = normalize_numerals(record.id.trim());
            let Some(legacy_text) = legacy.get(&key) else {
                record.status = Status::OcrOnly;
                return record;
            };

            let score = similarity(&record.content, legacy_text);
            record.legacy_reference = Some(LegacyReference {
                ocr: record.content.clone(),
                legacy: legacy_text.to_string(),
            });
            record.similarity = Some(score);
            if score > SUBSTITUTE_THRESHOLD {
                record.content = legacy_text.to_string();
                record.status = Status::Verified;
            } else {
                record.status = Status::ReviewNeeded;
            }
            record
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy(pairs: &[(&str, &str)]) -> LegacyMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn threshold_is_strict() {
        assert_eq!(verify_status(0.85), Status::ReviewNeeded);
        assert_eq!(verify_status(0.8500001), Status::Verified);
        assert_eq!(verify_status(1.0), Status::Verified);
        assert_eq!(verify_status(0.0), Status::ReviewNeeded);
    }

    #[test]
    fn thresholds_stay_distinct() {
        assert!(SUBSTITUTE_THRESHOLD < VERIFY_THRESHOLD);
    }

    #[test]
    fn verified_and_ocr_only() {
        let map = legacy(&[("1", "ทดสอบ")]);
        let mut records = vec![SectionRecord::new("1", "ทดสอบ"), SectionRecord::new("2", "ผิด")];
        apply_legacy(&mut records, Some(&map));

        assert_eq!(records[0].status, Status::Verified);
        assert_eq!(records[0].similarity, Some(1.0));
        let reference = records[0].legacy_reference.as_ref().unwrap();
        assert_eq!(reference.ocr, "ทดสอบ");
        assert_eq!(reference.legacy, "ทดสอบ");

        assert_eq!(records[1].status, Status::OcrOnly);
        assert!(records[1].similarity.is_none());
        assert!(records[1].legacy_reference.is_none());
    }

    #[test]
    fn review_needed_below_threshold() {
        let map = legacy(&[("3", "abcdefghij")]);
        let mut records = vec![SectionRecord::new("3", "abcdeXXXXX")];
        apply_legacy(&mut records, Some(&map));
        assert_eq!(records[0].status, Status::ReviewNeeded);
        assert_eq!(records[0].similarity, Some(0.5));
    }

    #[test]
    fn content_numerals_normalised_before_scoring() {
        let map = legacy(&[("4", "มาตรา 12")]);
        let mut records = vec![SectionRecord::new("4", "มาตรา ๑๒")];
        apply_legacy(&mut records, Some(&map));
        assert_eq!(records[0].content, "มาตรา 12");
        assert_eq!(records[0].similarity, Some(1.0));
    }

    #[test]
    fn no_legacy_map() {
        let mut records = vec![SectionRecord::new("1", "x")];
        apply_legacy(&mut records, None);
        assert_eq!(records[0].status, Status::OcrOnly);
    }

    #[test]
    fn batch_stage_substitutes_legacy_wording() {
        // 9 of 10 chars shared: 0.9 > 0.80
        let map = legacy(&[("1", "abcdefghij"), ("2", "abcdefghij")]);
        let records = vec![
            SectionRecord::new("1", "abcdefghiX"),
            SectionRecord::new("2", "abcdeXXXXX"),
            SectionRecord::new("3", "new"),
        ];
        let out = reconcile_batch(records, &map);

        assert_eq!(out[0].status, Status::Verified);
        assert_eq!(out[0].content, "abcdefghij");
        assert_eq!(out[0].legacy_reference.as_ref().unwrap().ocr, "abcdefghiX");

        assert_eq!(out[1].status, Status::ReviewNeeded);
        assert_eq!(out[1].content, "abcdeXXXXX");

        assert_eq!(out[2].status, Status::OcrOnly);
        assert!(out[2].similarity.is_none());
    }

    #[test]
    fn batch_lookup_normalises_thai_digit_ids() {
        let map = legacy(&[("2", "ทดสอบ")]);
        let records = reconcile_batch(vec![SectionRecord::new(" ๒ ", "ทดสอบ")], &map);

        assert_eq!(records[0].status, Status::Verified);
        assert_eq!(records[0].similarity, Some(1.0));
        assert_eq!(records[0].id, " ๒ ");
    }

    #[test]
    fn stages_disagree_between_thresholds() {
        // 0.825: substituted at batch stage, but would need review at healing stage.
        let legacy_text = "abcdefghijklmnopqrstuvwxyzabcdefghijklmn"; // 40 chars
        let ocr_text = "abcdefghijklmnopqrstuvwxyzabcdefgXXXXXXX"; // 33 shared
        let score = similarity(ocr_text, legacy_text);
        assert!(score > SUBSTITUTE_THRESHOLD && score <= VERIFY_THRESHOLD, "got {score}");
        assert_eq!(verify_status(score), Status::ReviewNeeded);

        let out = reconcile_batch(
            vec![SectionRecord::new("9", ocr_text)],
            &legacy(&[("9", legacy_text)]),
        );
        assert_eq!(out[0].status, Status::Verified);
    }
}
