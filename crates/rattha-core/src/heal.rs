//! Sequence healing: turn the concatenated batch output into one canonical sequence.
//!
//! Batch output arrives in batch-emission order, which only loosely follows document
//! order. OCR misreads section numbers, splits sections across pages, and glues chapter
//! titles onto the intro. Healing runs five phases over one owned working list:
//!
//! 1. **Gap detection**: resolve every section id and compute the missing set
//!    `{min..=max} − resolved`. Only ids in this set may be used for repairs.
//! 2. **Repair walk**: a single forward pass that merges intro continuations, splits
//!    an embedded chapter header off the first intro, and retargets a section whose id
//!    is greater than its successor's to `successor − 1` when that id is missing.
//! 3. **Merge**: records sharing an id are concatenated in encounter order.
//! 4. **Ordering**: stable sort by [`order_key`].
//! 5. **Reconciliation**: status and similarity against the legacy map.
//!
//! The walk is order-dependent and must stay single-threaded.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ident::resolve_id;
use crate::legacy::LegacyMap;
use crate::numerals::normalize_numerals;
use crate::reconcile::apply_legacy;
use crate::record::{INTRO_ID, RecordKind, SectionRecord, Status};
use crate::sort_key::order_key;

/// A chapter marker ("หมวด" + number) and everything after it, up to end of content.
static EMBEDDED_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)(หมวด\s*[๐-๙0-9]+.*)$").expect("valid header regex"));

/// Output of one healing pass.
#[derive(Debug, Clone)]
pub struct Healed {
    pub sections: Vec<SectionRecord>,
    pub report: HealReport,
}

/// What the healer changed, for logging and review.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HealReport {
    pub input_records: usize,
    pub output_records: usize,
    /// Size of the missing set computed in gap detection.
    pub initial_missing: u64,
    pub repairs: Vec<Repair>,
    /// First few ids still missing after the walk.
    pub still_missing: Vec<u64>,
    pub continuation_merges: usize,
    pub duplicate_merges: usize,
    pub header_collisions: Vec<String>,
    pub embedded_header: Option<String>,
}

/// One id retarget applied during the repair walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repair {
    pub from: String,
    pub to: String,
}

/// Ids absent from the resolved range `{min..=max}`.
///
/// Membership is computed arithmetically, so a single wildly misread id does not
/// materialise a huge set. Ids consumed by a repair are never offered again.
#[derive(Debug, Clone, Default)]
pub struct MissingIds {
    range: Option<(u64, u64)>,
    present: BTreeSet<u64>,
    consumed: BTreeSet<u64>,
}

impl MissingIds {
    pub fn from_resolved(ids: impl IntoIterator<Item = u64>) -> Self {
        let present: BTreeSet<u64> = ids.into_iter().collect();
        let range = present.first().copied().zip(present.last().copied());
        Self {
            range,
            present,
            consumed: BTreeSet::new(),
        }
    }

    pub fn contains(&self, id: u64) -> bool {
        match self.range {
            Some((min, max)) => {
                (min..=max).contains(&id)
                    && !self.present.contains(&id)
                    && !self.consumed.contains(&id)
            }
            None => false,
        }
    }

    /// Consume `id`; returns false if it was not available.
    pub fn take(&mut self, id: u64) -> bool {
        if self.contains(id) {
            self.consumed.insert(id);
            true
        } else {
            false
        }
    }

    /// Number of ids still available.
    pub fn len(&self) -> u64 {
        match self.range {
            // `present` holds at least min and max whenever the range is set.
            Some((min, max)) => {
                (max - min) - (self.present.len() as u64 - 1) - self.consumed.len() as u64
            }
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Available ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        let (min, max) = self.range.unwrap_or((1, 0));
        (min..=max).filter(move |id| self.contains(*id))
    }
}

/// Run a full healing pass.
///
/// Never fails: unresolvable ids are kept as-is and sort last; empty content survives.
pub fn heal(raw: Vec<SectionRecord>, legacy: Option<&LegacyMap>) -> Healed {
    let mut report = HealReport {
        input_records: raw.len(),
        ..Default::default()
    };

    let raw: Vec<SectionRecord> = raw.into_iter().map(classify).collect();

    // Phase A
    let identities: Vec<Option<u64>> = raw.iter().map(section_identity).collect();
    let mut missing = MissingIds::from_resolved(identities.iter().flatten().copied());
    report.initial_missing = missing.len();
    info!(
        records = raw.len(),
        missing = missing.len(),
        first_missing = ?missing.iter().take(20).collect::<Vec<_>>(),
        "gap detection complete"
    );

    // Phase B
    let walked = repair_walk(raw, &identities, &mut missing, &mut report);
    report.still_missing = missing.iter().take(50).collect();

    // Phase C
    let mut sections = merge_duplicates(walked, &mut report);

    // Phase D
    sections.sort_by_key(|record| order_key(&record.id));

    // Phase E
    apply_legacy(&mut sections, legacy);

    report.output_records = sections.len();
    info!(
        output = report.output_records,
        repairs = report.repairs.len(),
        duplicates = report.duplicate_merges,
        continuations = report.continuation_merges,
        "healing complete"
    );

    Healed { sections, report }
}

/// Normalise the id and pin the kind before any phase looks at the record.
fn classify(mut record: SectionRecord) -> SectionRecord {
    record.id = normalize_numerals(record.id.trim());
    if record.kind != RecordKind::Header {
        record.kind = RecordKind::from_id(&record.id);
    }
    record
}

/// Numeric identity of a record that takes part in gap logic. Headers and intros never do.
fn section_identity(record: &SectionRecord) -> Option<u64> {
    match record.kind {
        RecordKind::Section => resolve_id(&record.id),
        RecordKind::Intro | RecordKind::Header => None,
    }
}

fn repair_walk(
    raw: Vec<SectionRecord>,
    identities: &[Option<u64>],
    missing: &mut MissingIds,
    report: &mut HealReport,
) -> Vec<SectionRecord> {
    let mut out: Vec<SectionRecord> = Vec::with_capacity(raw.len() + 1);
    let mut intro_seen = false;

    for (i, mut record) in raw.into_iter().enumerate() {
        if record.kind == RecordKind::Intro {
            if intro_seen && let Some(last) = out.last_mut() {
                debug!(into = %last.id, "merging intro continuation");
                last.append_content(&record.content);
                report.continuation_merges += 1;
                continue;
            }

            record.id = INTRO_ID.to_string();
            let header = split_embedded_header(&mut record);
            out.push(record);
            if let Some(header) = header {
                info!(id = %header.id, "split chapter header from intro");
                report.embedded_header = Some(header.id.clone());
                out.push(header);
            }
            intro_seen = true;
            continue;
        }

        if let (Some(current), Some(Some(next))) = (identities[i], identities.get(i + 1))
            && current > *next
            && let Some(candidate) = next.checked_sub(1)
            && missing.take(candidate)
        {
            let to = candidate.to_string();
            info!(from = %record.id, to = %to, "repairing section id");
            report.repairs.push(Repair {
                from: std::mem::replace(&mut record.id, to.clone()),
                to,
            });
        }

        out.push(record);
    }

    out
}

/// Split a trailing "หมวด N ..." off the intro content into a synthetic header.
fn split_embedded_header(intro: &mut SectionRecord) -> Option<SectionRecord> {
    let start = EMBEDDED_HEADER.captures(&intro.content)?.get(1)?.start();

    let header_text = intro.content[start..].trim().to_string();
    let number = resolve_id(&header_text).unwrap_or(1);
    intro.content = intro.content[..start].trim().to_string();

    let mut header = SectionRecord::header(number, header_text);
    header.status = Status::Ocr;
    Some(header)
}

/// Collapse records sharing an id, keeping first-encounter position.
///
/// Section and intro content is space-joined in encounter order. A repeated header id
/// is a data-quality problem: the later header replaces the earlier one and the
/// collision is reported instead of merging prose into header text.
fn merge_duplicates(records: Vec<SectionRecord>, report: &mut HealReport) -> Vec<SectionRecord> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(records.len());
    let mut merged: Vec<SectionRecord> = Vec::with_capacity(records.len());

    for record in records {
        match index.get(&record.id) {
            Some(&pos) if merged[pos].is_header() || record.is_header() => {
                warn!(id = %record.id, "duplicate header id, keeping the later header");
                report.header_collisions.push(record.id.clone());
                merged[pos] = record;
            }
            Some(&pos) => {
                debug!(id = %record.id, "merging duplicate section");
                merged[pos].append_content(&record.content);
                report.duplicate_merges += 1;
            }
            None => {
                index.insert(record.id.clone(), merged.len());
                merged.push(record);
            }
        }
    }

    merged
}
