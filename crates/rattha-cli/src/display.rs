//! Terminal summaries of heal and analysis results.

use std::collections::BTreeMap;

use arrow::util::pretty::pretty_format_batches;
use rattha_ai::CategoryReport;
use rattha_core::{HealReport, SectionRecord, Status, canonical};

use crate::pipeline::ExtractStats;

const MAX_LIST_ITEMS: usize = 10;
const PREVIEW_CONTENT_CHARS: usize = 48;

// ── Extract ──

pub fn print_extract_stats(edition: &str, stats: &ExtractStats) {
    println!("=== {edition}: extract ===");
    print_row("pages", stats.pages);
    print_row("batches", stats.batches);
    print_row("skipped (checkpointed)", stats.skipped);
    print_row("saved", stats.saved);
    if stats.empty > 0 {
        print_row("empty", stats.empty);
    }
    if stats.failed > 0 {
        print_row("failed", stats.failed);
    }
    println!();
}

// ── Heal ──

/// Print the heal report and the status breakdown of the canonical sequence.
pub fn print_heal_summary(edition: &str, report: &HealReport, sections: &[SectionRecord]) {
    println!("=== {edition}: heal ===");

    println!("Sequence");
    print_row("input records", report.input_records);
    print_row("output records", report.output_records);
    print_row("continuation merges", report.continuation_merges);
    print_row("duplicate merges", report.duplicate_merges);
    if let Some(header) = &report.embedded_header {
        print_row("split from intro", header);
    }
    println!();

    println!("Gaps");
    print_row("initially missing", report.initial_missing);
    if !report.repairs.is_empty() {
        let repairs: Vec<String> = report
            .repairs
            .iter()
            .map(|r| format!("{} -> {}", r.from, r.to))
            .collect();
        print_list("repairs", &repairs);
    }
    if !report.still_missing.is_empty() {
        let missing: Vec<String> = report.still_missing.iter().map(u64::to_string).collect();
        print_list("still missing", &missing);
    }
    if !report.header_collisions.is_empty() {
        print_list("header collisions", &report.header_collisions);
    }
    println!();

    println!("Status");
    for (status, count) in status_counts(sections) {
        print_row(status.as_str(), count);
    }
    println!();
}

/// Tabular preview of the first `limit` canonical records.
pub fn print_preview(sections: &[SectionRecord], limit: usize) -> anyhow::Result<()> {
    if limit == 0 || sections.is_empty() {
        return Ok(());
    }
    let shown: Vec<SectionRecord> = sections
        .iter()
        .take(limit)
        .map(|r| {
            let mut r = r.clone();
            r.content = truncate(&r.content, PREVIEW_CONTENT_CHARS);
            r.legacy_reference = None;
            r
        })
        .collect();
    let batch = canonical::to_record_batch(&shown)?;
    println!("{}", pretty_format_batches(&[batch])?);
    if sections.len() > limit {
        println!("  ... and {} more", sections.len() - limit);
    }
    println!();
    Ok(())
}

// ── Analyze ──

pub fn print_report(edition: &str, report: &[CategoryReport]) {
    println!("=== {edition}: categories ===");
    for entry in report {
        println!(
            "  {:<20} {:>4}  {}",
            entry.category_id.id(),
            entry.section_count,
            entry.category_name
        );
        println!("  {:<20}       {}", "", entry.ai_summary);
    }
    println!();
}

// ── Helpers ──

fn status_counts(sections: &[SectionRecord]) -> BTreeMap<Status, usize> {
    let mut counts = BTreeMap::new();
    for record in sections.iter().filter(|r| !r.is_header()) {
        *counts.entry(record.status).or_insert(0) += 1;
    }
    counts
}

fn print_row(label: &str, value: impl std::fmt::Display) {
    println!("  {label:<26} {value}");
}

fn print_list(label: &str, items: &[String]) {
    let shown: Vec<&str> = items.iter().take(MAX_LIST_ITEMS).map(String::as_str).collect();
    let more = items.len().saturating_sub(MAX_LIST_ITEMS);
    if more > 0 {
        println!("  {label:<26} {} (+{more} more)", shown.join(", "));
    } else {
        println!("  {label:<26} {}", shown.join(", "));
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
