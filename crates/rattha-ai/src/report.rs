//! Final per-category report of one edition.

use std::collections::BTreeMap;

use rattha_core::{Category, SectionRecord};
use serde::{Deserialize, Serialize};

use crate::grouping::CategoryGroups;
use crate::summary::CategorySummary;

pub const NO_SUMMARY: &str = "ไม่มีการสรุป";
pub const NO_KEY_CHANGE: &str = "-";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub constitution_year: u32,
    pub category_id: Category,
    pub category_name: String,
    pub ai_summary: String,
    pub key_change: String,
    pub section_count: usize,
    pub sections: Vec<SectionRecord>,
}

/// One entry per non-empty category, in fixed category order.
pub fn build_report(
    year: u32,
    mut groups: CategoryGroups,
    summaries: &BTreeMap<Category, CategorySummary>,
) -> Vec<CategoryReport> {
    Category::ALL
        .into_iter()
        .filter_map(|category| {
            let sections = groups.remove(&category).filter(|s| !s.is_empty())?;
            let summary = summaries.get(&category);
            Some(CategoryReport {
                constitution_year: year,
                category_id: category,
                category_name: category.thai_name().to_string(),
                ai_summary: summary
                    .and_then(|s| s.summary.clone())
                    .unwrap_or_else(|| NO_SUMMARY.to_string()),
                key_change: summary
                    .and_then(|s| s.key_change.clone())
                    .unwrap_or_else(|| NO_KEY_CHANGE.to_string()),
                section_count: sections.len(),
                sections,
            })
        })
        .collect()
}
