//! Grouping of the canonical sequence into categories.

use std::collections::BTreeMap;

use rattha_core::{Category, SectionRecord};
use tracing::debug;

/// Non-header records per category, in canonical order within each category.
pub type CategoryGroups = BTreeMap<Category, Vec<SectionRecord>>;

/// Distinct header texts in order of first appearance.
pub fn header_texts(records: &[SectionRecord]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for record in records.iter().filter(|r| r.is_header()) {
        if !out.contains(&record.content) {
            out.push(record.content.clone());
        }
    }
    out
}

/// Walk the sequence: a header switches the current category to its mapped value
/// (`general` when unmapped) and is not grouped itself; an intro resets to `general`;
/// every other record joins the current category.
pub fn group_by_headers(
    records: &[SectionRecord],
    header_map: &BTreeMap<String, Category>,
) -> CategoryGroups {
    let mut groups = CategoryGroups::new();
    let mut current = Category::DEFAULT;
    for record in records {
        if record.is_header() {
            current = header_map
                .get(&record.content)
                .copied()
                .unwrap_or(Category::DEFAULT);
            debug!(header = %record.content, category = %current, "header switches category");
            continue;
        }
        if record.is_intro() {
            current = Category::DEFAULT;
        }
        groups.entry(current).or_default().push(record.clone());
    }
    groups
}

/// Category per section id, `general` when unmapped. Headers are skipped.
pub fn group_by_section_map(
    records: &[SectionRecord],
    section_map: &BTreeMap<String, Category>,
) -> CategoryGroups {
    let mut groups = CategoryGroups::new();
    for record in records.iter().filter(|r| !r.is_header()) {
        let category = section_map
            .get(&record.id)
            .copied()
            .unwrap_or(Category::DEFAULT);
        groups.entry(category).or_default().push(record.clone());
    }
    groups
}

/// `[ม.<id>] <content>` lines per category, the input of the summary stage.
pub fn summary_lines(groups: &CategoryGroups) -> BTreeMap<Category, Vec<String>> {
    groups
        .iter()
        .map(|(category, records)| {
            let lines = records
                .iter()
                .map(|r| format!("[ม.{}] {}", r.id, r.content))
                .collect();
            (*category, lines)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(groups: &CategoryGroups, category: Category) -> Vec<&str> {
        groups
            .get(&category)
            .map(|v| v.iter().map(|r| r.id.as_str()).collect())
            .unwrap_or_default()
    }

    fn sequence() -> Vec<SectionRecord> {
        vec![
            SectionRecord::new("intro", "คำปรารภ"),
            SectionRecord::header(1, "หมวด ๑ บททั่วไป"),
            SectionRecord::new("1", "ราชอาณาจักร"),
            SectionRecord::header(2, "หมวด ๒ พระมหากษัตริย์"),
            SectionRecord::new("2", "พระมหากษัตริย์"),
            SectionRecord::new("3", "องคมนตรี"),
            SectionRecord::header(3, "หมวด ๓ ที่ไม่รู้จัก"),
            SectionRecord::new("4", "อื่น ๆ"),
        ]
    }

    #[test]
    fn headers_switch_category() {
        let header_map = BTreeMap::from([
            ("หมวด ๑ บททั่วไป".to_string(), Category::General),
            ("หมวด ๒ พระมหากษัตริย์".to_string(), Category::Monarchy),
        ]);
        let groups = group_by_headers(&sequence(), &header_map);

        assert_eq!(ids(&groups, Category::General), vec!["intro", "1", "4"]);
        assert_eq!(ids(&groups, Category::Monarchy), vec!["2", "3"]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn intro_resets_to_general() {
        let header_map = BTreeMap::from([("หมวด ๕".to_string(), Category::Judicial)]);
        let records = vec![
            SectionRecord::header(5, "หมวด ๕"),
            SectionRecord::new("30", "ศาล"),
            SectionRecord::new("intro", "ต่อ"),
            SectionRecord::new("31", "ศาล"),
        ];
        let groups = group_by_headers(&records, &header_map);
        assert_eq!(ids(&groups, Category::Judicial), vec!["30"]);
        assert_eq!(ids(&groups, Category::General), vec!["intro", "31"]);
    }

    #[test]
    fn per_section_mapping() {
        let section_map = BTreeMap::from([("2".to_string(), Category::Monarchy)]);
        let groups = group_by_section_map(&sequence(), &section_map);
        assert_eq!(ids(&groups, Category::Monarchy), vec!["2"]);
        assert_eq!(ids(&groups, Category::General), vec!["intro", "1", "3", "4"]);
    }

    #[test]
    fn unique_header_texts() {
        let mut records = sequence();
        records.push(SectionRecord::header_after(4, "หมวด ๑ บททั่วไป"));
        let headers = header_texts(&records);
        assert_eq!(headers.len(), 3);
        assert_eq!(headers[0], "หมวด ๑ บททั่วไป");
    }

    #[test]
    fn summary_line_format() {
        let groups = CategoryGroups::from([(
            Category::Monarchy,
            vec![SectionRecord::new("2", "พระมหากษัตริย์")],
        )]);
        let lines = summary_lines(&groups);
        assert_eq!(lines[&Category::Monarchy], vec!["[ม.2] พระมหากษัตริย์"]);
    }
}
