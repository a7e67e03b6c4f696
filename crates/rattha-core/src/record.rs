//! Section records: the unit that flows from extraction through healing to analysis.

use serde::{Deserialize, Deserializer, Serialize};

/// Sentinel id owned by the single canonical intro record.
pub const INTRO_ID: &str = "intro";

/// Prefix shared by every synthetic header id.
pub const HEADER_PREFIX: &str = "header_";

/// Prefix of headers positioned after a given section (`header_after_<n>`).
pub const HEADER_AFTER_PREFIX: &str = "header_after_";

/// What a record represents in the document stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    #[default]
    Section,
    Intro,
    Header,
}

impl RecordKind {
    /// Derive the kind from an id string alone.
    ///
    /// `"intro"` (any case) and the empty id are intro-shaped; anything carrying the
    /// `header_` prefix is a header; everything else is a section.
    pub fn from_id(id: &str) -> Self {
        let id = id.trim();
        if id.is_empty() || id.eq_ignore_ascii_case(INTRO_ID) {
            Self::Intro
        } else if id.starts_with(HEADER_PREFIX) {
            Self::Header
        } else {
            Self::Section
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::Intro => "intro",
            Self::Header => "header",
        }
    }
}

/// Lifecycle tag of a record.
///
/// `Ocr` is the extraction-time default; the healer assigns one of the other three
/// once legacy reconciliation has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Ocr,
    OcrOnly,
    Verified,
    ReviewNeeded,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ocr => "OCR",
            Self::OcrOnly => "OCR_ONLY",
            Self::Verified => "VERIFIED",
            Self::ReviewNeeded => "REVIEW_NEEDED",
        }
    }
}

/// Both wordings of a disputed section, kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyReference {
    pub ocr: String,
    pub legacy: String,
}

/// One section, intro, or header record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRecord {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_content")]
    pub content: String,
    #[serde(default, rename = "type")]
    pub kind: RecordKind,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_reference: Option<LegacyReference>,
}

impl SectionRecord {
    /// Build a freshly extracted record; the kind is derived from the id.
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            kind: RecordKind::from_id(&id),
            id,
            content: content.into(),
            status: Status::Ocr,
            similarity: None,
            legacy_reference: None,
        }
    }

    /// A synthetic header sorting immediately before section `n`.
    pub fn header(n: u64, content: impl Into<String>) -> Self {
        Self::new(format!("{HEADER_PREFIX}{n}"), content)
    }

    /// A synthetic header sorting immediately after section `n`.
    pub fn header_after(n: u64, content: impl Into<String>) -> Self {
        Self::new(format!("{HEADER_AFTER_PREFIX}{n}"), content)
    }

    pub fn is_header(&self) -> bool {
        self.kind == RecordKind::Header || self.id.starts_with(HEADER_PREFIX)
    }

    pub fn is_intro(&self) -> bool {
        self.kind == RecordKind::Intro || RecordKind::from_id(&self.id) == RecordKind::Intro
    }

    /// Append continuation text, space-joined. Empty sides contribute no separator.
    pub fn append_content(&mut self, more: &str) {
        if more.is_empty() {
            return;
        }
        if !self.content.is_empty() {
            self.content.push(' ');
        }
        self.content.push_str(more);
    }
}

/// Accept string, integer, or float ids; the model often emits `"id": 12`.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<IdRepr>::deserialize(deserializer)? {
        Some(IdRepr::Str(s)) => s.trim().to_string(),
        Some(IdRepr::Int(n)) => n.to_string(),
        Some(IdRepr::Float(f)) if f.fract() == 0.0 => format!("{}", f as i64),
        Some(IdRepr::Float(f)) => f.to_string(),
        None => String::new(),
    })
}

fn deserialize_content<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
