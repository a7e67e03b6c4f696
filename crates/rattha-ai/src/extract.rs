//! Page batch → raw section records.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use rattha_core::SectionRecord;
use rattha_core::record::deserialize_id;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::client::{GenerateRequest, InlineImage, LlmClient};
use crate::json::parse_json_array;
use crate::{AiError, RetryPolicy};

const EXTRACT_PROMPT: &str = r#"Role: Thai Legal Document Parser.
Task: Extract ALL legal sections (มาตรา) from the attached constitution page images, in reading order.

Instructions:
1. Each section starts with "มาตรา" followed by its number. Use that number as "id".
2. Convert Thai numerals (๑, ๒) in section ids to Arabic numbers (1, 2).
3. Merge text broken across lines or pages. Fix common OCR errors (vowels, broken words).
   Ignore page numbers, running headers and footers.
4. Text that precedes the first section on the first page (a preamble, or the tail of a
   section from an earlier page) goes in a record with id "intro".
5. A chapter heading (หมวด) is its own record with id "header_<chapter number>".
6. Output strictly as a JSON array.

Output format:
[
    { "id": "1", "content": "full text..." },
    { "id": "2", "content": "full text..." }
]"#;

/// Turns one batch of page images into raw `{id, content}` records in reading order.
///
/// Implementations are stateless per call; resumability is the caller's concern.
#[async_trait]
pub trait BatchExtractor: Send + Sync {
    async fn extract(&self, pages: &[PathBuf]) -> Result<Vec<SectionRecord>, AiError>;
}

/// Extractor backed by a multimodal model: one request per batch with every page inline.
pub struct LlmBatchExtractor {
    client: Arc<dyn LlmClient>,
    model: String,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct RawSection {
    #[serde(default, alias = "section_number", deserialize_with = "deserialize_id")]
    id: String,
    #[serde(default)]
    content: Option<String>,
}

impl LlmBatchExtractor {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client,
            model: model.into(),
            retry,
        }
    }
}

#[async_trait]
impl BatchExtractor for LlmBatchExtractor {
    async fn extract(&self, pages: &[PathBuf]) -> Result<Vec<SectionRecord>, AiError> {
        if pages.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = GenerateRequest::new(&self.model).text(EXTRACT_PROMPT).json();
        for page in pages {
            request = request.image(load_image(page).await?);
        }

        let text = self
            .retry
            .run("extract", || self.client.generate(&request))
            .await?;

        match parse_json_array(&text) {
            Ok(value) => {
                let records = records_from_value(value);
                debug!(pages = pages.len(), sections = records.len(), "extracted batch");
                Ok(records)
            }
            Err(e) => {
                warn!(error = %e, pages = pages.len(), "extraction output unusable, treating batch as empty");
                Ok(Vec::new())
            }
        }
    }
}

async fn load_image(path: &Path) -> Result<InlineImage, AiError> {
    let data = tokio::fs::read(path).await.map_err(|source| AiError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(InlineImage {
        mime_type: mime_type(path).to_string(),
        data,
    })
}

fn mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
        _ => "image/jpeg",
    }
}

/// Keep every array element that looks like a section; skip the rest.
fn records_from_value(value: serde_json::Value) -> Vec<SectionRecord> {
    let serde_json::Value::Array(items) = value else {
        return Vec::new();
    };
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawSection>(item) {
            Ok(raw) => Some(SectionRecord::new(raw.id, raw.content.unwrap_or_default())),
            Err(e) => {
                warn!(error = %e, "skipping malformed extracted item");
                None
            }
        })
        .collect()
}
