//! Category mapping: chapter headings (or individual sections) → the closed category set.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use rattha_core::{Category, SectionRecord};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::{GenerateRequest, LlmClient};
use crate::json::parse_json_object;
use crate::{AiError, RetryPolicy};

/// Exact-key mapping to categories. Keys absent from the result mean `general`.
///
/// Mappers only read records; they never change ids or merge anything.
#[async_trait]
pub trait CategoryMapper: Send + Sync {
    /// Header text → category.
    async fn map_headers(&self, headers: &[String]) -> Result<BTreeMap<String, Category>, AiError>;

    /// Section id → category, for pipelines that classify sections directly.
    async fn map_sections(
        &self,
        sections: &[SectionRecord],
    ) -> Result<BTreeMap<String, Category>, AiError>;
}

pub struct LlmCategoryMapper {
    client: Arc<dyn LlmClient>,
    header_model: String,
    section_model: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct SectionLite<'a> {
    id: &'a str,
    content: &'a str,
}

impl LlmCategoryMapper {
    pub fn new(
        client: Arc<dyn LlmClient>,
        header_model: impl Into<String>,
        section_model: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            header_model: header_model.into(),
            section_model: section_model.into(),
            retry,
        }
    }

    async fn ask(&self, what: &str, request: GenerateRequest) -> Result<BTreeMap<String, Category>, AiError> {
        let text = self.retry.run(what, || self.client.generate(&request)).await?;
        match parse_json_object(&text) {
            Ok(value) => Ok(categories_from_value(value)),
            Err(e) => {
                warn!(what, error = %e, "mapping output unusable, falling back to general");
                Ok(BTreeMap::new())
            }
        }
    }
}

#[async_trait]
impl CategoryMapper for LlmCategoryMapper {
    async fn map_headers(&self, headers: &[String]) -> Result<BTreeMap<String, Category>, AiError> {
        let mut seen = HashSet::new();
        let unique: Vec<&str> = headers
            .iter()
            .map(String::as_str)
            .filter(|h| seen.insert(*h))
            .collect();
        if unique.is_empty() {
            return Ok(BTreeMap::new());
        }

        info!(headers = unique.len(), model = %self.header_model, "mapping headers");
        let request = GenerateRequest::new(&self.header_model).text(header_prompt(&unique));
        let mapping = self.ask("map_headers", request).await?;
        info!(mapped = mapping.len(), "header mapping done");
        Ok(mapping)
    }

    async fn map_sections(
        &self,
        sections: &[SectionRecord],
    ) -> Result<BTreeMap<String, Category>, AiError> {
        let lite: Vec<SectionLite<'_>> = sections
            .iter()
            .filter(|r| !r.is_header())
            .map(|r| SectionLite {
                id: &r.id,
                content: &r.content,
            })
            .collect();
        if lite.is_empty() {
            return Ok(BTreeMap::new());
        }

        info!(sections = lite.len(), model = %self.section_model, "classifying sections");
        let payload = serde_json::to_string(&lite).unwrap_or_default();
        let request = GenerateRequest::new(&self.section_model)
            .text(section_prompt(&payload))
            .json();
        self.ask("map_sections", request).await
    }
}

fn header_prompt(headers: &[&str]) -> String {
    let headers_text = headers
        .iter()
        .map(|h| format!("- {h}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"You are a Thai Constitutional Law Expert.
Task: Map the input headers (some are archaic/historical) to the standard category IDs.

Standard Categories:
{categories}

Input Headers:
{headers_text}

Instructions:
1. Analyze the semantic meaning of each header.
   - "อภิรัฐมนตรี" -> monarchy (Privy Council equivalent)
   - "พฤฒสภา" -> legislative (Senate equivalent)
   - "กรรมการราษฎร" -> executive (Cabinet equivalent)
2. Output ONLY a valid JSON object. Do not explain.
3. Format: {{ "Input Header Text": "category_id" }}"#,
        categories = Category::prompt_listing(),
    )
}

fn section_prompt(sections_json: &str) -> String {
    format!(
        r#"Role: Thai Constitutional Law Expert.
Task: Classify each section into exactly one of the 18 categories.
Categories:
{categories}
Input (JSON):
{sections_json}
Output: JSON Object {{ "section_id": "category_id" }}"#,
        categories = Category::prompt_listing(),
    )
}

/// String values become categories; ids outside the closed set fall back to `general`.
fn categories_from_value(value: Value) -> BTreeMap<String, Category> {
    let Value::Object(entries) = value else {
        return BTreeMap::new();
    };
    entries
        .into_iter()
        .filter_map(|(key, value)| {
            let id = value.as_str()?;
            let category = Category::from_id(id).unwrap_or_else(|| {
                debug!(key = %key, id, "unknown category id, using general");
                Category::DEFAULT
            });
            Some((key, category))
        })
        .collect()
}
