//! Per-category summaries of grouped section text.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use rattha_core::Category;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::client::{GenerateRequest, LlmClient};
use crate::json::parse_json_object;
use crate::{AiError, RetryPolicy};

const SUMMARY_PROMPT: &str = r#"Role: Political Science Professor (Thai Constitution Specialist).
Task: Analyze the provided constitution content (grouped by categories) and summarize EACH category.

Input Format: A JSON object where keys are category IDs and values are lists of sections.

Output Requirement:
Return a SINGLE JSON object where:
- Key = category_id (must match input keys exactly)
- Value = An object containing:
    - "summary": (String) Summary in Thai (neutral, academic, max 3 sentences).
    - "key_change": (String) A short highlight of power dynamics or significant changes.

Constraint: Strictly Output valid JSON only. No markdown."#;

/// Summary of one category. Either field may be missing from model output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub key_change: Option<String>,
}

/// Category → `[ม.<id>] <content>` lines in, category → summary out.
#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    async fn summarize(
        &self,
        lines: &BTreeMap<Category, Vec<String>>,
    ) -> Result<BTreeMap<Category, CategorySummary>, AiError>;
}

pub struct LlmSummaryGenerator {
    client: Arc<dyn LlmClient>,
    model: String,
    retry: RetryPolicy,
}

impl LlmSummaryGenerator {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client,
            model: model.into(),
            retry,
        }
    }
}

#[async_trait]
impl SummaryGenerator for LlmSummaryGenerator {
    async fn summarize(
        &self,
        lines: &BTreeMap<Category, Vec<String>>,
    ) -> Result<BTreeMap<Category, CategorySummary>, AiError> {
        let active: BTreeMap<&Category, &Vec<String>> =
            lines.iter().filter(|(_, v)| !v.is_empty()).collect();
        if active.is_empty() {
            return Ok(BTreeMap::new());
        }

        let targets: Vec<&str> = active.keys().map(|c| c.id()).collect();
        let data = serde_json::to_string_pretty(&active).unwrap_or_default();
        let request = GenerateRequest::new(&self.model)
            .text(format!("{SUMMARY_PROMPT}\n\nTarget Categories: {targets:?}"))
            .text(format!("[DATA START]\n{data}\n[DATA END]"))
            .json();

        info!(categories = active.len(), model = %self.model, "generating summaries");
        let text = self
            .retry
            .run("summarize", || self.client.generate(&request))
            .await?;

        match parse_json_object(&text) {
            Ok(value) => Ok(summaries_from_value(value)),
            Err(e) => {
                warn!(error = %e, "summary output unusable, using defaults");
                Ok(BTreeMap::new())
            }
        }
    }
}

/// Keep entries keyed by a known category whose value is an object.
fn summaries_from_value(value: Value) -> BTreeMap<Category, CategorySummary> {
    let Value::Object(entries) = value else {
        return BTreeMap::new();
    };
    entries
        .into_iter()
        .filter_map(|(key, value)| {
            let category = Category::from_id(&key)?;
            let summary = serde_json::from_value::<CategorySummary>(value).ok()?;
            Some((category, summary))
        })
        .collect()
}
