//! External collaborators of the pipeline: a Gemini HTTP client behind the [`LlmClient`]
//! trait, bounded retry, best-effort JSON recovery, and the extraction, category-mapping
//! and summary stages built on them.

mod client;
mod error;
mod extract;
mod grouping;
mod json;
mod mapper;
mod report;
mod retry;
mod summary;

pub use client::{GeminiClient, GenerateRequest, InlineImage, LlmClient};
pub use error::AiError;
pub use extract::{BatchExtractor, LlmBatchExtractor};
pub use grouping::{CategoryGroups, group_by_headers, group_by_section_map, header_texts, summary_lines};
pub use json::{ParseError, parse_json_array, parse_json_object};
pub use mapper::{CategoryMapper, LlmCategoryMapper};
pub use report::{CategoryReport, NO_KEY_CHANGE, NO_SUMMARY, build_report};
pub use retry::RetryPolicy;
pub use summary::{CategorySummary, LlmSummaryGenerator, SummaryGenerator};

#[cfg(test)]
pub(crate) mod testing;
