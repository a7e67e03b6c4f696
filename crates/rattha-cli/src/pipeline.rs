//! Per-edition stages: extract → heal → analyze.

use std::collections::BTreeMap;

use anyhow::{Context, bail};
use futures::StreamExt;
use rattha_ai::{
    BatchExtractor, CategoryMapper, CategoryReport, SummaryGenerator, build_report,
    group_by_headers, group_by_section_map, header_texts, summary_lines,
};
use rattha_core::{
    EditionPaths, Healed, LegacyMap, PipelineConfig, SectionRecord, finalize, heal,
    reconcile_batch,
};
use rattha_store::{CheckpointStore, batches, discover_pages, read_json, write_json_atomic};
use tracing::{error, info, warn};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub pages: usize,
    pub batches: usize,
    pub skipped: usize,
    pub saved: usize,
    pub empty: usize,
    pub failed: usize,
}

// ── Extract ──

/// Extract every batch not yet in the checkpoint.
///
/// A batch that fails or yields nothing is logged and left out of the checkpoint, so the
/// next run retries it. Checkpoint writes happen one at a time as batches complete.
pub async fn extract(
    config: &PipelineConfig,
    paths: &EditionPaths,
    extractor: &dyn BatchExtractor,
    legacy: &LegacyMap,
) -> anyhow::Result<ExtractStats> {
    let pages = discover_pages(&paths.image_dir)?;
    let all = batches(&pages, config.images_per_batch);
    let mut checkpoint = CheckpointStore::open(&paths.checkpoint)
        .with_context(|| format!("opening checkpoint {}", paths.checkpoint.display()))?;

    let mut stats = ExtractStats {
        pages: pages.len(),
        batches: all.len(),
        ..Default::default()
    };
    info!(edition = %paths.edition_id, pages = stats.pages, batches = stats.batches, "extracting");

    let mut pending = Vec::new();
    for batch in all {
        if checkpoint.contains(batch.number) {
            info!(batch = batch.number, "skipping batch (done)");
            stats.skipped += 1;
        } else {
            pending.push(batch);
        }
    }

    let mut results = futures::stream::iter(pending)
        .map(|batch| async move {
            info!(batch = batch.number, pages = batch.pages.len(), "processing batch");
            (batch.number, extractor.extract(&batch.pages).await)
        })
        .buffer_unordered(config.extract_concurrency.max(1));

    while let Some((number, result)) = results.next().await {
        match result {
            Ok(records) if records.is_empty() => {
                warn!(batch = number, "batch produced no sections, not checkpointed");
                stats.empty += 1;
            }
            Ok(records) => {
                let records = if config.substitute_legacy {
                    reconcile_batch(records, legacy)
                } else {
                    records
                };
                let count = records.len();
                checkpoint.record(number, records)?;
                info!(batch = number, sections = count, "batch saved");
                stats.saved += 1;
            }
            Err(e) => {
                error!(batch = number, error = %e, "batch failed");
                stats.failed += 1;
            }
        }
    }
    Ok(stats)
}

// ── Heal ──

/// Heal the checkpointed sequence and write the clean, final and Parquet outputs.
///
/// Nothing is written unless the whole pass completes.
pub fn heal_edition(paths: &EditionPaths, legacy: &LegacyMap) -> anyhow::Result<Healed> {
    let checkpoint = CheckpointStore::open(&paths.checkpoint)?;
    if checkpoint.is_empty() {
        bail!(
            "no extracted batches for {} (expected {})",
            paths.edition_id,
            paths.checkpoint.display()
        );
    }
    let raw = checkpoint.sequence();
    info!(edition = %paths.edition_id, records = raw.len(), "healing sequence");

    let healed = heal(raw, Some(legacy));

    write_json_atomic(&paths.clean, &healed.sections)
        .with_context(|| format!("writing {}", paths.clean.display()))?;
    write_json_atomic(&paths.final_sections, &finalize(&healed.sections))
        .with_context(|| format!("writing {}", paths.final_sections.display()))?;
    let parquet_path = paths.clean.with_extension("parquet");
    rattha_store::write_parquet(&parquet_path, &healed.sections)
        .with_context(|| format!("writing {}", parquet_path.display()))?;

    info!(
        edition = %paths.edition_id,
        sections = healed.sections.len(),
        clean = %paths.clean.display(),
        "heal complete"
    );
    Ok(healed)
}

// ── Analyze ──

/// Group the clean sequence by category, summarize each group and write the report.
///
/// Mapping or summary failures degrade to `general` and default summaries.
pub async fn analyze_edition(
    paths: &EditionPaths,
    mapper: &dyn CategoryMapper,
    summarizer: &dyn SummaryGenerator,
    per_section: bool,
) -> anyhow::Result<Vec<CategoryReport>> {
    let sections: Vec<SectionRecord> = read_json(&paths.clean)
        .with_context(|| format!("reading clean sequence {}", paths.clean.display()))?;
    info!(edition = %paths.edition_id, records = sections.len(), per_section, "analyzing");

    let groups = if per_section {
        let map = mapper.map_sections(&sections).await.unwrap_or_else(|e| {
            warn!(error = %e, "section classification failed, using general");
            BTreeMap::new()
        });
        group_by_section_map(&sections, &map)
    } else {
        let headers = header_texts(&sections);
        let map = mapper.map_headers(&headers).await.unwrap_or_else(|e| {
            warn!(error = %e, "header mapping failed, using general");
            BTreeMap::new()
        });
        group_by_headers(&sections, &map)
    };

    let summaries = summarizer
        .summarize(&summary_lines(&groups))
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "summary generation failed, using defaults");
            BTreeMap::new()
        });

    let report = build_report(paths.year(), groups, &summaries);
    write_json_atomic(&paths.summary, &report)
        .with_context(|| format!("writing {}", paths.summary.display()))?;
    info!(categories = report.len(), summary = %paths.summary.display(), "analysis complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rattha_ai::{AiError, CategorySummary};
    use rattha_core::{Category, Status};
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Canned sections keyed by the batch's first page; `fail` errors, anything else is empty.
    struct FakeExtractor {
        calls: Mutex<Vec<PathBuf>>,
    }

    #[async_trait]
    impl BatchExtractor for FakeExtractor {
        async fn extract(&self, pages: &[PathBuf]) -> Result<Vec<SectionRecord>, AiError> {
            let first = pages[0].clone();
            self.calls.lock().unwrap().push(first.clone());
            let name = first.file_stem().unwrap().to_string_lossy().into_owned();
            match name.as_str() {
                "p1" => Ok(vec![
                    SectionRecord::new("intro", "เกริ่นนำ หมวด ๑ บททั่วไป"),
                    SectionRecord::new("1", "ประเทศไทยเป็นราชอาณาจักร"),
                ]),
                "p3" => Ok(vec![
                    SectionRecord::new("๒", "อำนาจอธิปไตย"),
                    SectionRecord::new("intro", "เป็นของปวงชน"),
                ]),
                "fail" => Err(AiError::RateLimited("exhausted".into())),
                _ => Ok(Vec::new()),
            }
        }
    }

    struct FakeMapper;

    #[async_trait]
    impl CategoryMapper for FakeMapper {
        async fn map_headers(
            &self,
            headers: &[String],
        ) -> Result<BTreeMap<String, Category>, AiError> {
            Ok(headers
                .iter()
                .map(|h| (h.clone(), Category::General))
                .collect())
        }

        async fn map_sections(
            &self,
            _sections: &[SectionRecord],
        ) -> Result<BTreeMap<String, Category>, AiError> {
            Err(AiError::EmptyResponse)
        }
    }

    struct FakeSummarizer;

    #[async_trait]
    impl SummaryGenerator for FakeSummarizer {
        async fn summarize(
            &self,
            lines: &BTreeMap<Category, Vec<String>>,
        ) -> Result<BTreeMap<Category, CategorySummary>, AiError> {
            Ok(lines
                .keys()
                .map(|c| {
                    (
                        *c,
                        CategorySummary {
                            summary: Some(format!("{} sections", lines[c].len())),
                            key_change: None,
                        },
                    )
                })
                .collect())
        }
    }

    fn setup(pages: &[&str]) -> (TempDir, PipelineConfig, EditionPaths) {
        let dir = TempDir::new().unwrap();
        let config = PipelineConfig {
            image_dir: dir.path().join("images"),
            checkpoint_dir: dir.path().join("checkpoints"),
            clean_dir: dir.path().join("clean"),
            final_dir: dir.path().join("final"),
            images_per_batch: 2,
            ..Default::default()
        };
        let paths = config.edition("con2560");
        std::fs::create_dir_all(&paths.image_dir).unwrap();
        for page in pages {
            std::fs::write(paths.image_dir.join(page), b"img").unwrap();
        }
        (dir, config, paths)
    }

    fn extractor() -> FakeExtractor {
        FakeExtractor {
            calls: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn extract_checkpoints_and_resumes() {
        let (_dir, config, paths) = setup(&["p1.png", "p2.png", "p3.png", "p4.png", "p5.png"]);
        let fake = extractor();

        let stats = extract(&config, &paths, &fake, &LegacyMap::default())
            .await
            .unwrap();
        assert_eq!(stats.batches, 3);
        assert_eq!(stats.saved, 2);
        assert_eq!(stats.empty, 1);

        let checkpoint = CheckpointStore::open(&paths.checkpoint).unwrap();
        assert_eq!(checkpoint.batch_numbers().collect::<Vec<_>>(), vec![1, 2]);

        // Second run only retries the batch that produced nothing.
        let again = extractor();
        let stats = extract(&config, &paths, &again, &LegacyMap::default())
            .await
            .unwrap();
        assert_eq!(stats.skipped, 2);
        assert_eq!(again.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_batch_does_not_stop_the_run() {
        let (_dir, config, paths) = setup(&["p1.png", "p2.png", "fail.png"]);
        let stats = extract(&config, &paths, &extractor(), &LegacyMap::default())
            .await
            .unwrap();
        // "fail.png" has no digits, so it sorts first and forms batch 1 with p1.
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.saved, 0);
        assert_eq!(stats.empty, 1);
    }

    #[tokio::test]
    async fn missing_image_folder_is_fatal() {
        let (dir, config, _) = setup(&[]);
        let paths = config.edition("con2475");
        let result = extract(&config, &paths, &extractor(), &LegacyMap::default()).await;
        assert!(result.is_err());
        assert!(!dir.path().join("checkpoints").join("con2475_checkpoint.json").exists());
    }

    #[tokio::test]
    async fn batch_stage_substitution() {
        let (_dir, mut config, paths) = setup(&["p1.png"]);
        config.substitute_legacy = true;
        let legacy: LegacyMap = [("1".to_string(), "ประเทศไทยเป็นราชอาณาจักร".to_string())]
            .into_iter()
            .collect();

        extract(&config, &paths, &extractor(), &legacy).await.unwrap();
        let checkpoint = CheckpointStore::open(&paths.checkpoint).unwrap();
        let seq = checkpoint.sequence();
        assert_eq!(seq[1].status, Status::Verified);
        assert_eq!(seq[0].status, Status::OcrOnly);
    }

    #[tokio::test]
    async fn heal_then_analyze() {
        let (_dir, config, paths) = setup(&["p1.png", "p2.png", "p3.png"]);
        extract(&config, &paths, &extractor(), &LegacyMap::default())
            .await
            .unwrap();

        let legacy: LegacyMap = [("1".to_string(), "ประเทศไทยเป็นราชอาณาจักร".to_string())]
            .into_iter()
            .collect();
        let healed = heal_edition(&paths, &legacy).unwrap();
        let ids: Vec<&str> = healed.sections.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["intro", "header_1", "1", "2"]);
        assert_eq!(healed.sections[2].status, Status::Verified);
        assert_eq!(healed.sections[3].content, "อำนาจอธิปไตย เป็นของปวงชน");

        assert!(paths.clean.exists());
        assert!(paths.clean.with_extension("parquet").exists());
        let published: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&paths.final_sections).unwrap())
                .unwrap();
        assert_eq!(published.as_array().unwrap().len(), 3);

        let report = analyze_edition(&paths, &FakeMapper, &FakeSummarizer, false)
            .await
            .unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].category_id, Category::General);
        assert_eq!(report[0].section_count, 3);
        assert_eq!(report[0].ai_summary, "3 sections");
        assert_eq!(report[0].constitution_year, 2560);
        assert!(paths.summary.exists());

        // Per-section classification failure degrades to general.
        let report = analyze_edition(&paths, &FakeMapper, &FakeSummarizer, true)
            .await
            .unwrap();
        assert_eq!(report[0].category_id, Category::General);
    }

    #[test]
    fn heal_without_checkpoint_fails() {
        let (_dir, _config, paths) = setup(&[]);
        assert!(heal_edition(&paths, &LegacyMap::default()).is_err());
        assert!(!paths.clean.exists());
    }
}
