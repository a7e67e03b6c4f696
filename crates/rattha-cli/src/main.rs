mod display;
mod pipeline;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use rattha_ai::{GeminiClient, LlmBatchExtractor, LlmCategoryMapper, LlmClient, LlmSummaryGenerator};
use rattha_core::PipelineConfig;
use rattha_store::{discover_editions, load_legacy_map};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rattha", version)]
#[command(about = "Heal, reconcile and categorize OCR'd Thai constitution editions")]
struct Cli {
    /// Serialized pipeline config (JSON); flags below override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root directory holding one page-image folder per edition
    #[arg(long, env = "RATTHA_IMAGE_DIR", global = true)]
    image_dir: Option<PathBuf>,

    /// Legacy transcription collection (JSON)
    #[arg(long, env = "RATTHA_LEGACY_JSON", global = true)]
    legacy_json: Option<PathBuf>,

    #[arg(long, env = "RATTHA_CHECKPOINT_DIR", global = true)]
    checkpoint_dir: Option<PathBuf>,

    /// Output root; clean and final files go to `<dir>/clean` and `<dir>/final`
    #[arg(long, env = "RATTHA_OUTPUT_DIR", global = true)]
    output_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    images_per_batch: Option<usize>,

    /// Batches extracted concurrently
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Substitute legacy wording at extraction time when similarity exceeds 0.80
    #[arg(long, global = true)]
    substitute_legacy: bool,

    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract raw sections from page images into the per-edition checkpoint
    Extract {
        /// Edition id (e.g. con2560); all editions under the image root when omitted
        edition: Option<String>,
    },
    /// Heal the checkpointed sequence and write clean and final output
    Heal {
        edition: Option<String>,
        /// Print the first N canonical records
        #[arg(long, default_value_t = 0)]
        preview: usize,
    },
    /// Group the clean sequence by category and write the summary report
    Analyze {
        edition: Option<String>,
        /// Classify sections directly instead of mapping chapter headers
        #[arg(long)]
        per_section: bool,
    },
    /// Extract, heal, and analyze
    Run {
        edition: Option<String>,
        #[arg(long)]
        per_section: bool,
        #[arg(long, default_value_t = 0)]
        preview: usize,
    },
}

/// Stages to run for each edition.
#[derive(Debug, Default, PartialEq, Eq)]
struct Plan {
    edition: Option<String>,
    extract: bool,
    heal: bool,
    analyze: bool,
    per_section: bool,
    preview: usize,
}

impl From<Command> for Plan {
    fn from(command: Command) -> Self {
        match command {
            Command::Extract { edition } => Plan {
                edition,
                extract: true,
                ..Default::default()
            },
            Command::Heal { edition, preview } => Plan {
                edition,
                heal: true,
                preview,
                ..Default::default()
            },
            Command::Analyze {
                edition,
                per_section,
            } => Plan {
                edition,
                analyze: true,
                per_section,
                ..Default::default()
            },
            Command::Run {
                edition,
                per_section,
                preview,
            } => Plan {
                edition,
                extract: true,
                heal: true,
                analyze: true,
                per_section,
                preview,
            },
        }
    }
}

struct Collaborators {
    extractor: LlmBatchExtractor,
    mapper: LlmCategoryMapper,
    summarizer: LlmSummaryGenerator,
}

impl Collaborators {
    fn new(config: &PipelineConfig, api_key: Option<&str>) -> anyhow::Result<Self> {
        let client: Arc<dyn LlmClient> = Arc::new(
            GeminiClient::new(api_key.unwrap_or_default(), config.request_timeout())
                .context("a Google API key is required (set GOOGLE_API_KEY or --api-key)")?,
        );
        Ok(Self {
            extractor: LlmBatchExtractor::new(
                client.clone(),
                &config.extract_model,
                config.extract_retry.into(),
            ),
            mapper: LlmCategoryMapper::new(
                client.clone(),
                &config.mapping_model,
                &config.summary_model,
                config.analysis_retry.into(),
            ),
            summarizer: LlmSummaryGenerator::new(
                client,
                &config.summary_model,
                config.analysis_retry.into(),
            ),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("rattha v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    let api_key = cli.api_key.clone();
    let plan = Plan::from(cli.command);

    let collaborators = if plan.extract || plan.analyze {
        Some(Collaborators::new(&config, api_key.as_deref())?)
    } else {
        None
    };

    let editions = match &plan.edition {
        Some(edition) => vec![edition.clone()],
        None => {
            let found = discover_editions(&config.image_dir).with_context(|| {
                format!("discovering editions under {}", config.image_dir.display())
            })?;
            if found.is_empty() {
                bail!("no edition folders under {}", config.image_dir.display());
            }
            info!(count = found.len(), "batch mode");
            found
        }
    };

    let mut failed = 0;
    for edition in &editions {
        if let Err(e) = run_edition(&config, &plan, collaborators.as_ref(), edition).await {
            error!(edition = %edition, error = %format!("{e:#}"), "edition failed");
            failed += 1;
        }
    }
    if failed > 0 {
        bail!("{failed} of {} editions failed", editions.len());
    }
    Ok(())
}

async fn run_edition(
    config: &PipelineConfig,
    plan: &Plan,
    collaborators: Option<&Collaborators>,
    edition: &str,
) -> anyhow::Result<()> {
    let paths = config.edition(edition);

    if plan.extract || plan.heal {
        let legacy = load_legacy_map(&config.legacy_json, edition)?;
        if plan.extract
            && let Some(c) = collaborators
        {
            let stats = pipeline::extract(config, &paths, &c.extractor, &legacy).await?;
            display::print_extract_stats(edition, &stats);
            if stats.failed > 0 && plan.heal {
                bail!(
                    "{} batches failed; rerun to resume before healing",
                    stats.failed
                );
            }
        }
        if plan.heal {
            let healed = pipeline::heal_edition(&paths, &legacy)?;
            display::print_heal_summary(edition, &healed.report, &healed.sections);
            display::print_preview(&healed.sections, plan.preview)?;
        }
    }

    if plan.analyze
        && let Some(c) = collaborators
    {
        let report =
            pipeline::analyze_edition(&paths, &c.mapper, &c.summarizer, plan.per_section).await?;
        display::print_report(edition, &report);
    }
    Ok(())
}

fn build_config(cli: &Cli) -> anyhow::Result<PipelineConfig> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &cli.image_dir {
        config.image_dir = dir.clone();
    }
    if let Some(path) = &cli.legacy_json {
        config.legacy_json = path.clone();
    }
    if let Some(dir) = &cli.checkpoint_dir {
        config.checkpoint_dir = dir.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.clean_dir = dir.join("clean");
        config.final_dir = dir.join("final");
    }
    if let Some(n) = cli.images_per_batch {
        config.images_per_batch = n;
    }
    if let Some(n) = cli.concurrency {
        config.extract_concurrency = n;
    }
    if cli.substitute_legacy {
        config.substitute_legacy = true;
    }
    config.validate()?;
    Ok(config)
}
