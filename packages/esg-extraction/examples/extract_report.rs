//! Extract ESG indicators from a sustainability report PDF.
//!
//! Reads model settings from `.env` (`OPENROUTER_API_KEY`, `DEFAULT_MODEL`,
//! `BACKUP_MODELS`, ...), runs one strategy over the report and prints the
//! text report.
//!
//! ```bash
//! cargo run --example extract_report --features openai,pdf -- \
//!     --pdf data/reports/acme-2024.pdf --company Acme --year 2024 --mode vector
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use esg_extraction::ai::AiClient;
use esg_extraction::{
    catalog, render_report, AgentStrategy, ExtractionConfig, ExtractionStrategy,
    Extractor, FastVectorStrategy, FixedPipelineStrategy, ModelGateway, ModelSettings, PdfSource,
    RunStatus,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Tool-using agent
    Agent,
    /// Fixed pipeline over keyword contexts
    Simple,
    /// Semantic search plus one call per indicator
    Vector,
}

#[derive(Parser)]
#[command(name = "extract_report")]
#[command(about = "Extract ESG indicators from a sustainability report")]
struct Cli {
    /// Path to the PDF report
    #[arg(long)]
    pdf: PathBuf,

    /// Company name
    #[arg(long)]
    company: String,

    /// Report year
    #[arg(long)]
    year: i32,

    /// Indicator codes to extract (default: all)
    #[arg(long, num_args = 1..)]
    indicators: Vec<String>,

    /// Extraction strategy
    #[arg(long, value_enum, default_value = "agent")]
    mode: Mode,

    /// Write results as JSON to this path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Rebuild the semantic index even if cached
    #[arg(long)]
    force_reindex: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let _ = dotenvy::dotenv();

    if !cli.pdf.exists() {
        bail!("PDF file not found: {}", cli.pdf.display());
    }

    let unknown: Vec<&String> = cli
        .indicators
        .iter()
        .filter(|c| catalog::by_code(c).is_none())
        .collect();
    if !unknown.is_empty() {
        bail!("Invalid indicator codes: {:?}", unknown);
    }
    let indicators = catalog::select(cli.indicators.as_slice());

    let client = AiClient::from_env()
        .context("AI client configuration")?
        .with_app_name("ESG Extraction");
    let settings = ModelSettings::from_env()?;
    let config = ExtractionConfig::default().with_force_reindex(cli.force_reindex);
    let gateway = Arc::new(ModelGateway::new(client.clone(), settings));

    let strategy: Arc<dyn ExtractionStrategy> = match cli.mode {
        Mode::Agent => Arc::new(AgentStrategy::new(gateway, config.clone())),
        Mode::Simple => Arc::new(FixedPipelineStrategy::new(gateway, config.clone())),
        Mode::Vector => Arc::new(FastVectorStrategy::with_embedder(
            gateway,
            client,
            config.clone(),
        )),
    };

    println!(
        "Extracting {} indicators from {} ({:?} mode)",
        indicators.len(),
        cli.pdf.display(),
        cli.mode
    );

    let extractor = Extractor::new(PdfSource::new(), strategy, config.clone());
    let report = extractor
        .run(&cli.pdf.to_string_lossy(), &indicators)
        .await;

    if report.status == RunStatus::Error {
        bail!("Extraction failed: {:?}", report.errors);
    }

    println!("{}", render_report(&cli.company, cli.year, &report.results, &config));

    if let Some(path) = cli.output {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Results written to {}", path.display());
    }

    Ok(())
}
