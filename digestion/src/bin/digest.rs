//! digest: run files through the ingestion pipeline and print the outcome.
//!
//! Each file becomes one item; results and final statistics are printed
//! as JSON on stdout, logs go to stderr.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::sync::RwLock;
use tracing::info;

use amygdala::Amygdala;
use codex::{InMemoryKnowledgeStore, KnowledgeTranslator, SourceKind};
use corrector::QuantumCorrector;
use digestion::{DigestInput, DigestiveSystem, SystemConfig};

#[derive(Parser)]
#[command(name = "digest")]
#[command(about = "Digest local files into an in-memory knowledge store")]
struct Cli {
    /// Files to digest
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Path to a YAML configuration file
    #[arg(short, long, env = "DIGEST_CONFIG")]
    config: Option<PathBuf>,

    /// Seed for node positions (overrides config file)
    #[arg(long, env = "DIGEST_SEED")]
    seed: Option<u64>,

    /// Content type for every file, instead of guessing from the extension
    #[arg(long)]
    content_type: Option<String>,

    /// Source kind recorded on every item
    #[arg(long, default_value = "manual")]
    source_kind: SourceKind,

    /// Skip anomaly screening
    #[arg(long)]
    no_detector: bool,
}

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("html") | Some("htm") => "text/html",
        Some("json") => "application/json",
        _ => "text/plain",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("digestion=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            info!("Config file: {}", path.display());
            SystemConfig::from_file(path)?
        }
        None => SystemConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.digestion.seed = Some(seed);
    }
    if cli.no_detector {
        config.detector_enabled = false;
    }

    let store = Arc::new(InMemoryKnowledgeStore::new());
    let mut system = DigestiveSystem::new(
        config.digestion.clone(),
        Arc::new(KnowledgeTranslator::with_knowledge_template()),
        store.clone(),
    )?
    .with_corrector(Arc::new(RwLock::new(QuantumCorrector::with_config(
        config.corrector.clone(),
    ))));
    if config.detector_enabled {
        system = system.with_amygdala(Arc::new(RwLock::new(Amygdala::with_config(
            config.amygdala.clone(),
        ))));
    }

    let mut inputs = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let content = std::fs::read_to_string(path)?;
        let content_type = cli
            .content_type
            .clone()
            .unwrap_or_else(|| content_type_for(path).to_string());
        let url = format!("file://{}", path.display());
        inputs.push(DigestInput::new(cli.source_kind, url, content, content_type));
    }

    info!(items = inputs.len(), "Digesting");
    let batch = system.digest_batch(inputs).await;
    info!(
        absorbed = batch.absorbed.len(),
        eliminated = batch.eliminated.len(),
        stored = store.count().await,
        "Done"
    );

    println!("{}", serde_json::to_string_pretty(&batch)?);
    Ok(())
}
