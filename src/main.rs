use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use casetriage::cli::{Cli, Commands};
use casetriage::config::{self, AppConfig};
use casetriage::embedding::{EmbeddingProvider, HashEmbedder};
use casetriage::input;
use casetriage::pipeline::Pipeline;
use casetriage::session::CanonicalSession;

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("casetriage={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Init => {
            config::init().context("writing default configuration")?;
            Ok(())
        }
        Commands::Analyze {
            cases,
            vocabulary,
            synonyms,
            output_dir,
            session,
            config: config_path,
        } => {
            analyze(cases, vocabulary, synonyms, output_dir, session, config_path).await
        }
    }
}

async fn analyze(
    cases_path: PathBuf,
    vocabulary_path: PathBuf,
    synonyms_path: Option<PathBuf>,
    output_dir: PathBuf,
    session_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = match config_path {
        Some(path) => AppConfig::load_from(&path).context("loading configuration")?,
        None => AppConfig::load_or_default().context("loading configuration")?,
    };

    let mut session = match &session_path {
        Some(path) if path.exists() => {
            CanonicalSession::load(path).context("loading session")?
        }
        _ => CanonicalSession::new(),
    };
    if let Some(path) = &synonyms_path {
        let additions = input::load_synonyms(path).context("loading synonyms")?;
        session.merge_synonyms(additions);
    }

    let cases = input::load_test_cases(&cases_path).context("loading test cases")?;
    let vocabulary_labels =
        input::load_vocabulary_labels(&vocabulary_path).context("loading vocabulary")?;

    let provider: Arc<dyn EmbeddingProvider> =
        Arc::new(HashEmbedder::new(config.embedding.dimension));
    let pipeline = Pipeline::new(config, provider)?;

    let report = pipeline
        .analyze(cases, vocabulary_labels, &session.synonyms)
        .await
        .context("running analysis")?;

    let run_dir = report.export_all(&output_dir).context("exporting report")?;
    report.print_summary();
    println!("Report written to {}", run_dir.display());

    if let Some(path) = &session_path {
        session.save(path).context("saving session")?;
    }
    info!("Done");
    Ok(())
}
