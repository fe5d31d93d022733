use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use engine_router::config::load_descriptors_from_env;
use engine_router::{BackendRegistry, EvalRouter};
use move_tagger::{aliases, detect_version};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;
use xfchess_analysis::{MoveAnalyzer, Settings};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON settings file; defaults are used if it is missing or invalid
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate a position through the router
    Eval {
        #[arg(long)]
        fen: String,
        #[arg(long)]
        depth: Option<u32>,
        #[arg(long)]
        multipv: Option<u32>,
    },
    /// Evaluate and tag one move
    Tag {
        #[arg(long)]
        fen: String,
        /// Move in UCI notation, e.g. e2e4
        #[arg(long = "move")]
        uci: String,
    },
    /// List registered engine spots with their health and a fresh probe
    Spots,
    /// Map legacy tag names to canonical ones
    Resolve {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Attribute a stored metadata record to a tagger version
    DetectVersion { file: PathBuf },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the tokio runtime")?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Resolve { names } => {
            let resolved: serde_json::Map<String, Value> = names
                .iter()
                .map(|name| (name.clone(), Value::String(aliases::resolve(name))))
                .collect();
            print_json(&resolved)
        }
        Command::DetectVersion { file } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let Value::Object(metadata) = serde_json::from_str(&contents)
                .with_context(|| format!("{} is not valid JSON", file.display()))?
            else {
                bail!("{} must contain a JSON object", file.display());
            };
            print_json(&detect_version(&metadata))
        }
        Command::Eval { fen, depth, multipv } => {
            let (analyzer, settings) = build_analyzer(cli.config.as_deref())?;
            let depth = depth.unwrap_or(settings.depth);
            let multipv = multipv.unwrap_or(settings.multipv);
            let routed = analyzer.evaluate(&fen, depth, multipv).await?;
            print_json(&routed)
        }
        Command::Tag { fen, uci } => {
            let (analyzer, _) = build_analyzer(cli.config.as_deref())?;
            let analyzed = analyzer.tag_move(&fen, &uci).await?;
            print_json(&analyzed)
        }
        Command::Spots => {
            let (analyzer, _) = build_analyzer(cli.config.as_deref())?;
            let registry = analyzer.router().registry();
            let probes = registry.probe_all().await;
            let spots: Vec<Value> = registry
                .snapshot()
                .into_iter()
                .map(|(descriptor, health)| {
                    let probe = probes
                        .iter()
                        .find(|(id, _)| *id == descriptor.id)
                        .map(|(_, ok)| *ok);
                    json!({ "descriptor": descriptor, "health": health, "probe_ok": probe })
                })
                .collect();
            print_json(&spots)
        }
    }
}

/// Settings, spots from the environment, router and analyzer
fn build_analyzer(config: Option<&Path>) -> anyhow::Result<(MoveAnalyzer, Settings)> {
    let settings = Settings::resolve(config)?;
    let descriptors = load_descriptors_from_env()?;
    info!(spots = descriptors.len(), "loaded engine spots");

    let registry = Arc::new(BackendRegistry::with_descriptors(
        settings.router.clone(),
        descriptors,
    ));
    let router = Arc::new(EvalRouter::new(registry, settings.router.clone()));
    Ok((MoveAnalyzer::new(router, &settings), settings))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
