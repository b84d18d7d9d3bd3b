//! Replay command
//!
//! Usage: notagraph replay --model <FILE> --actions <FILE> [--config <FILE>]
//!
//! The actions file holds one JSON action per line; blank lines and lines
//! starting with `#` are skipped. Every response is printed as a JSON line.

use anyhow::{Context, Result};
use clap::Args;
use notagraph_core::logging_facility;
use notagraph_engine::{Action, EngineConfig, Session};
use notagraph_store::JsonFileStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Diagram file to open (created on save if missing)
    #[arg(short, long)]
    pub model: PathBuf,

    /// JSON-lines file of actions
    #[arg(short, long)]
    pub actions: PathBuf,

    /// Engine configuration (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Execute replay command
pub fn execute(args: ReplayArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    logging_facility::init(config.log_profile);

    let actions = read_actions(&args.actions)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;
    let responses = runtime.block_on(replay(args.model, config, actions))?;

    for response in responses {
        println!("{}", serde_json::to_string(&response)?);
    }
    Ok(())
}

fn read_actions(path: &Path) -> Result<Vec<Action>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(index, line)| {
            Action::from_json(line)
                .with_context(|| format!("{}:{}: invalid action", path.display(), index + 1))
        })
        .collect()
}

async fn replay(model: PathBuf, config: EngineConfig, actions: Vec<Action>) -> Result<Vec<Action>> {
    let store = Arc::new(JsonFileStore::new(model));
    let (session, sender, mut responses) =
        Session::from_config(store, &config).context("Failed to open session")?;
    let handle = tokio::spawn(session.run());

    for action in actions {
        sender.send(action).await?;
    }
    sender.shutdown().await?;
    handle.await.context("Session task failed")?;

    let mut collected = Vec::new();
    while let Some(response) = responses.recv().await {
        collected.push(response);
    }
    Ok(collected)
}
