//! Render command
//!
//! Usage: notagraph render --model <FILE> [--output <FILE>]

use anyhow::{Context, Result};
use clap::Args;
use notagraph_core::model::NotationModel;
use notagraph_core::persistence::ModelPersistence;
use notagraph_core::render::{GraphRenderer, RenderSnapshotFactory};
use notagraph_store::JsonFileStore;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Stored diagram file
    #[arg(short, long)]
    pub model: PathBuf,

    /// Output file path (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let snapshot = JsonFileStore::new(&args.model)
        .load()
        .with_context(|| format!("Failed to load {}", args.model.display()))?;
    let model = NotationModel::from_snapshot(&snapshot).context("Stored diagram is invalid")?;

    // A freshly loaded model matches its file, so it is never dirty.
    let graph = GraphRenderer::new().create(&model, false);
    let json = serde_json::to_string_pretty(&graph)?;

    if let Some(output_path) = args.output {
        std::fs::write(&output_path, json)?;
        println!("✓ Rendered to {}", output_path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}
