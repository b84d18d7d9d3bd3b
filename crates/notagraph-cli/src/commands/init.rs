//! Init command
//!
//! Usage: notagraph init --out <FILE> [--force]

use anyhow::{bail, Context, Result};
use clap::Args;
use notagraph_core::model::NotationModel;
use notagraph_core::persistence::ModelPersistence;
use notagraph_store::JsonFileStore;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Diagram file to create
    #[arg(short, long)]
    pub out: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Execute init command
pub fn execute(args: InitArgs) -> Result<()> {
    let store = JsonFileStore::new(&args.out);
    if store.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            args.out.display()
        );
    }

    // Root diagram with one shape at (0,0) sized (10,10)
    let mut model = NotationModel::new();
    let root = model.root().clone();
    let (shape, _) = model
        .create_shape(&root, (0.0, 0.0), (10.0, 10.0))
        .context("Failed to build sample diagram")?;

    store
        .save(&model.snapshot())
        .with_context(|| format!("Failed to write {}", args.out.display()))?;

    println!("✓ Wrote sample diagram to {}", args.out.display());
    println!("  root:  {}", root);
    println!("  shape: {}", shape);
    Ok(())
}
