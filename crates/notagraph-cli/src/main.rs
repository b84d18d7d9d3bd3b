//! notagraph CLI
//!
//! Command-line interface for notagraph diagram files

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "notagraph")]
#[command(about = "notagraph - diagram model editing backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a sample diagram
    Init(commands::init::InitArgs),
    /// Print the render snapshot of a stored diagram
    Render(commands::render::RenderArgs),
    /// Feed JSON actions through an editing session
    Replay(commands::replay::ReplayArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args),
        Commands::Render(args) => commands::render::execute(args),
        Commands::Replay(args) => commands::replay::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
