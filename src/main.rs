use anyhow::Result;
use cfo_copilot::cli::setup::setup;
use cfo_copilot::core::log::init_logging;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for cfo_copilot::AppCommand {
    fn from(cmd: Commands) -> cfo_copilot::AppCommand {
        match cmd {
            Commands::Ask { question, json } => cfo_copilot::AppCommand::Ask {
                question: question.join(" "),
                json,
            },
            Commands::Snapshot { output } => cfo_copilot::AppCommand::Snapshot { output },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Answer a finance question, e.g. "What was 2025-06 revenue vs budget?"
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
        /// Print the answer as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export a one-page summary of the headline metrics
    Snapshot {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => cfo_copilot::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
