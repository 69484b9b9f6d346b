//! CLI application for the docket invoice extraction pipeline.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{add, config, export, process, status, templates, text, GlobalArgs};

/// docket - Extract structured fields from invoice documents
#[derive(Parser)]
#[command(name = "docket")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Data directory (overrides the configured one)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add documents and process them
    Add(add::AddArgs),

    /// Process one incoming document, or all of them
    Process(process::ProcessArgs),

    /// Retry an unprocessed document
    Retry(process::RetryArgs),

    /// List documents and their state
    Status(status::StatusArgs),

    /// Delete a document and its record
    Delete(status::DeleteArgs),

    /// Delete every document and record
    Reset(status::ResetArgs),

    /// Export extraction results
    Export(export::ExportArgs),

    /// Manage fallback templates
    Templates(templates::TemplatesArgs),

    /// Print the raw text of a document
    Text(text::TextArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let global = GlobalArgs {
        config: cli.config,
        data_dir: cli.data_dir,
    };

    match cli.command {
        Commands::Add(args) => add::run(args, &global).await,
        Commands::Process(args) => process::run(args, &global).await,
        Commands::Retry(args) => process::retry(args, &global).await,
        Commands::Status(args) => status::run(args, &global).await,
        Commands::Delete(args) => status::delete(args, &global).await,
        Commands::Reset(args) => status::reset(args, &global).await,
        Commands::Export(args) => export::run(args, &global).await,
        Commands::Templates(args) => templates::run(args, &global).await,
        Commands::Text(args) => text::run(args, &global).await,
        Commands::Config(args) => config::run(args, &global).await,
    }
}
