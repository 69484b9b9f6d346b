//! Add command - ingest documents and process them.

use std::path::PathBuf;

use clap::Args;
use console::style;
use glob::glob;
use tracing::warn;

use super::{display_name, print_outcome, GlobalArgs};

/// Arguments for the add command.
#[derive(Args)]
pub struct AddArgs {
    /// Input files or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Only copy the documents into the incoming directory
    #[arg(long)]
    no_process: bool,
}

pub async fn run(args: AddArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let pipeline = global.open_pipeline()?;

    let mut files: Vec<PathBuf> = Vec::new();
    for pattern in &args.inputs {
        let matched: Vec<PathBuf> = glob(pattern)?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matched.is_empty() {
            warn!("No files match {}", pattern);
        }
        files.extend(matched);
    }

    if files.is_empty() {
        anyhow::bail!("No matching files found for: {}", args.inputs.join(" "));
    }

    let mut ingested = Vec::with_capacity(files.len());
    for path in &files {
        let filename = pipeline.ingest(path)?;
        println!(
            "{} Added {} as {}",
            style("✓").green(),
            display_name(path),
            filename
        );
        // Distinct inputs can sanitize to the same name
        if !ingested.contains(&filename) {
            ingested.push(filename);
        }
    }

    if args.no_process {
        return Ok(());
    }

    let outcomes = pipeline.process_batch_with(&ingested, print_outcome);
    let failed = outcomes.iter().filter(|o| !o.is_success()).count();

    if failed > 0 {
        println!();
        println!(
            "{} {} of {} documents need attention (see 'docket retry')",
            style("ℹ").blue(),
            failed,
            ingested.len()
        );
    }

    Ok(())
}
