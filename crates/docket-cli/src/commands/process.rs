//! Process and retry commands.

use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use docket_core::models::ProcessOutcome;

use super::{print_outcome, GlobalArgs};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Document filename (default: every incoming document)
    filename: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

/// Arguments for the retry command.
#[derive(Args)]
pub struct RetryArgs {
    /// Document filename in the unprocessed location
    #[arg(required = true)]
    filename: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// Structured status payload
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let start = Instant::now();
    let pipeline = global.open_pipeline()?;

    let (outcomes, batch) = match &args.filename {
        Some(filename) => (vec![pipeline.process(filename)?], false),
        None => {
            let pending = pipeline
                .workspace()
                .list(docket_core::Location::Incoming)?;
            if pending.is_empty() {
                match args.format {
                    OutputFormat::Json => println!("[]"),
                    OutputFormat::Text => {
                        println!("{} No incoming documents.", style("ℹ").blue())
                    }
                }
                return Ok(());
            }

            let pb = ProgressBar::new(pending.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                    .progress_chars("=>-"),
            );

            let outcomes = pipeline.process_all_with(|outcome| {
                pb.set_message(outcome.filename.clone());
                pb.inc(1);
            })?;
            pb.finish_and_clear();
            (outcomes, true)
        }
    };

    report(&outcomes, batch, args.format)?;
    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}

pub async fn retry(args: RetryArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let pipeline = global.open_pipeline()?;
    let outcome = pipeline.retry(&args.filename)?;
    report(&[outcome], false, args.format)
}

/// JSON payload: an array for batch runs, a bare object for one named document.
fn json_payload(outcomes: &[ProcessOutcome], batch: bool) -> anyhow::Result<String> {
    let payload = match outcomes {
        [outcome] if !batch => serde_json::to_string_pretty(outcome)?,
        _ => serde_json::to_string_pretty(outcomes)?,
    };
    Ok(payload)
}

fn report(outcomes: &[ProcessOutcome], batch: bool, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", json_payload(outcomes, batch)?),
        OutputFormat::Text => {
            for outcome in outcomes {
                print_outcome(outcome);
            }
            if outcomes.len() > 1 {
                let successful = outcomes.iter().filter(|o| o.is_success()).count();
                println!();
                println!(
                    "   {} successful, {} failed",
                    style(successful).green(),
                    style(outcomes.len() - successful).red()
                );
            }
        }
    }
    Ok(())
}
