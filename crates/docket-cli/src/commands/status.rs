//! Status, delete and reset commands.

use clap::Args;
use console::style;

use docket_core::Location;

use super::GlobalArgs;

/// Arguments for the status command.
#[derive(Args)]
pub struct StatusArgs {
    /// Only show documents in this location
    #[arg(short, long, value_enum)]
    location: Option<LocationFilter>,

    /// Print the listing as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum LocationFilter {
    Incoming,
    Processed,
    Unprocessed,
}

impl From<LocationFilter> for Location {
    fn from(filter: LocationFilter) -> Self {
        match filter {
            LocationFilter::Incoming => Location::Incoming,
            LocationFilter::Processed => Location::Processed,
            LocationFilter::Unprocessed => Location::Unprocessed,
        }
    }
}

/// Arguments for the delete command.
#[derive(Args)]
pub struct DeleteArgs {
    /// Document filename
    #[arg(required = true)]
    filename: String,
}

/// Arguments for the reset command.
#[derive(Args)]
pub struct ResetArgs {
    /// Confirm removal of every document and record
    #[arg(long)]
    yes: bool,
}

pub async fn run(args: StatusArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let pipeline = global.open_pipeline()?;
    let wanted = args.location.map(Location::from);

    let documents: Vec<_> = pipeline
        .documents()?
        .into_iter()
        .filter(|d| wanted.is_none() || d.location == wanted)
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&documents)?);
        return Ok(());
    }

    if documents.is_empty() {
        println!("{} No documents.", style("ℹ").blue());
        return Ok(());
    }

    for document in &documents {
        let location = match document.location {
            Some(Location::Processed) => style("processed").green(),
            Some(Location::Unprocessed) => style("unprocessed").yellow(),
            Some(Location::Incoming) => style("incoming").blue(),
            None => style("missing").red(),
        };
        let result = if document.has_result { "result" } else { "-" };
        println!("{:<12} {:<7} {}", location, result, document.filename);
    }

    Ok(())
}

pub async fn delete(args: DeleteArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let pipeline = global.open_pipeline()?;
    pipeline.delete(&args.filename)?;

    println!("{} Deleted {}", style("✓").green(), args.filename);
    Ok(())
}

pub async fn reset(args: ResetArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    if !args.yes {
        anyhow::bail!("Reset removes every document and record. Re-run with --yes to confirm.");
    }

    let pipeline = global.open_pipeline()?;
    let (documents, records) = pipeline.reset()?;

    println!(
        "{} Removed {} documents and {} records",
        style("✓").green(),
        documents,
        records
    );
    Ok(())
}
