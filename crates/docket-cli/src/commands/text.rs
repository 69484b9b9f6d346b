//! Text command - print the raw text the fallback path sees.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;

use super::GlobalArgs;

/// Arguments for the text command.
#[derive(Args)]
pub struct TextArgs {
    /// Document filename
    #[arg(required = true)]
    filename: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub async fn run(args: TextArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let pipeline = global.open_pipeline()?;
    let text = pipeline.extract_text(&args.filename)?;

    match &args.output {
        Some(path) => {
            fs::write(path, &text)?;
            println!(
                "{} Text written to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", text),
    }

    Ok(())
}
