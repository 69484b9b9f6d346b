//! Subcommands.

pub mod add;
pub mod config;
pub mod export;
pub mod process;
pub mod status;
pub mod templates;
pub mod text;

use std::path::{Path, PathBuf};

use console::style;
use tracing::{debug, warn};

use docket_core::models::{OutcomeStatus, ProcessOutcome, TextBackend};
use docket_core::tool::command_available;
use docket_core::{DocketConfig, Pipeline};

/// Options shared by every subcommand.
pub struct GlobalArgs {
    pub config: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl GlobalArgs {
    /// The config file in effect: `--config`, or the per-user default.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(default_config_path)
    }

    /// Load the configuration, falling back to defaults when no file exists.
    pub fn load_config(&self) -> anyhow::Result<DocketConfig> {
        let path = self.config_path();
        let config = if path.exists() {
            debug!("Loading config from {}", path.display());
            DocketConfig::from_file(&path)?
        } else if self.config.is_some() {
            anyhow::bail!("Config file not found: {}", path.display());
        } else {
            DocketConfig::default()
        };

        Ok(match &self.data_dir {
            Some(dir) => config.with_data_dir(dir),
            None => config,
        })
    }

    pub fn open_pipeline(&self) -> anyhow::Result<Pipeline> {
        let config = self.load_config()?;

        let tools = &config.tools;
        if tools.text_backend == TextBackend::External && !command_available(&tools.text_program) {
            warn!("{} is not installed, fallback extraction will fail", tools.text_program);
        }
        if !command_available(&tools.primary_program) {
            debug!("{} is not installed, every document takes the fallback path", tools.primary_program);
        }

        Ok(Pipeline::from_config(config)?)
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docket")
        .join("config.json")
}

/// Print one processing outcome.
pub fn print_outcome(outcome: &ProcessOutcome) {
    match outcome.status {
        OutcomeStatus::Success => println!(
            "{} {} -> {}",
            style("✓").green(),
            outcome.filename,
            style(outcome.location).green()
        ),
        OutcomeStatus::Failed => println!(
            "{} {} -> {}: {}",
            style("✗").red(),
            outcome.filename,
            style(outcome.location).yellow(),
            outcome.message
        ),
    }
}

/// Display name of a path for messages.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(String::from)
        .unwrap_or_else(|| path.display().to_string())
}
