//! Templates command - author and inspect fallback templates.

use clap::{Args, Subcommand};
use console::style;

use docket_core::error::TemplateError;
use docket_core::ExtractionTemplate;

use super::GlobalArgs;

/// Arguments for the templates command.
#[derive(Args)]
pub struct TemplatesArgs {
    #[command(subcommand)]
    command: TemplatesCommand,
}

#[derive(Subcommand)]
enum TemplatesCommand {
    /// List fallback templates
    List,

    /// Print a template
    Show {
        /// Template name
        name: String,
    },

    /// Create a template for an issuer
    New(NewArgs),

    /// Apply a template to a document without recording the result
    Test {
        /// Template name
        name: String,
        /// Document filename
        filename: String,
    },
}

#[derive(Args)]
struct NewArgs {
    /// Issuer the template is written for
    issuer: String,

    /// Template name (default: issuer in lower case with a _raw suffix)
    #[arg(short, long)]
    name: Option<String>,

    /// Field rule as name=pattern, repeatable
    #[arg(short, long = "field", value_parser = parse_field)]
    fields: Vec<(String, String)>,

    /// Overwrite an existing template
    #[arg(long)]
    force: bool,
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    let (name, pattern) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=pattern, got {:?}", s))?;
    if name.trim().is_empty() {
        return Err("field name is empty".to_string());
    }
    Ok((name.trim().to_string(), pattern.to_string()))
}

pub async fn run(args: TemplatesArgs, global: &GlobalArgs) -> anyhow::Result<()> {
    let pipeline = global.open_pipeline()?;
    let store = pipeline.templates();

    match args.command {
        TemplatesCommand::List => {
            let templates = store.load_all()?;
            if templates.is_empty() {
                println!(
                    "{} No templates in {}",
                    style("ℹ").blue(),
                    store.dir().display()
                );
            }
            for (name, template) in &templates {
                println!(
                    "{:<24} {} ({} fields)",
                    name,
                    template.issuer.as_deref().unwrap_or("-"),
                    template.fields.len()
                );
            }
        }
        TemplatesCommand::Show { name } => {
            let template = store.load(&name)?;
            print!("{}", serde_yaml::to_string(&template)?);
        }
        TemplatesCommand::New(new_args) => {
            let name = new_args
                .name
                .unwrap_or_else(|| default_name(&new_args.issuer));

            match store.load(&name) {
                Ok(_) if !new_args.force => anyhow::bail!(
                    "Template {} already exists. Use --force to overwrite.",
                    name
                ),
                Ok(_) | Err(TemplateError::NotFound(_)) => {}
                Err(e) => return Err(e.into()),
            }

            let template = new_args
                .fields
                .into_iter()
                .fold(ExtractionTemplate::scaffold(new_args.issuer), |t, (field, pattern)| {
                    t.with_field(field, pattern.as_str())
                });
            let path = store.save(&name, &template)?;

            println!(
                "{} Created template {} at {}",
                style("✓").green(),
                name,
                path.display()
            );
        }
        TemplatesCommand::Test { name, filename } => {
            let fields = pipeline.try_template(&name, &filename)?;
            println!("{}", serde_json::to_string_pretty(&fields)?);
        }
    }

    Ok(())
}

fn default_name(issuer: &str) -> String {
    let slug: String = issuer
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_raw", slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field() {
        assert_eq!(
            parse_field(r"amount=Total:\s*(\S+)").unwrap(),
            ("amount".to_string(), r"Total:\s*(\S+)".to_string())
        );
        assert!(parse_field("amount").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn test_default_name() {
        assert_eq!(default_name("Acme Corp"), "acme_corp_raw");
    }
}
