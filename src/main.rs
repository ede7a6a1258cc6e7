//! confstack
//!
//! Compose a default YAML configuration with ordered overrides and print the
//! result, a single value, or the merge history.

use anyhow::{Context, Result};
use clap::Parser;
use confstack::cli::{Cli, Command, ComposeArgs, OutputFormat};
use confstack::config::{ConfigComposer, ConfigDocument, ConfigPaths};
use confstack::logging::{self, LogTarget};
use serde_yaml::Value;
use tracing::{Level, debug};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    logging::init(&LogTarget::parse(&cli.log), level)?;

    match cli.command {
        Command::Show {
            compose,
            section,
            format,
        } => {
            let document = compose_from_args(&compose)?;
            let data = match section {
                Some(section) => document.view().select(&section)?.to_mapping(),
                None => document.into_mapping(),
            };
            print_value(&Value::Mapping(data), format)?;
        }
        Command::Get {
            key,
            compose,
            format,
        } => {
            let document = compose_from_args(&compose)?;
            let view = document.view();
            let value = view
                .lookup(&key)
                .with_context(|| format!("key not found: {}", key))?;
            print_value(value, format)?;
        }
        Command::History { compose } => {
            let document = compose_from_args(&compose)?;
            print_history(&document)?;
        }
        Command::Sources => {
            for path in ConfigPaths::default().discover() {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}

/// Build the override list from the arguments and compose it.
fn compose_from_args(args: &ComposeArgs) -> Result<ConfigDocument> {
    let mut files = args.files.clone();
    if args.discover {
        files.extend(ConfigPaths::default().discover());
    }
    debug!(count = files.len(), "Composing configuration");

    let document = ConfigComposer::default().compose(&files, args.default_file())?;
    Ok(document)
}

fn print_value(value: &Value, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn print_history(document: &ConfigDocument) -> Result<()> {
    if let Some(latest) = document.filepath() {
        println!("# last loaded: {}", latest.display());
    }
    for (index, record) in document.history().iter().enumerate() {
        let source = record
            .source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<in-memory>".to_string());
        println!("# [{}] {}", index + 1, source);
        print!("{}", serde_yaml::to_string(&record.params)?);
    }
    Ok(())
}
