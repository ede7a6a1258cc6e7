//! CLI command definitions for confstack
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for printed configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Compose and inspect layered YAML configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Which files to compose.
#[derive(Args, Debug, Clone)]
pub struct ComposeArgs {
    /// Override files, merged left to right
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Default configuration file (lowest precedence)
    #[arg(short, long, value_name = "FILE", default_value = crate::config::DEFAULT_CONFIG_FILE)]
    pub default: PathBuf,

    /// Do not load a default file; the first FILE becomes the base
    #[arg(long, conflicts_with = "default")]
    pub no_default: bool,

    /// Also merge discovered files (search dirs, then $CONFIG_FILE) after FILEs
    #[arg(long)]
    pub discover: bool,
}

impl ComposeArgs {
    /// The default file to use, if any.
    pub fn default_file(&self) -> Option<&std::path::Path> {
        (!self.no_default).then_some(self.default.as_path())
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the merged configuration
    Show {
        #[command(flatten)]
        compose: ComposeArgs,

        /// Only print the section at this dotted path (e.g. test.fs)
        #[arg(short, long)]
        section: Option<String>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,
    },

    /// Print a single value by dotted path
    Get {
        /// Dotted key path, e.g. logging.level
        key: String,

        #[command(flatten)]
        compose: ComposeArgs,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,
    },

    /// Print the overrides applied on top of the base, in order
    History {
        #[command(flatten)]
        compose: ComposeArgs,
    },

    /// List configuration files found by discovery
    Sources,
}
