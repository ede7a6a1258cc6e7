//! Layered YAML configuration library.
//!
//! This module exports the loader, merger and composer plus the typed views
//! used by the `confstack` binary.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use config::{ConfigComposer, ConfigDocument, ConfigLoader, ConfigView, LoaderOptions};
pub use error::{ConfigError, ConfigResult, ErrorCode};
