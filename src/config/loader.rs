//! Single-file configuration loader.
//!
//! Parses YAML events with `yaml-rust2` and builds a `serde_yaml` tree with
//! the path tag handlers applied node by node. The handlers are carried by an
//! explicit [`LoaderOptions`] value rather than registered globally, so
//! loaders with different environments can coexist in one process.

use super::document::ConfigDocument;
use super::tree::TreeBuilder;
use crate::error::{ConfigError, ConfigResult};
use crate::paths::{EnvSource, PathResolver, ProcessEnv};
use chrono::Utc;
use serde_yaml::{Mapping, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use yaml_rust2::parser::Parser;

/// Default tag for environment interpolation.
pub const PATH_TAG: &str = "path";

/// Default tag for joining path segments.
pub const JOIN_PATH_TAG: &str = "joinPath";

/// Parser configuration: which tags exist and how they resolve.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Environment used to expand `${VAR}` references.
    pub env: Arc<dyn EnvSource>,
    /// Resolve plain, untagged scalars that start with `${VAR}` as if tagged `!path`.
    pub implicit_paths: bool,
    /// Tag name (without `!`) of the interpolation handler.
    pub path_tag: String,
    /// Tag name (without `!`) of the join handler.
    pub join_tag: String,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            env: Arc::new(ProcessEnv),
            implicit_paths: true,
            path_tag: PATH_TAG.to_string(),
            join_tag: JOIN_PATH_TAG.to_string(),
        }
    }
}

impl LoaderOptions {
    /// Use a custom environment source.
    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Enable or disable implicit `${VAR}` resolution of untagged scalars.
    pub fn with_implicit_paths(mut self, enabled: bool) -> Self {
        self.implicit_paths = enabled;
        self
    }
}

/// Loads one YAML file into a [`ConfigDocument`] with path tags resolved.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    options: LoaderOptions,
    resolver: PathResolver,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(LoaderOptions::default())
    }
}

impl ConfigLoader {
    pub fn new(options: LoaderOptions) -> Self {
        let resolver = PathResolver::new(Arc::clone(&options.env));
        Self { options, resolver }
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Load configuration from a file.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> ConfigResult<ConfigDocument> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let data = self.parse_mapping(&content, Some(path))?;
        debug!(file = %path.display(), keys = data.len(), "Loaded configuration file");
        Ok(ConfigDocument::from_file(data, path, Utc::now()))
    }

    /// Load configuration from an in-memory YAML string.
    pub fn load_str(&self, content: &str) -> ConfigResult<ConfigDocument> {
        let data = self.parse_mapping(content, None)?;
        Ok(ConfigDocument::new(data))
    }

    /// Parse YAML and resolve every tag, returning the raw value.
    pub fn parse_value(&self, content: &str, origin: Option<&Path>) -> ConfigResult<Value> {
        let mut builder = TreeBuilder::new(&self.options, &self.resolver, origin);
        let scanned = Parser::new_from_str(content).load(&mut builder, false);
        builder.finish(scanned)
    }

    fn parse_mapping(&self, content: &str, origin: Option<&Path>) -> ConfigResult<Mapping> {
        match self.parse_value(content, origin)? {
            Value::Mapping(map) => Ok(map),
            // Empty document
            Value::Null => Ok(Mapping::new()),
            other => Err(ConfigError::NotAMapping {
                path: origin
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<document root>".to_string()),
                found: node_kind(&other),
            }),
        }
    }
}

/// Human-readable name of a node's kind, for error messages.
pub(crate) fn node_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged node",
    }
}
