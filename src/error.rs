//! Structured error types for configuration loading and composition.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Tag resolution errors
    MalformedPathPattern,
    MissingEnvironmentVariable,
    WrongNodeType,
    UnknownTag,
    EmptyJoinPath,

    // Document errors
    ParseError,
    IoError,
    NotAMapping,
    KeyNotFound,
    NotAString,
    DeserializeError,

    // Composition errors
    CompositionFailure,
    NothingToCompose,

    // Internal errors
    InternalError,
}

/// Everything that can go wrong while loading, composing or projecting configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A scalar handed to the path handler does not start with `${NAME}`.
    #[error("malformed path pattern '{value}': expected '${{ENV_VAR}}' followed by an optional suffix")]
    MalformedPathPattern { value: String },

    #[error(
        "missing definition of environment variable {name} needed when parsing configuration file"
    )]
    MissingEnvironmentVariable { name: String },

    #[error("tag !{tag} expects a {expected} node, found {found}")]
    WrongNodeType {
        tag: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("no constructor registered for tag {tag}")]
    UnknownTag { tag: String },

    #[error("!joinPath needs at least one path segment")]
    EmptyJoinPath,

    /// The YAML text itself is invalid.
    #[error("failed to parse {}: {message}", display_origin(.path))]
    Parse {
        path: Option<PathBuf>,
        message: String,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a mapping (found {found})")]
    NotAMapping { path: String, found: &'static str },

    #[error("key not found: {key}")]
    KeyNotFound { key: String },

    #[error("{key} is not a string (found {found})")]
    NotAString { key: String, found: &'static str },

    #[error("cannot project '{section}': {source}")]
    Deserialize {
        section: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cannot load base configuration {}: {source}", .path.display())]
    Composition {
        path: PathBuf,
        #[source]
        source: Box<ConfigError>,
    },

    #[error("no configuration files to compose")]
    NothingToCompose,

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::MalformedPathPattern { .. } => ErrorCode::MalformedPathPattern,
            ConfigError::MissingEnvironmentVariable { .. } => {
                ErrorCode::MissingEnvironmentVariable
            }
            ConfigError::WrongNodeType { .. } => ErrorCode::WrongNodeType,
            ConfigError::UnknownTag { .. } => ErrorCode::UnknownTag,
            ConfigError::EmptyJoinPath => ErrorCode::EmptyJoinPath,
            ConfigError::Parse { .. } => ErrorCode::ParseError,
            ConfigError::Io { .. } => ErrorCode::IoError,
            ConfigError::NotAMapping { .. } => ErrorCode::NotAMapping,
            ConfigError::KeyNotFound { .. } => ErrorCode::KeyNotFound,
            ConfigError::NotAString { .. } => ErrorCode::NotAString,
            ConfigError::Deserialize { .. } => ErrorCode::DeserializeError,
            ConfigError::Composition { .. } => ErrorCode::CompositionFailure,
            ConfigError::NothingToCompose => ErrorCode::NothingToCompose,
            ConfigError::Json(_) => ErrorCode::InternalError,
        }
    }

    pub fn key_not_found(key: impl Into<String>) -> Self {
        ConfigError::KeyNotFound { key: key.into() }
    }

    pub fn wrong_node_type(tag: &str, expected: &'static str, found: &'static str) -> Self {
        ConfigError::WrongNodeType {
            tag: tag.to_string(),
            expected,
            found,
        }
    }

    /// Wrap a failure to load the first document of a composition.
    pub fn composition(path: impl Into<PathBuf>, source: ConfigError) -> Self {
        ConfigError::Composition {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

fn display_origin(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "<string>".to_string(),
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
