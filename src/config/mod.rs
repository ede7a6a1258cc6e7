//! Layered YAML configuration.
//!
//! Builds one configuration tree from a default file and ordered overrides:
//! 1. **Load** - each file is parsed and its path tags resolved ([`ConfigLoader`])
//! 2. **Compose** - documents are deep-merged left to right ([`ConfigComposer`])
//! 3. **Project** - typed sections are read through [`ConfigView`]
//!
//! ## Merge Strategy
//! - Mappings: deep merge key-by-key
//! - Everything else (scalars, sequences, null): the override replaces the base
//!
//! ## Path Tags
//! - `${VAR}/suffix` (implicit on plain scalars, or explicit with `!path`) - environment interpolation
//! - `!joinPath [a, b, c]` - join segments with the host path separator
//!
//! ## Environment Variables
//! - `CONFIG_FILE` - `:`-separated list of extra configuration files
//! - any variable referenced by a `${VAR}` pattern

mod composer;
mod discovery;
mod document;
mod loader;
mod merge;
mod tree;
mod types;

pub use composer::{ConfigComposer, DEFAULT_CONFIG_FILE};
pub use discovery::{APPLICATION_FILE, CONFIG_FILE_ENV, ConfigPaths};
pub use document::{ConfigDocument, DocumentMeta, MergeRecord};
pub use loader::{ConfigLoader, JOIN_PATH_TAG, LoaderOptions, PATH_TAG};
pub use merge::{OrderedMap, deep_merge, deep_merge_all};
pub use types::*;
