//! Loaded and merged configuration documents.

use super::merge::deep_merge;
use super::types::ConfigView;
use crate::error::{ConfigError, ConfigResult};
use chrono::{DateTime, Utc};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

/// One override applied on top of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeRecord {
    /// File the override was loaded from, if any.
    pub source: Option<PathBuf>,
    /// The override mapping exactly as it was applied.
    pub params: Mapping,
}

/// Provenance of a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMeta {
    /// File the base document was loaded from.
    pub filepath: Option<PathBuf>,
    /// When the base file was parsed.
    pub loaded_at: Option<DateTime<Utc>>,
    /// Overrides applied so far, oldest first.
    pub history: Vec<MergeRecord>,
}

/// A configuration tree plus where it came from.
///
/// Documents are never modified after construction. Merging returns a new
/// document and leaves both operands usable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    data: Mapping,
    meta: DocumentMeta,
}

impl ConfigDocument {
    /// Create a document from an in-memory mapping.
    pub fn new(data: Mapping) -> Self {
        Self {
            data,
            meta: DocumentMeta::default(),
        }
    }

    pub(crate) fn from_file(data: Mapping, path: &Path, loaded_at: DateTime<Utc>) -> Self {
        Self {
            data,
            meta: DocumentMeta {
                filepath: Some(path.to_path_buf()),
                loaded_at: Some(loaded_at),
                history: Vec::new(),
            },
        }
    }

    pub fn data(&self) -> &Mapping {
        &self.data
    }

    pub fn meta(&self) -> &DocumentMeta {
        &self.meta
    }

    pub fn filepath(&self) -> Option<&Path> {
        self.meta.filepath.as_deref()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.meta.loaded_at
    }

    pub fn history(&self) -> &[MergeRecord] {
        &self.meta.history
    }

    /// The most recently applied override mapping.
    pub fn updated_params(&self) -> Option<&Mapping> {
        self.meta.history.last().map(|record| &record.params)
    }

    /// Merge another document on top of this one.
    ///
    /// The result takes the other document's `filepath` and `loaded_at`, and
    /// records its data and file path in the history. The other document's
    /// own history is not carried over.
    pub fn merge(&self, other: &ConfigDocument) -> ConfigDocument {
        let mut merged = self.apply(&other.data, other.meta.filepath.clone());
        merged.meta.filepath = other.meta.filepath.clone();
        merged.meta.loaded_at = other.meta.loaded_at;
        merged
    }

    /// Merge a raw mapping on top of this document, keeping its provenance.
    pub fn merge_mapping(&self, params: &Mapping) -> ConfigDocument {
        self.apply(params, None)
    }

    fn apply(&self, params: &Mapping, source: Option<PathBuf>) -> ConfigDocument {
        let mut meta = self.meta.clone();
        meta.history.push(MergeRecord {
            source,
            params: params.clone(),
        });
        ConfigDocument {
            data: deep_merge(&self.data, params),
            meta,
        }
    }

    pub fn to_mapping(&self) -> Mapping {
        self.data.clone()
    }

    pub fn into_mapping(self) -> Mapping {
        self.data
    }

    /// Convert to JSON. Fails when the tree has keys JSON cannot represent.
    pub fn to_json(&self) -> ConfigResult<serde_json::Value> {
        Ok(serde_json::to_value(&self.data)?)
    }

    /// A view over the whole tree.
    pub fn view(&self) -> ConfigView {
        ConfigView::root(self.data.clone())
    }

    /// A view over the mapping stored under `key`.
    pub fn sublevel(&self, key: &str) -> ConfigResult<ConfigView> {
        self.view().sublevel(key)
    }

    pub fn get_value(&self, key: &str) -> ConfigResult<&Value> {
        self.data
            .get(key)
            .ok_or_else(|| ConfigError::key_not_found(key))
    }

    pub fn safe_get_value(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

impl From<Mapping> for ConfigDocument {
    fn from(data: Mapping) -> Self {
        Self::new(data)
    }
}
