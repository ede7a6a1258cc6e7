//! Composition of a default document with ordered overrides.

use super::document::ConfigDocument;
use super::loader::ConfigLoader;
use crate::error::{ConfigError, ConfigResult};
use std::path::{Path, PathBuf};
use tracing::info;

/// Conventional name of the default configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "defaults.yml";

/// Folds a default document and override files into one document.
#[derive(Debug, Clone, Default)]
pub struct ConfigComposer {
    loader: ConfigLoader,
}

impl ConfigComposer {
    pub fn new(loader: ConfigLoader) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &ConfigLoader {
        &self.loader
    }

    /// Load `default` (or the first file when there is no default) and merge
    /// the remaining files on top of it, left to right.
    ///
    /// A base that cannot be loaded fails with [`ConfigError::Composition`].
    /// Errors from override files abort the whole composition as they are.
    pub fn compose<P: AsRef<Path>>(
        &self,
        files: &[P],
        default: Option<&Path>,
    ) -> ConfigResult<ConfigDocument> {
        let mut ordered: Vec<PathBuf> = Vec::with_capacity(files.len() + 1);
        if let Some(default) = default {
            ordered.push(default.to_path_buf());
        }
        ordered.extend(files.iter().map(|file| file.as_ref().to_path_buf()));

        let Some((base_path, overrides)) = ordered.split_first() else {
            return Err(ConfigError::NothingToCompose);
        };

        info!(file = %base_path.display(), "Using default configuration file");
        let base = self
            .loader
            .load(base_path)
            .map_err(|err| ConfigError::composition(base_path, err))?;

        overrides
            .iter()
            .try_fold(base, |merged, path| -> ConfigResult<ConfigDocument> {
                info!(file = %path.display(), "Merging configuration file");
                let next = self.loader.load(path)?;
                Ok(merged.merge(&next))
            })
    }
}
