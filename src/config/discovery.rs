//! Discovery of configuration files.
//!
//! Files are gathered in a fixed order:
//! 1. `<dir>/<file_name>` for every search directory where it exists
//! 2. Every entry of the `CONFIG_FILE` environment variable (`:`-separated)
//!
//! The result feeds [`ConfigComposer::compose`](super::ConfigComposer::compose)
//! as its ordered override list.

use crate::paths::{EnvSource, ProcessEnv};
use std::path::PathBuf;
use tracing::info;

/// Conventional name of per-directory configuration files.
pub const APPLICATION_FILE: &str = "application.yml";

/// Environment variable naming extra configuration files.
pub const CONFIG_FILE_ENV: &str = "CONFIG_FILE";

/// Where to look for configuration files.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Directories scanned for `file_name`, in order.
    pub search_dirs: Vec<PathBuf>,
    /// File name looked up in every search directory.
    pub file_name: String,
    /// Environment variable holding a `:`-separated list of extra files.
    pub env_var: String,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::with_dirs(default_search_dirs())
    }
}

impl ConfigPaths {
    /// Create paths with explicit search directories and default names.
    pub fn with_dirs(search_dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs,
            file_name: APPLICATION_FILE.to_string(),
            env_var: CONFIG_FILE_ENV.to_string(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn with_env_var(mut self, env_var: impl Into<String>) -> Self {
        self.env_var = env_var.into();
        self
    }

    /// Discover configuration files using the process environment.
    pub fn discover(&self) -> Vec<PathBuf> {
        self.discover_with_env(&ProcessEnv)
    }

    /// Discover configuration files using an explicit environment.
    pub fn discover_with_env(&self, env: &dyn EnvSource) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = self
            .search_dirs
            .iter()
            .map(|dir| dir.join(&self.file_name))
            .filter(|path| path.is_file())
            .collect();

        if let Some(value) = env.var(&self.env_var) {
            files.extend(
                value
                    .split(':')
                    .filter(|entry| !entry.is_empty())
                    .map(PathBuf::from),
            );
        }

        let listed: Vec<String> = files.iter().map(|p| p.display().to_string()).collect();
        info!(files = %listed.join(", "), "Using configuration files");
        files
    }
}

/// Current directory, then the user configuration directory.
fn default_search_dirs() -> Vec<PathBuf> {
    let mut dirs_found = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs_found.push(cwd);
    }
    if let Some(config_dir) = dirs::config_dir() {
        dirs_found.push(config_dir);
    }
    dirs_found
}
