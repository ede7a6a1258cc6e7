//! Typed views over sections of a merged configuration.
//!
//! A [`ConfigView`] is an owned sub-tree of a document plus the dotted key
//! path that leads to it. Section structs are declared statically and are
//! projected from a view with serde, never through dynamic attribute lookup.

use super::loader::node_kind;
use crate::error::{ConfigError, ConfigResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use tracing::Level;

/// A configuration sub-tree, treated as a configuration in its own right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigView {
    path: Vec<String>,
    data: Mapping,
}

impl ConfigView {
    /// A view over a whole tree.
    pub fn root(data: Mapping) -> Self {
        Self {
            path: Vec::new(),
            data,
        }
    }

    /// Dotted key path from the document root (empty for the root itself).
    pub fn path(&self) -> String {
        self.path.join(".")
    }

    pub fn data(&self) -> &Mapping {
        &self.data
    }

    pub fn to_mapping(&self) -> Mapping {
        self.data.clone()
    }

    fn child_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path(), key)
        }
    }

    /// The mapping stored under `key`, as a new view.
    pub fn sublevel(&self, key: &str) -> ConfigResult<ConfigView> {
        let value = self
            .data
            .get(key)
            .ok_or_else(|| ConfigError::key_not_found(self.child_path(key)))?;
        match value {
            Value::Mapping(map) => {
                let mut path = self.path.clone();
                path.push(key.to_string());
                Ok(ConfigView {
                    path,
                    data: map.clone(),
                })
            }
            other => Err(ConfigError::NotAMapping {
                path: self.child_path(key),
                found: node_kind(other),
            }),
        }
    }

    /// Walk a dotted path such as `test.fs` one sublevel at a time.
    pub fn select(&self, dotted: &str) -> ConfigResult<ConfigView> {
        dotted
            .split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self.clone(), |view, key| view.sublevel(key))
    }

    /// Value stored under `key`; missing keys are an error.
    pub fn get_value(&self, key: &str) -> ConfigResult<&Value> {
        self.data
            .get(key)
            .ok_or_else(|| ConfigError::key_not_found(self.child_path(key)))
    }

    /// String stored under `key`.
    pub fn get_str(&self, key: &str) -> ConfigResult<&str> {
        let value = self.get_value(key)?;
        value.as_str().ok_or_else(|| ConfigError::NotAString {
            key: self.child_path(key),
            found: node_kind(value),
        })
    }

    /// Value stored under `key`, or `None`.
    pub fn safe_get_value(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Value at a dotted path, descending through nested mappings.
    pub fn lookup(&self, dotted: &str) -> Option<&Value> {
        let mut segments = dotted.split('.').filter(|segment| !segment.is_empty());
        let first = segments.next()?;
        segments.try_fold(self.data.get(first)?, |value, key| value.get(key))
    }

    /// Deserialize this whole sub-tree into `T`.
    pub fn deserialize<T: DeserializeOwned>(&self) -> ConfigResult<T> {
        serde_yaml::from_value(Value::Mapping(self.data.clone())).map_err(|source| {
            ConfigError::Deserialize {
                section: self.path(),
                source,
            }
        })
    }

    /// Project the section `S` stored under its conventional key.
    pub fn section<S: Section>(&self) -> ConfigResult<S> {
        S::from_view(&self.sublevel(S::KEY)?)
    }

    pub fn logging(&self) -> ConfigResult<LoggingConfig> {
        self.section()
    }

    pub fn fs(&self) -> ConfigResult<FileSystemConfig> {
        self.section()
    }

    pub fn auth(&self) -> ConfigResult<AuthConfig> {
        self.section()
    }

    pub fn authentication(&self) -> ConfigResult<AuthenticationServiceConfig> {
        self.section()
    }
}

/// A statically declared configuration section.
pub trait Section: DeserializeOwned {
    /// Key the section lives under in its parent.
    const KEY: &'static str;

    fn from_view(view: &ConfigView) -> ConfigResult<Self> {
        view.deserialize()
    }
}

/// Logging section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level name, e.g. `DEBUG` or `WARNING`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path.
    #[serde(default)]
    pub filename: Option<String>,

    /// Path of an external logging configuration file.
    #[serde(default)]
    pub default_config_file: Option<String>,

    #[serde(default)]
    pub capture_warnings: bool,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl LoggingConfig {
    /// The configured level as a tracing level, if the name is recognised.
    pub fn tracing_level(&self) -> Option<Level> {
        crate::logging::level_from_name(&self.level)
    }
}

impl Section for LoggingConfig {
    const KEY: &'static str = "logging";
}

/// Filesystem section: a root plus named folders and files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSystemConfig {
    pub root: String,

    #[serde(default)]
    pub folders: BTreeMap<String, String>,

    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

impl FileSystemConfig {
    pub fn folder(&self, name: &str) -> ConfigResult<&str> {
        self.folders
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::key_not_found(format!("fs.folders.{}", name)))
    }

    pub fn file(&self, name: &str) -> ConfigResult<&str> {
        self.files
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::key_not_found(format!("fs.files.{}", name)))
    }
}

impl Section for FileSystemConfig {
    const KEY: &'static str = "fs";
}

/// Credentials section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// How credentials are provided, e.g. `file`.
    pub method: String,

    #[serde(default)]
    pub filename: Option<String>,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

impl Section for AuthConfig {
    const KEY: &'static str = "auth";
}

/// Endpoints of the token service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthServiceConfig {
    pub url: String,
    pub check: String,
    pub decode: String,
}

/// Endpoints of the login service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckServiceConfig {
    pub url: String,
    pub login: String,
    pub logout: String,
}

/// Authentication service section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticationServiceConfig {
    #[serde(default)]
    pub secured: bool,

    pub ap_name: String,

    #[serde(default)]
    pub cors: Option<String>,

    /// Endpoints reachable without a token.
    #[serde(default)]
    pub jwt_free_endpoints: Vec<String>,

    #[serde(default)]
    pub auth_service: Option<AuthServiceConfig>,

    #[serde(default)]
    pub check_service: Option<CheckServiceConfig>,
}

impl Section for AuthenticationServiceConfig {
    const KEY: &'static str = "authentication";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn view(src: &str) -> ConfigView {
        ConfigView::root(serde_yaml::from_str(src).unwrap())
    }

    #[test]
    fn test_sublevel_tracks_path() {
        let root = view("test: {fs: {root: X}}");
        let fs = root.select("test.fs").unwrap();
        assert_eq!(fs.path(), "test.fs");
        assert_eq!(fs.get_value("root").unwrap(), "X");
    }

    #[test]
    fn test_sublevel_errors() {
        let root = view("test: {fs: {root: X}}");
        let err = root.sublevel("missing").unwrap_err();
        assert_eq!(err.code(), ErrorCode::KeyNotFound);

        let err = root.select("test.fs.root").unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotAMapping);
        assert!(err.to_string().contains("test.fs.root"));
    }

    #[test]
    fn test_get_and_safe_get() {
        let fs = view("root: X\nfolders: {python: myfolder}");
        assert_eq!(fs.get_value("root").unwrap(), "X");
        assert!(fs.get_value("files").is_err());
        assert!(fs.safe_get_value("files").is_none());
    }

    #[test]
    fn test_get_str() {
        let fs = view("root: X\ndepth: 2");
        assert_eq!(fs.get_str("root").unwrap(), "X");
        assert_eq!(
            fs.get_str("files").unwrap_err().code(),
            ErrorCode::KeyNotFound
        );
        let nested = view("fs: {depth: 2}").sublevel("fs").unwrap();
        let err = nested.get_str("depth").unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotAString);
        assert!(err.to_string().contains("fs.depth"));
    }

    #[test]
    fn test_lookup_dotted() {
        let root = view("a: {b: {c: [1, 2]}}");
        assert_eq!(
            root.lookup("a.b.c"),
            Some(&serde_yaml::from_str::<Value>("[1, 2]").unwrap())
        );
        assert!(root.lookup("a.x").is_none());
        assert!(root.lookup("").is_none());
    }

    #[test]
    fn test_filesystem_section() {
        let root = view(
            "fs:\n  root: /data\n  folders: {python: myfolder}\n  files: {credentials: /data/c.p}",
        );
        let fs = root.fs().unwrap();
        assert_eq!(fs.root, "/data");
        assert_eq!(fs.folder("python").unwrap(), "myfolder");
        assert_eq!(fs.file("credentials").unwrap(), "/data/c.p");
        assert_eq!(
            fs.folder("java").unwrap_err().code(),
            ErrorCode::KeyNotFound
        );
    }

    #[test]
    fn test_logging_section_defaults() {
        let root = view("logging: {filename: app.log}");
        let logging = root.logging().unwrap();
        assert_eq!(logging.level, "INFO");
        assert!(!logging.capture_warnings);
        assert_eq!(logging.tracing_level(), Some(Level::INFO));
    }

    #[test]
    fn test_section_type_mismatch() {
        let root = view("auth: {method: [not, a, string]}");
        let err = root.auth().unwrap_err();
        assert_eq!(err.code(), ErrorCode::DeserializeError);
        assert!(err.to_string().contains("auth"));
    }

    #[test]
    fn test_authentication_section() {
        let root = view(
            r#"
authentication:
  secured: true
  ap_name: cb
  jwt_free_endpoints: [/api/v1/health/]
  check_service:
    url: http://0.0.0.0:10001
    login: /authentication/login
    logout: /authentication/logout
"#,
        );
        let auth = root.authentication().unwrap();
        assert!(auth.secured);
        assert_eq!(auth.jwt_free_endpoints, ["/api/v1/health/"]);
        assert!(auth.auth_service.is_none());
        assert_eq!(
            auth.check_service.unwrap().login,
            "/authentication/login"
        );
    }
}
