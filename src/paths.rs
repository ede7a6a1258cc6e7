//! Path resolution for YAML tag handlers.
//!
//! Two constructs are turned into plain path strings while a document is loaded:
//! - `${ENV_VAR}<suffix>` scalars, resolved against an [`EnvSource`]
//! - `!joinPath [a, b, c]` sequences, joined with the host separator
//!
//! Resolution is eager. Nothing downstream of the loader ever sees an
//! unresolved `${...}` pattern or a `!joinPath` node.

use crate::error::{ConfigError, ConfigResult};
use regex_lite::Regex;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

/// `${NAME}` anchored at the start of the scalar; the rest is a literal suffix.
static PATH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\{([^}^{]+)\}").expect("path pattern is valid"));

/// Source of environment variable values used during interpolation.
pub trait EnvSource: fmt::Debug + Send + Sync {
    /// Look up a variable, returning `None` when it is unset.
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Returns true when `value` starts with a `${NAME}` reference.
pub fn matches_path_pattern(value: &str) -> bool {
    PATH_PATTERN.is_match(value)
}

/// Resolves path-like scalars and joins path segments.
#[derive(Debug, Clone)]
pub struct PathResolver {
    env: Arc<dyn EnvSource>,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(Arc::new(ProcessEnv))
    }
}

impl PathResolver {
    pub fn new(env: Arc<dyn EnvSource>) -> Self {
        Self { env }
    }

    /// Expand a leading `${NAME}` with the variable's value and keep the suffix verbatim.
    ///
    /// `${HOME}/sub` with `HOME=/users/me` becomes `/users/me/sub`. There is no
    /// default substitution: an unset variable is an error naming it.
    pub fn interpolate(&self, value: &str) -> ConfigResult<String> {
        let captures = PATH_PATTERN
            .captures(value)
            .ok_or_else(|| ConfigError::MalformedPathPattern {
                value: value.to_string(),
            })?;
        let whole = captures.get(0).map(|m| m.end()).unwrap_or_default();
        let name = captures.get(1).map(|m| m.as_str()).unwrap_or_default();

        let resolved = self
            .env
            .var(name)
            .ok_or_else(|| ConfigError::MissingEnvironmentVariable {
                name: name.to_string(),
            })?;
        Ok(format!("{}{}", resolved, &value[whole..]))
    }

    /// Join already-resolved segments, left to right, with native path semantics.
    pub fn join<S: AsRef<str>>(&self, segments: &[S]) -> ConfigResult<String> {
        join_segments(segments)
    }
}

/// Join path segments as sequential `PathBuf::push` calls.
///
/// An absolute segment restarts the path, matching native join behaviour.
pub fn join_segments<S: AsRef<str>>(segments: &[S]) -> ConfigResult<String> {
    if segments.is_empty() {
        return Err(ConfigError::EmptyJoinPath);
    }
    let mut path = PathBuf::new();
    for segment in segments {
        path.push(segment.as_ref());
    }
    Ok(path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::path::Path;

    fn resolver_with(vars: &[(&str, &str)]) -> PathResolver {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PathResolver::new(Arc::new(env))
    }

    #[test]
    fn test_interpolate_keeps_suffix() {
        let resolver = resolver_with(&[("HOME", "/users/me")]);
        assert_eq!(resolver.interpolate("${HOME}/sub").unwrap(), "/users/me/sub");
        assert_eq!(resolver.interpolate("${HOME}").unwrap(), "/users/me");
    }

    #[test]
    fn test_interpolate_only_expands_leading_reference() {
        let resolver = resolver_with(&[("A", "x"), ("B", "y")]);
        assert_eq!(resolver.interpolate("${A}/${B}").unwrap(), "x/${B}");
    }

    #[test]
    fn test_interpolate_missing_variable() {
        let resolver = resolver_with(&[]);
        let err = resolver.interpolate("${MISSING}/sub").unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingEnvironmentVariable);
        match err {
            ConfigError::MissingEnvironmentVariable { name } => assert_eq!(name, "MISSING"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_interpolate_malformed() {
        let resolver = resolver_with(&[("HOME", "/users/me")]);
        for value in ["plain/path", "prefix/${HOME}", "${}", "${HOME"] {
            let err = resolver.interpolate(value).unwrap_err();
            assert_eq!(err.code(), ErrorCode::MalformedPathPattern, "{value}");
        }
    }

    #[test]
    fn test_pattern_rejects_nested_braces() {
        assert!(matches_path_pattern("${HOME}/x"));
        assert!(!matches_path_pattern("${HO{ME}/x"));
        assert!(!matches_path_pattern("x${HOME}"));
    }

    #[test]
    fn test_join_matches_native_join() {
        let joined = join_segments(&["a", "b", "c"]).unwrap();
        let expected = Path::new("a").join("b").join("c");
        assert_eq!(joined, expected.to_string_lossy());
    }

    #[test]
    fn test_join_empty_is_error() {
        let empty: [&str; 0] = [];
        assert_eq!(
            join_segments(&empty).unwrap_err().code(),
            ErrorCode::EmptyJoinPath
        );
    }
}
