//! Integration tests for configuration composition.
//!
//! Covers the full path from YAML files on disk to typed sections:
//! - path tags resolved at load time
//! - default + override composition and merge history
//! - typed views over the merged tree

use confstack::config::{ConfigComposer, ConfigLoader, ConfigPaths, ConfigView, LoaderOptions};
use confstack::error::ErrorCode;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn data_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("data")
}

fn env() -> HashMap<String, String> {
    let mut env = HashMap::new();
    env.insert("USER_HOME".to_string(), "/home/tester".to_string());
    env
}

/// Helper to create a composer with a fixed environment.
fn composer() -> ConfigComposer {
    ConfigComposer::new(ConfigLoader::new(LoaderOptions::default().with_env(env())))
}

fn root() -> String {
    Path::new("this")
        .join("is")
        .join("a")
        .join("folder")
        .to_string_lossy()
        .into_owned()
}

fn credentials() -> String {
    Path::new(&root())
        .join("myfolder")
        .join("credentials.p")
        .to_string_lossy()
        .into_owned()
}

/// The `test` section of the bundled defaults, with nothing merged on top.
fn test_view() -> ConfigView {
    let defaults = data_dir().join("defaults.yml");
    let none: [PathBuf; 0] = [];
    composer()
        .compose(&none, Some(defaults.as_path()))
        .expect("defaults load")
        .sublevel("test")
        .expect("test section")
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_sublevel_to_mapping() {
    let expected: Mapping = serde_yaml::from_str(&format!(
        "root: '{}'\nfolders: {{python: myfolder}}\nfiles: {{credentials: '{}'}}",
        root(),
        credentials()
    ))
    .unwrap();
    assert_eq!(test_view().sublevel("fs").unwrap().to_mapping(), expected);
}

#[test]
fn test_get_value_and_safe_get_value() {
    let config = test_view();
    assert_eq!(config.get_value("fs").unwrap()["root"], root().as_str());
    assert_eq!(
        config.get_value("folders").unwrap_err().code(),
        ErrorCode::KeyNotFound
    );
    assert_eq!(config.safe_get_value("fs").unwrap()["root"], root().as_str());
    assert!(config.safe_get_value("folders").is_none());
}

#[test]
fn test_env_paths_resolved_at_load() {
    let config = test_view();
    let user = config.sublevel("user").unwrap();
    assert_eq!(user.get_value("home").unwrap(), "/home/tester/app");
    assert_eq!(user.get_value("cache").unwrap(), "/home/tester/.cache");
}

#[test]
fn test_filesystem_section() {
    let fs = test_view().fs().unwrap();
    assert_eq!(fs.root, root());
    assert_eq!(fs.folder("python").unwrap(), "myfolder");
    assert_eq!(fs.file("credentials").unwrap(), credentials());
}

#[test]
fn test_auth_section() {
    let auth = test_view().auth().unwrap();
    assert_eq!(auth.method, "file");
    assert_eq!(auth.filename.as_deref(), Some(credentials().as_str()));
    assert_eq!(auth.user.as_deref(), Some("userID"));
    assert_eq!(auth.password.as_deref(), Some("passwordID"));
}

#[test]
fn test_authentication_section() {
    let auth = test_view().authentication().unwrap();
    assert!(auth.secured);
    assert_eq!(auth.ap_name, "cb");
    assert_eq!(auth.cors.as_deref(), Some("http://0.0.0.0:10001"));
    assert_eq!(
        auth.jwt_free_endpoints,
        [
            "/api/v1/health/",
            "/api/v1/auth/login",
            "/api/v1/apidocs",
            "/api/v1/swagger.json",
            "/api/v1/salesforce/",
            "/api/v1/openBanking/",
        ]
    );

    let token = auth.auth_service.expect("auth_service");
    assert_eq!(token.url, "http://0.0.0.0:10005");
    assert_eq!(token.check, "/tokens/{tok}/check");
    assert_eq!(token.decode, "/tokens/{tok}/decode");

    let check = auth.check_service.expect("check_service");
    assert_eq!(check.url, "http://0.0.0.0:10001");
    assert_eq!(check.login, "/authentication/login");
    assert_eq!(check.logout, "/authentication/logout");
}

#[test]
fn test_logging_section() {
    let logging = test_view().logging().unwrap();
    assert_eq!(logging.level, "DEBUG");
    assert_eq!(
        logging.filename.as_deref(),
        Path::new("logs").join("tests.log").to_str()
    );
    assert_eq!(
        logging.default_config_file.as_deref(),
        Path::new("confs").join("logConfDefaults.yaml").to_str()
    );
    assert!(logging.capture_warnings);
}

#[test]
fn test_override_file_merges_into_defaults() {
    let defaults = data_dir().join("defaults.yml");
    let overrides = data_dir().join("override.yml");

    let document = composer()
        .compose(&[&overrides], Some(defaults.as_path()))
        .unwrap();
    let config = document.sublevel("test").unwrap();

    // Scalars and sequences replaced
    assert_eq!(config.logging().unwrap().level, "WARNING");
    assert_eq!(
        config.authentication().unwrap().jwt_free_endpoints,
        ["/api/v2/health/"]
    );
    // Siblings survive the nested merge
    let fs = config.fs().unwrap();
    assert_eq!(fs.folder("python").unwrap(), "myfolder");
    assert_eq!(fs.folder("rust").unwrap(), "crates");
    assert!(config.logging().unwrap().capture_warnings);

    // Provenance follows the last merged file
    assert_eq!(document.filepath(), Some(overrides.as_path()));
    assert_eq!(document.history().len(), 1);
    assert_eq!(
        document.history()[0].source.as_deref(),
        Some(overrides.as_path())
    );
}

#[test]
fn test_end_to_end_two_files() {
    let temp = TempDir::new().unwrap();
    let defaults = write(&temp, "defaults.yml", "fs:\n  root: X\n");
    let overrides = write(&temp, "override.yml", "fs:\n  root: Y\n  extra: Z\n");

    let document = composer()
        .compose(&[&overrides], Some(defaults.as_path()))
        .unwrap();

    let expected: Mapping = serde_yaml::from_str("fs: {root: Y, extra: Z}").unwrap();
    assert_eq!(document.data(), &expected);
    assert_eq!(document.history().len(), 1);
    assert_eq!(document.history()[0].params, expected);
    assert_eq!(document.updated_params(), Some(&expected));
}

#[test]
fn test_overrides_applied_left_to_right() {
    let temp = TempDir::new().unwrap();
    let defaults = write(&temp, "defaults.yml", "a: 0\nb: 0\nc: 0\n");
    let first = write(&temp, "first.yml", "a: 1\nb: 1\n");
    let second = write(&temp, "second.yml", "b: 2\n");

    let document = composer()
        .compose(&[&first, &second], Some(defaults.as_path()))
        .unwrap();
    assert_eq!(document.data()["a"], 1);
    assert_eq!(document.data()["b"], 2);
    assert_eq!(document.data()["c"], 0);

    let sources: Vec<_> = document
        .history()
        .iter()
        .map(|record| record.source.clone().unwrap())
        .collect();
    assert_eq!(sources, [first, second]);
}

#[test]
fn test_interpolation_not_repeated_by_merge() {
    let temp = TempDir::new().unwrap();
    let defaults = write(&temp, "defaults.yml", "dir: ${USER_HOME}/data\n");
    let overrides = write(&temp, "override.yml", "other: 1\n");

    let document = composer()
        .compose(&[&overrides], Some(defaults.as_path()))
        .unwrap();
    assert_eq!(document.data()["dir"], "/home/tester/data");
}

#[test]
fn test_missing_env_in_default_is_composition_failure() {
    let temp = TempDir::new().unwrap();
    let defaults = write(&temp, "defaults.yml", "dir: ${NOT_DEFINED}/data\n");
    let none: [PathBuf; 0] = [];

    let err = composer()
        .compose(&none, Some(defaults.as_path()))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CompositionFailure);
    assert!(err.to_string().contains("defaults.yml"));
}

#[test]
fn test_malformed_override_aborts_composition() {
    let temp = TempDir::new().unwrap();
    let defaults = write(&temp, "defaults.yml", "a: 1\n");
    let broken = write(&temp, "broken.yml", "a: [1, 2\n");

    let err = composer()
        .compose(&[&broken], Some(defaults.as_path()))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ParseError);
}

#[test]
fn test_discovered_files_compose() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().join("project");
    std::fs::create_dir_all(&project).unwrap();
    std::fs::write(project.join("application.yml"), "level: project\nkeep: 1\n").unwrap();
    let extra = write(&temp, "extra.yml", "level: extra\n");
    let defaults = write(&temp, "defaults.yml", "level: default\n");

    let mut env = env();
    env.insert(
        "CONFIG_FILE".to_string(),
        extra.to_string_lossy().into_owned(),
    );
    let files = ConfigPaths::with_dirs(vec![project]).discover_with_env(&env);
    assert_eq!(files.len(), 2);

    let document = composer()
        .compose(&files, Some(defaults.as_path()))
        .unwrap();
    assert_eq!(document.data()["level"], "extra");
    assert_eq!(document.data()["keep"], 1);
    assert_eq!(document.history().len(), 2);
}

#[test]
fn test_loaders_with_different_envs_coexist() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "a.yml", "dir: ${ROOT}/x\n");

    let loader_for = |root: &str| {
        let mut env = HashMap::new();
        env.insert("ROOT".to_string(), root.to_string());
        ConfigLoader::new(LoaderOptions::default().with_env(env))
    };
    let first = loader_for("/one").load(&path).unwrap();
    let second = loader_for("/two").load(&path).unwrap();
    assert_eq!(first.data()["dir"], "/one/x");
    assert_eq!(second.data()["dir"], "/two/x");
}

#[test]
fn test_merge_document_api() {
    let loader = ConfigLoader::new(LoaderOptions::default().with_env(env()));
    let base = loader.load_str("test: {fs: {root: old}}").unwrap();
    let update: Mapping = serde_yaml::from_str("test: {fs: {root: new_folder}}").unwrap();

    let merged = base.merge_mapping(&update);
    assert_eq!(merged.data()["test"]["fs"]["root"], "new_folder");
    assert_eq!(merged.updated_params(), Some(&update));
    // The base is still usable and unchanged
    assert_eq!(base.data()["test"]["fs"]["root"], Value::from("old"));
}

#[test]
fn test_quoted_templates_survive_composition() {
    let temp = TempDir::new().unwrap();
    let defaults = write(
        &temp,
        "defaults.yml",
        "dir: ${USER_HOME}/data\ntemplate: '${NOT_DEFINED}/out'\nraw: !!str ${NOT_DEFINED}/raw\n",
    );
    let none: [PathBuf; 0] = [];

    let document = composer()
        .compose(&none, Some(defaults.as_path()))
        .unwrap();
    assert_eq!(document.data()["dir"], "/home/tester/data");
    assert_eq!(document.data()["template"], "${NOT_DEFINED}/out");
    assert_eq!(document.data()["raw"], "${NOT_DEFINED}/raw");
}

#[test]
fn test_merging_loaded_document_adopts_its_provenance() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "override.yml", "b: 2\n");
    let loader = ConfigLoader::new(LoaderOptions::default().with_env(env()));

    let base = loader.load_str("a: 1").unwrap();
    let other = loader.load(&path).unwrap();
    let merged = base.merge(&other);

    assert_eq!(merged.filepath(), Some(path.as_path()));
    assert_eq!(merged.loaded_at(), other.loaded_at());
    assert_eq!(merged.history().len(), 1);
    assert_eq!(merged.data()["a"], 1);
    assert_eq!(merged.data()["b"], 2);
}
