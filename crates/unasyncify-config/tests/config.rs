use std::fs;
use tempfile::TempDir;
use unasyncify_config::{ConfigError, ProjectConfig};

#[test]
fn test_load_from_project_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("pyproject.toml"),
        r#"
[project]
name = "sample"

[tool.unasyncify]
paths_to_visit = ["pkg/db"]
unasync_helpers_path = "pkg/unasync_utils.py"
async_marker = "RUNNING_ASYNC"
"#,
    )
    .unwrap();

    let config = ProjectConfig::from_project_path(dir.path()).unwrap();
    assert_eq!(config.project_base, dir.path());
    assert_eq!(config.paths_to_visit, vec![dir.path().join("pkg/db")]);
    assert_eq!(config.unasync_helpers_import_path, "pkg.unasync_utils");
    assert_eq!(
        config.codegen_template_path(),
        dir.path().join("pkg/unasync_utils.py")
    );

    let options = config.transform_options();
    assert_eq!(options.async_marker, "RUNNING_ASYNC");
    assert_eq!(options.rename_table().get("RUNNING_ASYNC"), Some("False"));
}

#[test]
fn test_missing_descriptor() {
    let dir = TempDir::new().unwrap();
    let err = ProjectConfig::from_project_path(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingDescriptor(_)));
    assert!(err.to_string().contains("pyproject.toml"));
}

#[test]
fn test_invalid_toml() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("pyproject.toml"), "[tool.unasyncify\n").unwrap();
    let err = ProjectConfig::from_project_path(dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Toml { .. }));
}
