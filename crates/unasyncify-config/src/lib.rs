//! Project configuration, read from `pyproject.toml`.
//!
//! ```toml
//! [tool.unasyncify]
//! paths_to_visit = ["src/app/db"]
//! unasync_helpers_path = "src/app/unasync_utils.py"
//! unasync_helpers_import_path = "app.unasync_utils"
//!
//! [tool.unasyncify.attribute_renames]
//! aconnection = "connection"
//! ```
//!
//! The `[tool.django_unasyncify]` table is accepted as well.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use unasyncify_transform::{DEFAULT_ASYNC_MARKER, Options};

const DESCRIPTOR: &str = "pyproject.toml";
const TOOL_TABLES: [&str; 2] = ["unasyncify", "django_unasyncify"];
const DEFAULT_HELPERS_PATH: &str = "unasync_utils.py";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no pyproject.toml found in {0}")]
    MissingDescriptor(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration in {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{0} has no [tool.unasyncify] table")]
    MissingTable(PathBuf),

    #[error("{path}: missing required key `{key}`")]
    MissingKey { path: PathBuf, key: &'static str },

    #[error("{path}: {detail}")]
    Invalid { path: PathBuf, detail: String },
}

/// The tool table as written.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolTable {
    paths_to_visit: Option<Vec<PathBuf>>,
    #[serde(default)]
    attribute_renames: BTreeMap<String, String>,
    unasync_helpers_path: Option<PathBuf>,
    unasync_helpers_import_path: Option<String>,
    async_marker: Option<String>,
    async_unsafe_import_path: Option<String>,
}

/// Resolved configuration for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub project_base: PathBuf,
    /// Paths to process, already joined onto `project_base`.
    pub paths_to_visit: Vec<PathBuf>,
    pub attribute_renames: BTreeMap<String, String>,
    /// Where the marker module lives, relative to `project_base`.
    pub unasync_helpers_path: PathBuf,
    pub unasync_helpers_import_path: String,
    pub async_marker: String,
    pub async_unsafe_import_path: Option<String>,
}

impl ProjectConfig {
    /// Load `<project>/pyproject.toml`.
    pub fn from_project_path(project: &Path) -> Result<Self, ConfigError> {
        let path = project.join(DESCRIPTOR);
        if !path.is_file() {
            return Err(ConfigError::MissingDescriptor(project.to_path_buf()));
        }
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_toml(project, &path, &content)
    }

    fn from_toml(project: &Path, path: &Path, content: &str) -> Result<Self, ConfigError> {
        let toml_error = |source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        };

        let mut document: toml::Table = toml::from_str(content).map_err(toml_error)?;
        let mut tool = match document.remove("tool") {
            Some(toml::Value::Table(tool)) => tool,
            _ => return Err(ConfigError::MissingTable(path.to_path_buf())),
        };
        let table = TOOL_TABLES
            .iter()
            .find_map(|name| tool.remove(*name))
            .ok_or_else(|| ConfigError::MissingTable(path.to_path_buf()))?;
        let table: ToolTable = table.try_into().map_err(toml_error)?;

        let paths_to_visit = table
            .paths_to_visit
            .ok_or_else(|| ConfigError::MissingKey {
                path: path.to_path_buf(),
                key: "paths_to_visit",
            })?
            .into_iter()
            .map(|visit| project.join(visit))
            .collect();

        let unasync_helpers_path = table
            .unasync_helpers_path
            .unwrap_or_else(|| PathBuf::from(DEFAULT_HELPERS_PATH));
        let unasync_helpers_import_path = match table.unasync_helpers_import_path {
            Some(import_path) => import_path,
            None => module_path(&unasync_helpers_path).ok_or_else(|| ConfigError::Invalid {
                path: path.to_path_buf(),
                detail: format!(
                    "cannot derive an import path from `{}`; set `unasync_helpers_import_path`",
                    unasync_helpers_path.display()
                ),
            })?,
        };

        let async_marker = table
            .async_marker
            .unwrap_or_else(|| DEFAULT_ASYNC_MARKER.to_string());
        if !is_identifier(&async_marker) {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                detail: format!("`async_marker` is not an identifier: {async_marker:?}"),
            });
        }

        Ok(Self {
            project_base: project.to_path_buf(),
            paths_to_visit,
            attribute_renames: table.attribute_renames,
            unasync_helpers_path,
            unasync_helpers_import_path,
            async_marker,
            async_unsafe_import_path: table.async_unsafe_import_path,
        })
    }

    /// Absolute location of the marker module.
    pub fn codegen_template_path(&self) -> PathBuf {
        self.project_base.join(&self.unasync_helpers_path)
    }

    /// Engine options for this project.
    pub fn transform_options(&self) -> Options {
        Options {
            helpers_import_path: self.unasync_helpers_import_path.clone(),
            async_unsafe_import_path: self.async_unsafe_import_path.clone(),
            async_marker: self.async_marker.clone(),
            renames: self.attribute_renames.clone(),
        }
    }
}

/// `pkg/sub/mod.py -> pkg.sub.mod`, `pkg/__init__.py -> pkg`.
fn module_path(path: &Path) -> Option<String> {
    if path.extension()? != "py" {
        return None;
    }
    let stem = path.with_extension("");
    let mut parts = Vec::new();
    for component in stem.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.last() == Some(&"__init__") {
        parts.pop();
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("."))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<ProjectConfig, ConfigError> {
        ProjectConfig::from_toml(
            Path::new("/project"),
            Path::new("/project/pyproject.toml"),
            content,
        )
    }

    #[test]
    fn test_defaults() {
        let config = parse("[tool.unasyncify]\npaths_to_visit = [\"src\"]\n").unwrap();
        assert_eq!(config.paths_to_visit, vec![PathBuf::from("/project/src")]);
        assert_eq!(config.unasync_helpers_path, PathBuf::from("unasync_utils.py"));
        assert_eq!(config.unasync_helpers_import_path, "unasync_utils");
        assert_eq!(config.async_marker, "IS_ASYNC");
        assert!(config.attribute_renames.is_empty());
        assert_eq!(
            config.codegen_template_path(),
            PathBuf::from("/project/unasync_utils.py")
        );
    }

    #[test]
    fn test_legacy_table_name() {
        let config = parse("[tool.django_unasyncify]\npaths_to_visit = [\"a\", \"b.py\"]\n").unwrap();
        assert_eq!(
            config.paths_to_visit,
            vec![PathBuf::from("/project/a"), PathBuf::from("/project/b.py")]
        );
    }

    #[test]
    fn test_transform_options() {
        let config = parse(
            r#"
[tool.unasyncify]
paths_to_visit = ["src"]
unasync_helpers_path = "src/app/utils/__init__.py"
async_unsafe_import_path = "django.utils.asyncio"

[tool.unasyncify.attribute_renames]
aconnection = "connection"
"#,
        )
        .unwrap();
        let options = config.transform_options();
        assert_eq!(options.helpers_import_path, "src.app.utils");
        assert_eq!(options.async_unsafe_module(), "django.utils.asyncio");
        let table = options.rename_table();
        assert_eq!(table.get("aconnection"), Some("connection"));
        assert_eq!(table.get("IS_ASYNC"), Some("False"));
    }

    #[test]
    fn test_module_path() {
        assert_eq!(module_path(Path::new("unasync_utils.py")).as_deref(), Some("unasync_utils"));
        assert_eq!(module_path(Path::new("./a/b.py")).as_deref(), Some("a.b"));
        assert_eq!(module_path(Path::new("a/__init__.py")).as_deref(), Some("a"));
        assert_eq!(module_path(Path::new("a/b.txt")), None);
        assert_eq!(module_path(Path::new("../b.py")), None);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse("[project]\nname = \"x\"\n"), Err(ConfigError::MissingTable(_))));
        assert!(matches!(
            parse("[tool.unasyncify]\n"),
            Err(ConfigError::MissingKey { key: "paths_to_visit", .. })
        ));
        assert!(matches!(
            parse("[tool.unasyncify]\npaths_to_visit = [\"src\"]\ntypo = 1\n"),
            Err(ConfigError::Toml { .. })
        ));
        assert!(matches!(
            parse("[tool.unasyncify]\npaths_to_visit = [\"src\"]\nasync_marker = \"not valid\"\n"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            parse("[tool.unasyncify]\npaths_to_visit = [\"src\"]\nunasync_helpers_path = \"helpers.txt\"\n"),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
