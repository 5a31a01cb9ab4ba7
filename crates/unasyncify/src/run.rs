//! Staged execution over a whole project.
//!
//! Every file is transformed in memory (in parallel) before anything touches
//! the disk. A single failing file aborts the run with no file written.

use crate::files::gather_files;
use crate::scaffold::ensure_codegen_template;
use rayon::prelude::*;
use similar::TextDiff;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use unasyncify_config::ProjectConfig;
use unasyncify_transform::{Options, transform_source};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Rewrite changed files in place.
    #[default]
    Write,
    /// Report what would change without writing.
    Check,
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to list files under {path}: {source}")]
    Walk {
        path: PathBuf,
        source: ignore::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("{path}: {source}")]
    Transform {
        path: PathBuf,
        source: unasyncify_transform::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// One file after transformation, not yet written.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub path: PathBuf,
    pub original: String,
    pub updated: String,
    pub twins: usize,
}

impl StagedFile {
    pub fn changed(&self) -> bool {
        self.original != self.updated
    }

    /// Unified diff from the current contents to the staged ones.
    pub fn diff(&self, display: &Path) -> String {
        let name = display.display().to_string();
        TextDiff::from_lines(&self.original, &self.updated)
            .unified_diff()
            .context_radius(3)
            .header(&name, &name)
            .to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files_scanned: usize,
    /// Files rewritten, or that would be rewritten in check mode.
    pub changed: Vec<PathBuf>,
    pub twins: usize,
    pub template_written: bool,
    /// Unified diffs of the changed files; only filled in check mode.
    pub diff: String,
}

impl RunSummary {
    pub fn files_changed(&self) -> usize {
        self.changed.len()
    }
}

/// Transform one file in memory.
pub fn stage(path: &Path, options: &Options) -> Result<StagedFile, RunError> {
    let original = fs::read_to_string(path).map_err(|source| RunError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let transformed =
        transform_source(&original, options).map_err(|source| RunError::Transform {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::debug!(path = %path.display(), twins = transformed.twins, "staged");

    Ok(StagedFile {
        path: path.to_path_buf(),
        original,
        updated: transformed.text,
        twins: transformed.twins,
    })
}

/// Transform every configured file, then commit the results.
pub fn run(config: &ProjectConfig, mode: RunMode) -> Result<RunSummary, RunError> {
    let files = gather_files(&config.paths_to_visit).map_err(|source| RunError::Walk {
        path: config.project_base.clone(),
        source,
    })?;
    let options = config.transform_options();

    let staged = files
        .par_iter()
        .map(|path| stage(path, &options))
        .collect::<Result<Vec<_>, _>>()?;

    let mut summary = RunSummary {
        files_scanned: staged.len(),
        twins: staged.iter().map(|file| file.twins).sum(),
        ..RunSummary::default()
    };

    for file in staged.iter().filter(|file| file.changed()) {
        match mode {
            RunMode::Check => {
                let display = file
                    .path
                    .strip_prefix(&config.project_base)
                    .unwrap_or(&file.path);
                summary.diff.push_str(&file.diff(display));
            }
            RunMode::Write => {
                commit(&file.path, &file.updated).map_err(|source| RunError::Write {
                    path: file.path.clone(),
                    source,
                })?;
                tracing::debug!(path = %file.path.display(), "rewrote");
            }
        }
        summary.changed.push(file.path.clone());
    }

    if mode == RunMode::Write {
        let template = config.codegen_template_path();
        summary.template_written = ensure_codegen_template(&template, &config.async_marker)
            .map_err(|source| RunError::Write {
                path: template,
                source,
            })?;
    }

    tracing::info!(
        files = summary.files_scanned,
        changed = summary.files_changed(),
        twins = summary.twins,
        ?mode,
        "run finished"
    );
    Ok(summary)
}

/// Replace `path` with `contents` through a temporary file in the same
/// directory, keeping the original permissions.
fn commit(path: &Path, contents: &str) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let permissions = fs::metadata(path)?.permissions();

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.as_file().sync_all()?;
    fs::set_permissions(file.path(), permissions)?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}
