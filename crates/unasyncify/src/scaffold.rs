use std::io;
use std::path::Path;
use unasyncify_transform::DEFAULT_ASYNC_MARKER;

/// Python source of the marker module generated code imports from.
pub const TEMPLATE: &str = include_str!("../assets/unasync_utils.py");

/// The marker module with the async-truth constant named `async_marker`.
pub fn render_template(async_marker: &str) -> String {
    TEMPLATE.replace(DEFAULT_ASYNC_MARKER, async_marker)
}

/// Write the marker module to `path` unless a file is already there.
/// Returns whether it was written.
pub fn ensure_codegen_template(path: &Path, async_marker: &str) -> io::Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_template(async_marker))?;
    tracing::info!(path = %path.display(), "wrote marker module");
    Ok(true)
}
