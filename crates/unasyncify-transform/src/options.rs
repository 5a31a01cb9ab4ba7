use crate::marker::DEFAULT_ASYNC_MARKER;
use crate::renames::RenameTable;
use std::collections::BTreeMap;

/// Per-run engine settings. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Module the marker symbols are imported from.
    pub helpers_import_path: String,
    /// Module `async_unsafe` is imported from; the helpers module when unset.
    pub async_unsafe_import_path: Option<String>,
    /// Name of the async-truth constant.
    pub async_marker: String,
    /// User-supplied identifier substitutions.
    pub renames: BTreeMap<String, String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            helpers_import_path: "unasync_utils".to_string(),
            async_unsafe_import_path: None,
            async_marker: DEFAULT_ASYNC_MARKER.to_string(),
            renames: BTreeMap::new(),
        }
    }
}

impl Options {
    pub fn with_helpers_import_path(mut self, path: impl Into<String>) -> Self {
        self.helpers_import_path = path.into();
        self
    }

    pub fn with_rename(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.renames.insert(from.into(), to.into());
        self
    }

    pub fn with_async_unsafe_import_path(mut self, path: impl Into<String>) -> Self {
        self.async_unsafe_import_path = Some(path.into());
        self
    }

    pub fn rename_table(&self) -> RenameTable {
        RenameTable::new(
            self.renames
                .iter()
                .map(|(from, to)| (from.as_str(), to.as_str())),
            &self.async_marker,
        )
    }

    pub fn async_unsafe_module(&self) -> &str {
        self.async_unsafe_import_path
            .as_deref()
            .unwrap_or(&self.helpers_import_path)
    }
}
