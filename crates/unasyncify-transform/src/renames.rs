use std::collections::BTreeMap;

/// Exact identifier substitutions applied inside twins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameTable {
    entries: BTreeMap<String, String>,
}

impl RenameTable {
    /// Build a table from user entries. The async-truth marker maps to
    /// `False` unless the entries say otherwise.
    pub fn new<I, K, V>(entries: I, async_marker: &str) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut entries: BTreeMap<String, String> = entries
            .into_iter()
            .map(|(from, to)| (from.into(), to.into()))
            .collect();
        entries
            .entry(async_marker.to_string())
            .or_insert_with(|| "False".to_string());
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }
}
