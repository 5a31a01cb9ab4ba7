use ignore::WalkBuilder;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Every Python file under `paths`, sorted and deduplicated. Paths naming a
/// file are taken as they are; directories are walked respecting ignore
/// files.
pub fn gather_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, ignore::Error> {
    let mut files = BTreeSet::new();
    for path in paths {
        if path.is_file() {
            files.insert(path.clone());
            continue;
        }

        let walker = WalkBuilder::new(path)
            .hidden(false)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .build();
        for entry in walker {
            let entry = entry?;
            let is_file = entry.file_type().is_some_and(|kind| kind.is_file());
            if is_file && is_python(entry.path()) {
                files.insert(entry.into_path());
            }
        }
    }
    tracing::debug!(count = files.len(), "gathered files");
    Ok(files.into_iter().collect())
}

fn is_python(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "py")
}
