//! The last view selection, persisted between CLI invocations.

use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context;
use localreads_library::FilterSelector;

/// Read the stored selection. A missing or unreadable file means `all`.
pub fn load(path: &Path) -> FilterSelector {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return FilterSelector::All,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "could not read selection");
            return FilterSelector::All;
        }
    };

    raw.parse().unwrap_or_else(|err| {
        tracing::warn!(path = %path.display(), error = %err, "ignoring invalid selection");
        FilterSelector::All
    })
}

pub fn save(path: &Path, selector: FilterSelector) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, format!("{selector}\n"))
        .with_context(|| format!("failed to write selection to {}", path.display()))
}
