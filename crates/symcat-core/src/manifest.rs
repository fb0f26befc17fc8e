use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

use crate::{Column, SymbolEntry};

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ManifestError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Keep only entries whose column is one of C through G, preserving order.
///
/// Sentinel (`unknown`), `Unknown` and `Column H` entries are dropped.
pub fn retain_columns(entries: &[SymbolEntry]) -> Vec<SymbolEntry> {
    entries
        .iter()
        .filter(|e| Column::from_label(&e.column).is_some_and(Column::is_retained))
        .cloned()
        .collect()
}

/// Serialize entries as a pretty-printed JSON array.
pub fn to_json(entries: &[SymbolEntry]) -> Result<String, ManifestError> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// Write the manifest to `path`, creating parent directories as needed.
pub fn write_manifest(path: &Path, entries: &[SymbolEntry]) -> Result<(), ManifestError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ManifestError::io(parent, e))?;
    }
    let json = to_json(entries)?;
    std::fs::write(path, json).map_err(|e| ManifestError::io(path, e))?;
    tracing::info!(path = %path.display(), entries = entries.len(), "manifest written");
    Ok(())
}

pub fn read_manifest(path: &Path) -> Result<Vec<SymbolEntry>, ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|e| ManifestError::io(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

/// Counts over a list of entries, for run and manifest summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestStats {
    pub total: usize,
    /// Entries per column label, in column order.
    pub per_column: BTreeMap<String, usize>,
    /// Column D entries per checklist category; empty subtype counted as `""`.
    pub per_checklist: BTreeMap<String, usize>,
    pub sentinels: usize,
    /// Entries that [`retain_columns`] would drop.
    pub dropped: usize,
}

impl ManifestStats {
    pub fn from_entries(entries: &[SymbolEntry]) -> Self {
        let mut stats = Self {
            total: entries.len(),
            ..Self::default()
        };
        for entry in entries {
            *stats.per_column.entry(entry.column.clone()).or_default() += 1;
            if entry.column == Column::D.label() {
                *stats.per_checklist.entry(entry.kind.clone()).or_default() += 1;
            }
            if entry.is_sentinel() {
                stats.sentinels += 1;
            }
            if !Column::from_label(&entry.column).is_some_and(Column::is_retained) {
                stats.dropped += 1;
            }
        }
        stats
    }
}
