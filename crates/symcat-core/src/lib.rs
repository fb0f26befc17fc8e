use serde::{Deserialize, Serialize};

pub mod backend;
pub mod catalogue;
pub mod classify;
pub mod config_file;
pub mod correlate;
pub mod manifest;
pub mod matches;
pub mod pipeline;

// Re-export for convenience
pub use backend::{PageSource, SourceError};
pub use catalogue::{CHECKLIST, Column};
pub use classify::{Classification, classify};
pub use correlate::{CorrelatedAsset, correlate_page, humanize, sanitize};
pub use manifest::{ManifestError, ManifestStats, read_manifest, retain_columns, write_manifest};
pub use matches::scan_text_matches;
pub use pipeline::{PageProgress, PipelineError, RunOptions, RunReport, run};

/// Sentinel written to `ref` and `column` for images with no text correlate.
pub const UNKNOWN_SENTINEL: &str = "unknown";

/// Default prefix for the manifest `image` field.
pub const DEFAULT_ASSET_PREFIX: &str = "./assets";

/// A `(reference, name)` pair found in a page's text, in scan order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMatch {
    pub reference: String,
    pub name: String,
}

impl TextMatch {
    pub fn new(reference: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            name: name.into(),
        }
    }
}

/// One embedded raster image pulled from a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub bytes: Vec<u8>,
    /// File extension without the leading dot (e.g. `png`, `jpeg`).
    pub ext: String,
    /// 1-based position in the page's image list.
    pub index: usize,
}

/// One manifest record describing an extracted symbol image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolEntry {
    #[serde(rename = "ref")]
    pub reference: String,
    pub name: String,
    pub column: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub image: String,
    /// Always empty at generation time; filled in by hand later.
    #[serde(default)]
    pub description: String,
}

impl SymbolEntry {
    /// True for entries produced for images that had no matching text line.
    pub fn is_sentinel(&self) -> bool {
        self.column == UNKNOWN_SENTINEL
    }
}
