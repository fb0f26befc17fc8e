//! Sequential page-by-page extraction run.
//!
//! For each page in `0..min(max_pages, page_count)`:
//! 1. Scan the page text for `NUMBER.NUMBER NAME` entries
//! 2. Pull the page's embedded images
//! 3. Pair them by position and classify each reference
//! 4. Write every image under its derived name (sentinels included)
//! 5. Accumulate manifest entries in page, then image, order
//!
//! The retained manifest (columns C through G) is returned alongside the
//! full entry list; writing it is left to the caller.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::backend::{PageSource, SourceError};
use crate::config_file::DEFAULT_MAX_PAGES;
use crate::correlate::{CorrelatedAsset, correlate_page};
use crate::manifest::retain_columns;
use crate::matches::scan_text_matches;
use crate::{DEFAULT_ASSET_PREFIX, SymbolEntry};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("document error: {0}")]
    Source(#[from] SourceError),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Settings for one extraction run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_dir: PathBuf,
    /// Upper bound on pages visited; the document may have fewer.
    pub max_pages: usize,
    pub asset_prefix: String,
    /// Correlate and report without touching the filesystem.
    pub dry_run: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(crate::config_file::DEFAULT_OUTPUT_DIR),
            max_pages: DEFAULT_MAX_PAGES,
            asset_prefix: DEFAULT_ASSET_PREFIX.to_string(),
            dry_run: false,
        }
    }
}

/// Per-page progress passed to the `on_page` callback.
#[derive(Debug, Clone, Copy)]
pub struct PageProgress {
    /// 0-based page just processed.
    pub page: usize,
    pub pages_total: usize,
    pub images: usize,
    pub matches: usize,
}

/// Outcome of a run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Every entry produced, sentinels included, in accumulation order.
    pub entries: Vec<SymbolEntry>,
    /// Entries destined for the manifest (columns C through G).
    pub retained: Vec<SymbolEntry>,
    pub pages: usize,
    pub images_written: usize,
    pub sentinels: usize,
}

/// Run the extraction over `source`.
///
/// Document and write failures abort the run; images written before the
/// failure stay on disk.
pub fn run(
    source: &dyn PageSource,
    options: &RunOptions,
    mut on_page: impl FnMut(PageProgress),
) -> Result<RunReport, PipelineError> {
    let page_count = source.page_count()?;
    let pages_total = options.max_pages.min(page_count);

    if !options.dry_run {
        std::fs::create_dir_all(&options.output_dir).map_err(|e| PipelineError::Io {
            path: options.output_dir.clone(),
            source: e,
        })?;
    }

    let mut report = RunReport {
        pages: pages_total,
        ..RunReport::default()
    };

    for page in 0..pages_total {
        let text = source.page_text(page)?;
        let matches = scan_text_matches(&text);
        let images = source.page_images(page)?;
        let image_count = images.len();

        tracing::debug!(
            page = page + 1,
            images = image_count,
            matches = matches.len(),
            "processing page"
        );
        if matches.len() > image_count {
            tracing::debug!(
                page = page + 1,
                unused = matches.len() - image_count,
                "more text matches than images"
            );
        }

        for asset in correlate_page(page, images, &matches, &options.asset_prefix) {
            if asset.entry.is_sentinel() {
                report.sentinels += 1;
            }
            if !options.dry_run {
                write_asset(&options.output_dir, &asset)?;
                report.images_written += 1;
            }
            report.entries.push(asset.entry);
        }

        on_page(PageProgress {
            page,
            pages_total,
            images: image_count,
            matches: matches.len(),
        });
    }

    report.retained = retain_columns(&report.entries);

    tracing::info!(
        pages = report.pages,
        entries = report.entries.len(),
        retained = report.retained.len(),
        sentinels = report.sentinels,
        "extraction complete"
    );

    Ok(report)
}

fn write_asset(output_dir: &Path, asset: &CorrelatedAsset) -> Result<(), PipelineError> {
    let path = output_dir.join(&asset.file_name);
    std::fs::write(&path, &asset.bytes).map_err(|e| PipelineError::Io { path, source: e })
}
