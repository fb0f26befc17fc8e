use std::io::Write;

use owo_colors::OwoColorize;
use symcat_core::{Classification, ManifestStats, RunReport, SymbolEntry};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the header shown before a run starts.
pub fn print_run_header(
    w: &mut dyn Write,
    pdf_name: &str,
    max_pages: usize,
    dry_run: bool,
    color: ColorMode,
) -> std::io::Result<()> {
    let prefix = if dry_run { "DRY RUN: " } else { "" };
    if color.enabled() {
        writeln!(
            w,
            "{}Extracting symbols from {} (up to {} pages)",
            prefix.bold().cyan(),
            pdf_name.bold(),
            max_pages
        )?;
    } else {
        writeln!(
            w,
            "{}Extracting symbols from {} (up to {} pages)",
            prefix, pdf_name, max_pages
        )?;
    }
    Ok(())
}

/// Print one correlated entry (dry run listing).
pub fn print_entry(
    w: &mut dyn Write,
    position: usize,
    entry: &SymbolEntry,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", format!("[{}]", position).bold().yellow())?;
    } else {
        writeln!(w, "[{}]", position)?;
    }

    writeln!(w, "  Ref:     {}", entry.reference)?;
    writeln!(w, "  Name:    {}", entry.name)?;
    writeln!(w, "  Column:  {}", entry.column)?;
    if !entry.kind.is_empty() {
        writeln!(w, "  Type:    {}", entry.kind)?;
    }

    if color.enabled() {
        writeln!(w, "  Image:   {}", entry.image.dimmed())?;
    } else {
        writeln!(w, "  Image:   {}", entry.image)?;
    }

    if entry.is_sentinel() {
        if color.enabled() {
            writeln!(w, "  {}", "NO TEXT MATCH (excluded from manifest)".red())?;
        } else {
            writeln!(w, "  NO TEXT MATCH (excluded from manifest)")?;
        }
    }
    writeln!(w)?;
    Ok(())
}

/// Print totals after a run.
pub fn print_run_summary(
    w: &mut dyn Write,
    report: &RunReport,
    manifest_path: Option<&str>,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    writeln!(
        w,
        "Processed {} pages, {} images ({} written)",
        report.pages,
        report.entries.len(),
        report.images_written
    )?;

    let dropped = report.entries.len() - report.retained.len();
    if color.enabled() {
        writeln!(
            w,
            "Manifest entries: {} {}",
            report.retained.len().green(),
            format!("({} dropped, {} without text match)", dropped, report.sentinels).dimmed()
        )?;
    } else {
        writeln!(
            w,
            "Manifest entries: {} ({} dropped, {} without text match)",
            report.retained.len(),
            dropped,
            report.sentinels
        )?;
    }

    if let Some(path) = manifest_path {
        writeln!(w, "Manifest written to: {}", path)?;
    }
    Ok(())
}

/// Print the classification of one reference number.
pub fn print_classification(
    w: &mut dyn Write,
    reference: &str,
    class: &Classification,
    color: ColorMode,
) -> std::io::Result<()> {
    let subtype = if class.subtype.is_empty() {
        "(none)"
    } else {
        class.subtype
    };
    if color.enabled() {
        let column = class.column.label();
        if class.column.is_retained() {
            writeln!(w, "{:<8} {}  {}", reference.bold(), column.green(), subtype)?;
        } else {
            writeln!(w, "{:<8} {}  {}", reference.bold(), column.red(), subtype)?;
        }
    } else {
        writeln!(w, "{:<8} {}  {}", reference, class.column, subtype)?;
    }
    Ok(())
}

/// Print counts for a manifest file.
pub fn print_stats(
    w: &mut dyn Write,
    manifest_name: &str,
    stats: &ManifestStats,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} ({} entries)", manifest_name.bold(), stats.total)?;
    } else {
        writeln!(w, "{} ({} entries)", manifest_name, stats.total)?;
    }
    writeln!(w)?;

    writeln!(w, "By column:")?;
    for (column, count) in &stats.per_column {
        writeln!(w, "  {:<20} {}", column, count)?;
    }

    if !stats.per_checklist.is_empty() {
        writeln!(w, "Column D checklist:")?;
        for (kind, count) in &stats.per_checklist {
            let label = if kind.is_empty() { "(unresolved)" } else { kind };
            writeln!(w, "  {:<20} {}", label, count)?;
        }
    }

    if stats.dropped > 0 {
        let msg = format!(
            "{} entries outside columns C-G ({} without text match)",
            stats.dropped, stats.sentinels
        );
        if color.enabled() {
            writeln!(w, "{}", msg.yellow())?;
        } else {
            writeln!(w, "{}", msg)?;
        }
    }
    Ok(())
}
