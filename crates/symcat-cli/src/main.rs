use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use symcat_core::config_file::{self, ConfigFile};
use symcat_core::{ManifestStats, RunOptions};

mod output;

use output::ColorMode;

/// Control-description symbol extractor - pull symbol images and a JSON
/// manifest out of a symbol catalogue PDF
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract symbol images and write the manifest
    Extract {
        /// Path to the catalogue PDF (falls back to `paths.pdf_path` in config)
        pdf_path: Option<PathBuf>,

        /// Directory the images are written to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Path of the JSON manifest
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Maximum number of pages to process
        #[arg(long)]
        max_pages: Option<usize>,

        /// Prefix for the manifest `image` field (env: SYMCAT_ASSET_PREFIX)
        #[arg(long)]
        asset_prefix: Option<String>,

        /// Print correlated entries without writing images or the manifest
        #[arg(long)]
        dry_run: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Show the column and checklist type for reference numbers
    Classify {
        /// Reference numbers such as 3.4
        #[arg(required = true)]
        references: Vec<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Summarize an existing manifest
    Summary {
        /// Path to the manifest JSON
        manifest: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the merged configuration as TOML
    Show,
    /// Print the platform config file path
    Path,
}

/// Run settings after applying CLI flags > env vars > config file > defaults.
#[derive(Debug, Clone, PartialEq)]
struct Resolved {
    pdf_path: Option<PathBuf>,
    output_dir: PathBuf,
    manifest: PathBuf,
    max_pages: usize,
    asset_prefix: String,
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key).ok().map(PathBuf::from)
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn resolve(
    config: &ConfigFile,
    pdf_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    manifest: Option<PathBuf>,
    max_pages: Option<usize>,
    asset_prefix: Option<String>,
) -> Resolved {
    Resolved {
        pdf_path: pdf_path
            .or_else(|| env_path("SYMCAT_PDF"))
            .or_else(|| config.pdf_path()),
        output_dir: output_dir
            .or_else(|| env_path("SYMCAT_OUTPUT_DIR"))
            .unwrap_or_else(|| config.output_dir()),
        manifest: manifest
            .or_else(|| env_path("SYMCAT_MANIFEST"))
            .unwrap_or_else(|| config.manifest_path()),
        max_pages: max_pages
            .or_else(|| env_usize("SYMCAT_MAX_PAGES"))
            .unwrap_or_else(|| config.max_pages()),
        asset_prefix: asset_prefix
            .or_else(|| env_string("SYMCAT_ASSET_PREFIX"))
            .unwrap_or_else(|| config.asset_prefix()),
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Extract {
            pdf_path,
            output_dir,
            manifest,
            max_pages,
            asset_prefix,
            dry_run,
            no_color,
        } => {
            let config = config_file::load_config();
            let resolved = resolve(
                &config,
                pdf_path,
                output_dir,
                manifest,
                max_pages,
                asset_prefix,
            );
            extract(resolved, dry_run, ColorMode(!no_color))
        }
        Command::Classify {
            references,
            no_color,
        } => {
            let mut out = std::io::stdout();
            for reference in &references {
                let class = symcat_core::classify(reference);
                output::print_classification(&mut out, reference, &class, ColorMode(!no_color))?;
            }
            Ok(())
        }
        Command::Summary { manifest, no_color } => summary(&manifest, ColorMode(!no_color)),
        Command::Config { action } => match action {
            ConfigAction::Show => {
                let config = config_file::merge(ConfigFile::default(), config_file::load_config());
                let text = config_file::to_toml(&config).map_err(|e| anyhow::anyhow!(e))?;
                print!("{}", text);
                Ok(())
            }
            ConfigAction::Path => {
                match config_file::config_path() {
                    Some(path) => println!("{}", path.display()),
                    None => anyhow::bail!("Could not determine config directory"),
                }
                Ok(())
            }
        },
    }
}

fn extract(resolved: Resolved, dry_run: bool, color: ColorMode) -> anyhow::Result<()> {
    let Some(pdf_path) = resolved.pdf_path else {
        anyhow::bail!("No PDF given. Pass a path or set paths.pdf_path in .symcat.toml");
    };
    if !pdf_path.exists() {
        anyhow::bail!("File not found: {}", pdf_path.display());
    }

    let mut out = std::io::stdout();
    let pdf_name = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| pdf_path.display().to_string());
    output::print_run_header(&mut out, &pdf_name, resolved.max_pages, dry_run, color)?;

    let source = symcat_pdf_mupdf::MupdfSource::open(&pdf_path)?;

    let options = RunOptions {
        output_dir: resolved.output_dir,
        max_pages: resolved.max_pages,
        asset_prefix: resolved.asset_prefix,
        dry_run,
    };
    tracing::debug!(?options, pdf = %pdf_path.display(), "starting extraction");

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg} [{bar:40.green/dim}] {pos}/{len}")?
            .progress_chars("=> "),
    );
    bar.enable_steady_tick(Duration::from_millis(120));

    let report = symcat_core::run(&source, &options, |progress| {
        if bar.length() == Some(0) {
            bar.set_length(progress.pages_total as u64);
        }
        bar.set_position(progress.page as u64 + 1);
        bar.set_message(format!(
            "page {}: {} images, {} text matches",
            progress.page + 1,
            progress.images,
            progress.matches
        ));
    })?;
    bar.finish_and_clear();

    if dry_run {
        writeln!(out)?;
        for (i, entry) in report.entries.iter().enumerate() {
            output::print_entry(&mut out, i + 1, entry, color)?;
        }
        output::print_run_summary(&mut out, &report, None, color)?;
        return Ok(());
    }

    symcat_core::write_manifest(&resolved.manifest, &report.retained)?;
    let manifest_display = resolved.manifest.display().to_string();
    output::print_run_summary(&mut out, &report, Some(&manifest_display), color)?;

    Ok(())
}

fn summary(manifest: &std::path::Path, color: ColorMode) -> anyhow::Result<()> {
    if !manifest.exists() {
        anyhow::bail!("File not found: {}", manifest.display());
    }
    let entries = symcat_core::read_manifest(manifest)?;
    let stats = ManifestStats::from_entries(&entries);
    let name = manifest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| manifest.display().to_string());
    output::print_stats(&mut std::io::stdout(), &name, &stats, color)?;
    Ok(())
}
