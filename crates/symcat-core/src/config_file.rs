use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::DEFAULT_ASSET_PREFIX;

pub const DEFAULT_OUTPUT_DIR: &str = "extracted_images";
pub const DEFAULT_MANIFEST_PATH: &str = "symbols_up_to_column_G_empty_descriptions.json";
pub const DEFAULT_MAX_PAGES: usize = 17;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub paths: Option<PathsConfig>,
    pub extraction: Option<ExtractionConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    pub pdf_path: Option<String>,
    pub output_dir: Option<String>,
    pub manifest_path: Option<String>,
    pub asset_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub max_pages: Option<usize>,
}

impl ConfigFile {
    pub fn pdf_path(&self) -> Option<PathBuf> {
        self.paths
            .as_ref()
            .and_then(|p| p.pdf_path.as_deref())
            .map(PathBuf::from)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.paths
            .as_ref()
            .and_then(|p| p.output_dir.as_deref())
            .unwrap_or(DEFAULT_OUTPUT_DIR)
            .into()
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.paths
            .as_ref()
            .and_then(|p| p.manifest_path.as_deref())
            .unwrap_or(DEFAULT_MANIFEST_PATH)
            .into()
    }

    pub fn asset_prefix(&self) -> String {
        self.paths
            .as_ref()
            .and_then(|p| p.asset_prefix.clone())
            .unwrap_or_else(|| DEFAULT_ASSET_PREFIX.to_string())
    }

    pub fn max_pages(&self) -> usize {
        self.extraction
            .as_ref()
            .and_then(|e| e.max_pages)
            .unwrap_or(DEFAULT_MAX_PAGES)
    }
}

/// Platform config directory path: `<config_dir>/symcat/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("symcat").join("config.toml"))
}

/// Load config by cascading CWD `.symcat.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".symcat.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let base_paths = base.paths.unwrap_or_default();
    let overlay_paths = overlay.paths.unwrap_or_default();
    let base_extraction = base.extraction.unwrap_or_default();
    let overlay_extraction = overlay.extraction.unwrap_or_default();

    ConfigFile {
        paths: Some(PathsConfig {
            pdf_path: overlay_paths.pdf_path.or(base_paths.pdf_path),
            output_dir: overlay_paths.output_dir.or(base_paths.output_dir),
            manifest_path: overlay_paths.manifest_path.or(base_paths.manifest_path),
            asset_prefix: overlay_paths.asset_prefix.or(base_paths.asset_prefix),
        }),
        extraction: Some(ExtractionConfig {
            max_pages: overlay_extraction.max_pages.or(base_extraction.max_pages),
        }),
    }
}

/// Render a config as TOML for display.
pub fn to_toml(config: &ConfigFile) -> Result<String, String> {
    toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))
}
