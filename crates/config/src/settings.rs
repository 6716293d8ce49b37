// Report settings
// Loaded from ~/.config/beantrack/settings.toml (override with BEANTRACK_CONFIG)

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use beantrack_io::layout::{DocumentOptions, Margins, Orientation, PaperSize};

pub const CONFIG_ENV: &str = "BEANTRACK_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid settings in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Where rows come from. CLI flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Directory of `<slug>.json` listings.
    pub data_dir: Option<PathBuf>,
    /// Dashboard API base URL; used when no data directory is set.
    pub api_base: Option<String>,
    /// Bearer token for the API
    pub token: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Directory export files are written to (default: current directory).
    pub out_dir: Option<PathBuf>,
}

/// Defaults for the paginated document export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    pub orientation: Orientation,
    pub paper: String,
    /// Uniform margin in mm; `margins` wins when both are set.
    pub margin_mm: f32,
    /// `"top,left,right,bottom"` in mm.
    pub margins: Option<String>,
    pub font_size: f32,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            orientation: Orientation::Portrait,
            paper: PaperSize::A4.name.to_string(),
            margin_mm: Margins::DEFAULT_MM,
            margins: None,
            font_size: DocumentOptions::DEFAULT_FONT_SIZE,
        }
    }
}

impl DocumentSettings {
    /// Resolve to exporter options. Call after [`Settings::validate`].
    pub fn to_options(&self) -> Result<DocumentOptions, SettingsError> {
        let paper: PaperSize = self.paper.parse().map_err(SettingsError::Invalid)?;
        let margins = match &self.margins {
            Some(spec) => spec.parse().map_err(SettingsError::Invalid)?,
            None => Margins::uniform(self.margin_mm),
        };
        Ok(DocumentOptions {
            orientation: self.orientation,
            paper,
            margins,
            font_size: self.font_size,
            title: None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source: SourceSettings,
    pub export: ExportSettings,
    pub document: DocumentSettings,
}

/// Settings file location: `$BEANTRACK_CONFIG`, else `<config dir>/beantrack/settings.toml`.
pub fn settings_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|c| c.join("beantrack").join("settings.toml"))
}

impl Settings {
    pub fn from_toml(input: &str) -> Result<Self, String> {
        toml::from_str(input).map_err(|e| e.to_string())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(4.0..=24.0).contains(&self.document.font_size) {
            return Err(SettingsError::Invalid(format!(
                "document.font_size must be between 4 and 24, got {}",
                self.document.font_size
            )));
        }
        if !self.document.margin_mm.is_finite() || self.document.margin_mm < 0.0 {
            return Err(SettingsError::Invalid(format!(
                "document.margin_mm must be a non-negative number, got {}",
                self.document.margin_mm
            )));
        }
        if let Some(0) = self.source.timeout_secs {
            return Err(SettingsError::Invalid("source.timeout_secs must be positive".into()));
        }
        if let Some(base) = &self.source.api_base {
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                return Err(SettingsError::Invalid(format!(
                    "source.api_base must be an http(s) URL, got '{}'",
                    base
                )));
            }
        }
        // Paper and margin strings are checked by resolving them.
        self.document.to_options()?.validate().map_err(SettingsError::Invalid)?;
        Ok(())
    }

    /// Load and validate `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("no settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => return Err(SettingsError::Read { path: path.to_path_buf(), source }),
        };
        let settings = Self::from_toml(&contents)
            .map_err(|message| SettingsError::Parse { path: path.to_path_buf(), message })?;
        settings.validate()?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load from [`settings_path`], or defaults when there is no config directory.
    pub fn load() -> Result<Self, SettingsError> {
        match settings_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }
}
