//! Configuration file support for newtabtools.
//!
//! Stores the tool's own settings: log verbosity, where the browser profile
//! lives, the folders last used for export and import, and the transfer
//! policies.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Which cached thumbnails an export picks up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailPolicy {
    /// Only thumbnails that are not writable in place
    #[default]
    ReadOnly,
    /// Only thumbnails that are writable in place
    Writable,
    /// Every existing thumbnail
    All,
}

impl ThumbnailPolicy {
    /// Check whether a thumbnail with the given writability is exported.
    pub fn accepts(&self, writable: bool) -> bool {
        match self {
            ThumbnailPolicy::ReadOnly => !writable,
            ThumbnailPolicy::Writable => writable,
            ThumbnailPolicy::All => true,
        }
    }
}

/// What an export does when the profile has no background image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundPolicy {
    /// Leave the entry out
    #[default]
    Optional,
    /// Fail the export
    Required,
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Tool configuration persisted between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// User preferences
    #[serde(default)]
    pub preferences: UserPreferences,

    /// Archive transfer settings
    #[serde(default)]
    pub transfer: TransferSettings,
}

/// User preferences section of the config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Browser profile directory
    #[serde(default)]
    pub profile_dir: Option<PathBuf>,

    /// Thumbnail cache directory (defaults to `<profile>/thumbnails`)
    #[serde(default)]
    pub thumbnails_dir: Option<PathBuf>,

    /// Folder the last export was written to
    #[serde(default)]
    pub export_folder: Option<PathBuf>,

    /// Folder the last import was read from
    #[serde(default)]
    pub import_folder: Option<PathBuf>,
}

/// Transfer settings section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferSettings {
    /// Which thumbnails to export
    #[serde(default)]
    pub thumbnail_policy: ThumbnailPolicy,

    /// How to treat a missing background image
    #[serde(default)]
    pub background_policy: BackgroundPolicy,

    /// Ranked links exported per grid cell
    #[serde(default = "default_thumbnail_overscan")]
    pub thumbnail_overscan: f64,
}

fn default_thumbnail_overscan() -> f64 {
    crate::constants::DEFAULT_THUMBNAIL_OVERSCAN
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            thumbnail_policy: ThumbnailPolicy::default(),
            background_policy: BackgroundPolicy::default(),
            thumbnail_overscan: default_thumbnail_overscan(),
        }
    }
}

impl TransferSettings {
    /// Number of ranked links whose thumbnails are considered.
    pub fn thumbnail_limit(&self, grid_cell_count: usize) -> usize {
        (grid_cell_count as f64 * self.thumbnail_overscan).floor() as usize
    }
}

impl ToolConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            preferences: UserPreferences::default(),
            transfer: TransferSettings::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "newtabtools-config.json"
    }

    /// Get the default config file path for auto-load/save.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("newtabtools").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("newtabtools")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from `path`.
    /// A missing file yields the defaults.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return Ok(Self::new());
        }
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Try to load configuration from the default path.
    /// Falls back to defaults if the file doesn't exist or can't be read.
    pub fn load_from_default_path() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::new();
        };
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                Self::new()
            }
        }
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Save configuration to the default path.
    pub fn save_to_default_path(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine config directory",
            ))
        })?;
        self.save_to(&path)
    }

    /// Thumbnail directory: the configured one, or `<profile>/thumbnails`.
    pub fn thumbnails_dir_for(&self, profile_dir: &std::path::Path) -> PathBuf {
        self.preferences
            .thumbnails_dir
            .clone()
            .unwrap_or_else(|| profile_dir.join("thumbnails"))
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
