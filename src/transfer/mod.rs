//! Archive transfer stages.
//!
//! These are the non-interactive steps of the export and import pipelines:
//! [`write_archive`] turns host state into a settings archive, and
//! [`apply_manifest`] writes an inspected archive back into host state.
//! Both are plain functions over the injected host traits, so they can be
//! driven by [`crate::pipeline`] or called directly.

mod export;
mod import;

#[cfg(test)]
mod tests;

use std::path::PathBuf;
use std::time::Duration;

pub use export::{collect_annotations, collect_preferences, collect_thumbnails, write_archive};
pub use import::{apply_manifest, pref_value_from_json};

/// Which data classes a transfer includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    /// Per-page annotations
    pub annotations: bool,
    /// Allow-listed preferences
    pub preferences: bool,
    /// Cached thumbnails
    pub thumbnails: bool,
    /// Background image
    pub background: bool,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            annotations: true,
            preferences: true,
            thumbnails: true,
            background: true,
        }
    }
}

impl TransferOptions {
    /// Include nothing.
    pub fn none() -> Self {
        Self {
            annotations: false,
            preferences: false,
            thumbnails: false,
            background: false,
        }
    }

    /// Human-readable list of the included categories.
    pub fn describe(&self) -> String {
        let parts: Vec<&str> = [
            (self.annotations, "annotations"),
            (self.preferences, "preferences"),
            (self.thumbnails, "thumbnails"),
            (self.background, "background image"),
        ]
        .iter()
        .filter(|(included, _)| *included)
        .map(|(_, name)| *name)
        .collect();
        if parts.is_empty() {
            "nothing".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Something skipped during a transfer that is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferWarning {
    /// Item the warning concerns (key, page, entry name)
    pub item: String,
    /// Human-readable message
    pub message: String,
}

impl TransferWarning {
    /// Create a new warning and log it.
    pub fn new(item: impl Into<String>, message: impl Into<String>) -> Self {
        let warning = Self {
            item: item.into(),
            message: message.into(),
        };
        log::warn!("{}: {}", warning.item, warning.message);
        warning
    }
}

/// Result of a completed export.
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Archive written
    pub destination: PathBuf,
    /// Number of (name, page) annotation pairs written
    pub annotations_exported: usize,
    /// Number of preferences written
    pub preferences_exported: usize,
    /// Number of thumbnail files written
    pub thumbnails_exported: usize,
    /// Whether the background image was written
    pub background_exported: bool,
    /// Items left out
    pub warnings: Vec<TransferWarning>,
    /// Time spent in the transfer stage
    pub elapsed: Duration,
}

/// Result of a completed import.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Archive read
    pub source: PathBuf,
    /// Number of annotations set
    pub annotations_applied: usize,
    /// Number of preferences set
    pub preferences_applied: usize,
    /// Number of thumbnail files restored
    pub thumbnails_restored: usize,
    /// Whether the background image was restored
    pub background_restored: bool,
    /// Items that failed and were reported to the error sink
    pub failures: usize,
    /// Items skipped without error
    pub warnings: Vec<TransferWarning>,
    /// Time spent in the apply stage
    pub elapsed: Duration,
}

impl ImportReport {
    /// Check if any item failed.
    pub fn has_failures(&self) -> bool {
        self.failures > 0
    }
}
