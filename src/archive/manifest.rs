//! Facts extracted from an archive before anything is applied.

use std::path::{Path, PathBuf};

use crate::archive::entries::{AnnotationMap, PreferenceMap};
use crate::archive::reader::ArchiveReader;
use crate::constants::{ANNOTATIONS_ENTRY, BACKGROUND_ENTRY, PREFERENCES_ENTRY, THUMBNAILS_DIR};
use crate::error::TransferError;

/// What an archive contains, read without touching host state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    /// Archive the manifest was read from.
    pub source: PathBuf,

    /// Contents of `annos.json` (empty when absent).
    pub annotations: AnnotationMap,

    /// Contents of `prefs.json` (empty when absent).
    pub preferences: PreferenceMap,

    /// Thumbnail entry names, excluding the directory marker.
    pub thumbnails: Vec<String>,

    /// Whether `newtab-background` is present.
    pub has_background: bool,
}

impl Manifest {
    /// Open `path` read-only and collect its manifest.
    ///
    /// A missing or corrupt archive is an error. Missing JSON entries are not.
    pub fn inspect(path: &Path) -> Result<Self, TransferError> {
        let mut reader = ArchiveReader::open(path)?;

        let manifest = Self {
            source: path.to_path_buf(),
            annotations: reader.read_json_or_default(ANNOTATIONS_ENTRY)?,
            preferences: reader.read_json_or_default(PREFERENCES_ENTRY)?,
            thumbnails: reader.entries_under(THUMBNAILS_DIR),
            has_background: reader.has_entry(BACKGROUND_ENTRY),
        };

        log::info!(
            "Inspected {:?}: {} annotations, {} preferences, {} thumbnails, background: {}",
            path,
            manifest.annotation_count(),
            manifest.preferences.len(),
            manifest.thumbnails.len(),
            manifest.has_background
        );

        Ok(manifest)
    }

    /// Total number of (name, page) annotation pairs.
    pub fn annotation_count(&self) -> usize {
        self.annotations.values().map(|pages| pages.len()).sum()
    }

    /// Check if the archive carries nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.annotation_count() == 0
            && self.preferences.is_empty()
            && self.thumbnails.is_empty()
            && !self.has_background
    }

    /// One line per category, for confirmation dialogs.
    pub fn summary(&self) -> String {
        format!(
            "Annotations: {}\nPreferences: {}\nThumbnails: {}\nBackground image: {}",
            self.annotation_count(),
            self.preferences.len(),
            self.thumbnails.len(),
            if self.has_background { "yes" } else { "no" }
        )
    }
}
