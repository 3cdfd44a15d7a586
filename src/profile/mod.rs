//! Browser profile backend.
//!
//! Implements the host traits on top of the files in a profile directory:
//! `prefs.js` for preferences, `places.sqlite` for page annotations and
//! history ranking, and the thumbnail cache directory.

mod links;
mod places;
mod prefs_js;
mod thumbnails;

use std::path::{Path, PathBuf};

pub use links::{ProfileLinks, TopSites, grid_cell_count, pinned_links};
pub use places::PlacesDb;
pub use prefs_js::PrefsFile;
pub use thumbnails::ThumbnailStorage;

use crate::config::TransferSettings;
use crate::error::HostError;
use crate::host::{ExportSources, ImportTargets, LinkSource};

/// Preference file inside a profile.
pub const PREFS_FILE: &str = "prefs.js";

/// Places database inside a profile.
pub const PLACES_FILE: &str = "places.sqlite";

/// An opened browser profile.
pub struct Profile {
    dir: PathBuf,
    prefs: PrefsFile,
    places: PlacesDb,
    thumbnails: ThumbnailStorage,
}

impl Profile {
    /// Open the profile in `dir`, keeping thumbnails in `thumbnails_dir`.
    pub fn open(dir: &Path, thumbnails_dir: PathBuf) -> Result<Self, HostError> {
        if !dir.is_dir() {
            return Err(HostError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("profile directory {:?} does not exist", dir),
            )));
        }
        let prefs = PrefsFile::load(&dir.join(PREFS_FILE))?;
        let places = PlacesDb::open(&dir.join(PLACES_FILE))?;
        log::info!("Opened profile {:?}", dir);
        Ok(Self {
            dir: dir.to_path_buf(),
            prefs,
            places,
            thumbnails: ThumbnailStorage::new(thumbnails_dir),
        })
    }

    /// Profile directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Preference store.
    pub fn prefs(&self) -> &PrefsFile {
        &self.prefs
    }

    /// Places database.
    pub fn places(&self) -> &PlacesDb {
        &self.places
    }

    /// Snapshot of the new tab links, consulting as much history as the
    /// thumbnail export can use.
    pub fn top_sites(&self, settings: &TransferSettings) -> Result<TopSites, HostError> {
        let cells = grid_cell_count(&self.prefs);
        TopSites::load(&self.prefs, &self.places, settings.thumbnail_limit(cells))
    }

    /// New tab links, loaded only when an export asks for them.
    pub fn links<'a>(&'a self, settings: &'a TransferSettings) -> ProfileLinks<'a> {
        ProfileLinks::new(&self.prefs, &self.places, settings)
    }

    /// Host state for an export.
    pub fn sources<'a>(&'a self, links: &'a dyn LinkSource) -> ExportSources<'a> {
        ExportSources {
            prefs: &self.prefs,
            annotations: &self.places,
            thumbnails: &self.thumbnails,
            links,
            profile_dir: &self.dir,
        }
    }

    /// Host state for an import.
    pub fn targets(&mut self) -> ImportTargets<'_> {
        ImportTargets {
            prefs: &mut self.prefs,
            annotations: &mut self.places,
            thumbnails: &self.thumbnails,
            profile_dir: &self.dir,
        }
    }

    /// Write changed preferences back to `prefs.js`.
    pub fn save(&mut self) -> Result<(), HostError> {
        self.prefs.save()
    }
}
