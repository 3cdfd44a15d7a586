//! Links shown on the new tab page.
//!
//! Pinned links keep their grid position; the remaining cells are filled
//! with the most visited pages that are not already pinned.

use std::collections::HashSet;

use crate::config::TransferSettings;
use crate::constants::{COLUMNS_PREF, DEFAULT_COLUMNS, DEFAULT_ROWS, PINNED_PREF, ROWS_PREF};
use crate::error::HostError;
use crate::host::{Link, LinkSource, PrefType, PreferenceStore};
use crate::profile::{PlacesDb, PrefsFile};

/// Snapshot of the ranked new tab links and the grid size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopSites {
    links: Vec<Link>,
    cells: usize,
}

impl TopSites {
    /// Build a snapshot from explicit parts.
    pub fn new(links: Vec<Link>, cells: usize) -> Self {
        Self { links, cells }
    }

    /// Read the grid size and pinned links from `prefs` and fill the rest
    /// from the history ranking in `places`.
    ///
    /// `history_limit` caps the number of history pages consulted.
    pub fn load(
        prefs: &dyn PreferenceStore,
        places: &PlacesDb,
        history_limit: usize,
    ) -> Result<Self, HostError> {
        let cells = grid_cell_count(prefs);
        let pinned = pinned_links(prefs)?;
        let history = places.top_sites(history_limit)?;
        let links = merge(pinned, history);
        log::debug!("{} new tab links for a grid of {} cells", links.len(), cells);
        Ok(Self { links, cells })
    }

    /// Links in display order.
    pub fn as_slice(&self) -> &[Link] {
        &self.links
    }
}

impl LinkSource for TopSites {
    fn links(&self) -> Result<Vec<Link>, HostError> {
        Ok(self.links.clone())
    }

    fn grid_cell_count(&self) -> usize {
        self.cells
    }
}

/// New tab links read from the profile on demand.
pub struct ProfileLinks<'a> {
    prefs: &'a PrefsFile,
    places: &'a PlacesDb,
    settings: &'a TransferSettings,
}

impl<'a> ProfileLinks<'a> {
    pub fn new(prefs: &'a PrefsFile, places: &'a PlacesDb, settings: &'a TransferSettings) -> Self {
        Self {
            prefs,
            places,
            settings,
        }
    }
}

impl LinkSource for ProfileLinks<'_> {
    fn links(&self) -> Result<Vec<Link>, HostError> {
        let limit = self.settings.thumbnail_limit(self.grid_cell_count());
        let sites = TopSites::load(self.prefs, self.places, limit)?;
        Ok(sites.links)
    }

    fn grid_cell_count(&self) -> usize {
        grid_cell_count(self.prefs)
    }
}

/// Rows times columns, falling back to the defaults when unset or invalid.
pub fn grid_cell_count(prefs: &dyn PreferenceStore) -> usize {
    let rows = int_pref_or(prefs, ROWS_PREF, DEFAULT_ROWS);
    let columns = int_pref_or(prefs, COLUMNS_PREF, DEFAULT_COLUMNS);
    usize::try_from(rows).unwrap_or(0) * usize::try_from(columns).unwrap_or(0)
}

fn int_pref_or(prefs: &dyn PreferenceStore, key: &str, default: i32) -> i32 {
    if prefs.pref_type(key) != PrefType::Int {
        return default;
    }
    prefs.get_int(key).unwrap_or(default)
}

/// Pinned slots in grid order; `None` marks an unpinned cell.
pub fn pinned_links(prefs: &dyn PreferenceStore) -> Result<Vec<Option<Link>>, HostError> {
    if prefs.pref_type(PINNED_PREF) != PrefType::String {
        return Ok(Vec::new());
    }
    let json = prefs.get_string(PINNED_PREF)?;
    serde_json::from_str(&json).map_err(|e| HostError::malformed(PINNED_PREF, e.to_string()))
}

/// Place pinned links at their index and fill the gaps with history links.
fn merge(pinned: Vec<Option<Link>>, history: Vec<Link>) -> Vec<Link> {
    let pinned_urls: HashSet<String> = pinned
        .iter()
        .flatten()
        .map(|link| link.url.clone())
        .collect();
    let mut history = history
        .into_iter()
        .filter(|link| !pinned_urls.contains(&link.url));

    let mut links = Vec::new();
    for slot in pinned {
        match slot {
            Some(link) => links.push(link),
            None => {
                if let Some(link) = history.next() {
                    links.push(link);
                }
            }
        }
    }
    links.extend(history);
    links
}
