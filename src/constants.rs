//! Global constants for the settings archive.

/// Archive entry holding the annotation map.
pub const ANNOTATIONS_ENTRY: &str = "annos.json";

/// Archive entry holding the preference map.
pub const PREFERENCES_ENTRY: &str = "prefs.json";

/// Directory marker for cached thumbnails. Thumbnail entries are
/// `THUMBNAILS_DIR` followed by the on-disk leaf name.
pub const THUMBNAILS_DIR: &str = "thumbnails/";

/// Archive entry holding the custom background image.
pub const BACKGROUND_ENTRY: &str = "newtab-background";

/// File name of the background image inside the profile directory.
pub const BACKGROUND_FILE: &str = "newtab-background";

/// Suggested file name offered by the save dialog.
pub const DEFAULT_ARCHIVE_NAME: &str = "newtabtools.zip";

/// Extension appended to chosen paths that have none.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Label of the file dialog filter.
pub const ARCHIVE_FILTER_NAME: &str = "Zip Archive";

/// Per-page custom title annotation.
pub const TITLE_ANNOTATION: &str = "newtabtools/title";

/// Annotation names eligible for transfer.
pub const ANNOTATION_NAMES: &[&str] = &[TITLE_ANNOTATION];

/// Preference keys eligible for transfer.
pub const PREFERENCE_KEYS: &[&str] = &[
    "browser.newtabpage.blocked",
    "browser.newtabpage.columns",
    "browser.newtabpage.pinned",
    "browser.newtabpage.rows",
    "extensions.newtabtools.launcher",
    "extensions.newtabtools.launcher.dark",
    "extensions.newtabtools.recent.show",
    "extensions.newtabtools.thumbs.contain",
    "extensions.newtabtools.thumbs.hidebuttons",
    "extensions.newtabtools.thumbs.hidefavicons",
];

/// How many ranked links per displayed grid cell get their thumbnail exported.
pub const DEFAULT_THUMBNAIL_OVERSCAN: f64 = 1.5;

/// Preference holding the pinned links (JSON array with `null` gaps).
pub const PINNED_PREF: &str = "browser.newtabpage.pinned";

/// Preference holding the grid row count.
pub const ROWS_PREF: &str = "browser.newtabpage.rows";

/// Preference holding the grid column count.
pub const COLUMNS_PREF: &str = "browser.newtabpage.columns";

/// Grid rows used when the preference is unset.
pub const DEFAULT_ROWS: i32 = 3;

/// Grid columns used when the preference is unset.
pub const DEFAULT_COLUMNS: i32 = 3;

/// Check whether a preference key is on the transfer allow-list.
pub fn is_transferable_pref(key: &str) -> bool {
    PREFERENCE_KEYS.contains(&key)
}

/// Check whether an annotation name is on the transfer allow-list.
pub fn is_transferable_annotation(name: &str) -> bool {
    ANNOTATION_NAMES.contains(&name)
}
