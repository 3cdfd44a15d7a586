//! JSON documents and entry naming used inside the archive.

use std::collections::BTreeMap;
use std::path::Path;

use crate::constants::THUMBNAILS_DIR;

/// Contents of `annos.json`.
///
/// Values stay as raw JSON so a single bad value in a hand-edited archive
/// fails only its own item on import.
pub type AnnotationMap = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

/// Contents of `prefs.json`.
pub type PreferenceMap = BTreeMap<String, serde_json::Value>;

/// Archive entry name for a thumbnail file.
pub fn thumbnail_entry_name(leaf: &str) -> String {
    format!("{THUMBNAILS_DIR}{leaf}")
}

/// On-disk leaf name for a thumbnail entry.
///
/// Returns `None` unless the entry sits under `thumbnails/` and the rest is a
/// single plain file name, so extraction can never escape the thumbnail
/// directory.
pub fn leaf_name_from_entry(entry: &str) -> Option<&str> {
    let leaf = entry.strip_prefix(THUMBNAILS_DIR)?;
    if leaf.is_empty() || leaf.contains(['/', '\\']) {
        return None;
    }
    let is_plain = Path::new(leaf)
        .file_name()
        .map(|name| name == leaf)
        .unwrap_or(false);
    is_plain.then_some(leaf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_name_recovery() {
        for leaf in ["abc.png", "0f3c9e.png", "no-extension", "with space.png"] {
            let entry = thumbnail_entry_name(leaf);
            assert_eq!(&entry[..11], "thumbnails/");
            assert_eq!(&entry[11..], leaf);
            assert_eq!(leaf_name_from_entry(&entry), Some(leaf));
        }
    }

    #[test]
    fn test_rejects_unsafe_leaves() {
        assert_eq!(leaf_name_from_entry("thumbnails/"), None);
        assert_eq!(leaf_name_from_entry("thumbnails/.."), None);
        assert_eq!(leaf_name_from_entry("thumbnails/."), None);
        assert_eq!(leaf_name_from_entry("thumbnails/../prefs.js"), None);
        assert_eq!(leaf_name_from_entry("thumbnails/sub/a.png"), None);
        assert_eq!(leaf_name_from_entry("thumbnails/..\\a.png"), None);
        assert_eq!(leaf_name_from_entry("other/a.png"), None);
    }
}
