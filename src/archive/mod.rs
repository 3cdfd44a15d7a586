//! Settings archive container.
//!
//! The archive is a plain zip file with a fixed layout:
//!
//! - `annos.json`: annotation name → page URL → value
//! - `prefs.json`: allow-listed preference key → scalar value
//! - `thumbnails/`: directory marker, followed by `thumbnails/<leaf>` entries
//! - `newtab-background`: raw background image bytes
//!
//! [`ArchiveWriter`] and [`ArchiveReader`] only know about zip entries and JSON
//! documents. Deciding what goes into those documents is the job of the
//! [`crate::transfer`] stages.

mod entries;
mod manifest;
mod reader;
mod writer;

pub use entries::{AnnotationMap, PreferenceMap, leaf_name_from_entry, thumbnail_entry_name};
pub use manifest::Manifest;
pub use reader::ArchiveReader;
pub use writer::ArchiveWriter;
