//! Tests for the export and import transfer stages.
//!
//! These run the stages directly against the in-memory host in
//! [`crate::test_host`]; the interactive pipelines are covered in
//! `pipeline::tests`.

mod import_tests;

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read one archive entry as text, or `None` if it is absent.
fn read_entry(archive: &Path, name: &str) -> Option<String> {
    let mut zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
    let mut entry = zip.by_name(name).ok()?;
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    Some(text)
}

/// All entry names of an archive, sorted.
fn entry_names(archive: &Path) -> Vec<String> {
    let zip = zip::ZipArchive::new(File::open(archive).unwrap()).unwrap();
    let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
    names.sort();
    names
}
