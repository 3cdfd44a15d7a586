//! Tests for the import inspection and apply stages.

use std::path::Path;

use serde_json::json;

use crate::archive::{ArchiveWriter, Manifest};
use crate::error::TransferError;
use crate::host::{AnnotationValue, Expiration, PrefValue};
use crate::test_host::{RecordingSink, TestHost};
use crate::transfer::{TransferOptions, apply_manifest, pref_value_from_json};

/// Build an archive by hand, the way a user might edit one.
fn handcrafted(path: &Path, annos: serde_json::Value, prefs: serde_json::Value) {
    let mut writer = ArchiveWriter::create(path).unwrap();
    writer.add_json("annos.json", &annos).unwrap();
    writer.add_json("prefs.json", &prefs).unwrap();
    writer.add_directory("thumbnails/").unwrap();
    writer.finish().unwrap();
}

#[test]
fn test_applies_annotations_with_history_expiration() {
    let mut host = TestHost::new();
    let path = host.archive_path("in.zip");
    handcrafted(
        &path,
        json!({"newtabtools/title": {"https://example.com/": "Example"}}),
        json!({}),
    );

    let manifest = Manifest::inspect(&path).unwrap();
    let sink = RecordingSink::default();
    let report = apply_manifest(
        &manifest,
        &mut host.targets(),
        &TransferOptions::default(),
        &sink,
    )
    .unwrap();

    assert_eq!(report.annotations_applied, 1);
    assert_eq!(sink.count(), 0);
    let (value, expiration) = &host.annotations.values
        [&("newtabtools/title".to_string(), "https://example.com/".to_string())];
    assert_eq!(value, &AnnotationValue::String("Example".into()));
    assert_eq!(*expiration, Expiration::WithHistory);
}

#[test]
fn test_one_malformed_page_fails_alone() {
    let mut host = TestHost::new();
    let path = host.archive_path("in.zip");
    handcrafted(
        &path,
        json!({"newtabtools/title": {
            "https://a.test/": "A",
            "not a url at all": "Broken",
            "https://c.test/": "C",
            "https://d.test/": "D"
        }}),
        json!({}),
    );

    let manifest = Manifest::inspect(&path).unwrap();
    let sink = RecordingSink::default();
    let report = apply_manifest(
        &manifest,
        &mut host.targets(),
        &TransferOptions::default(),
        &sink,
    )
    .unwrap();

    assert_eq!(report.annotations_applied, 3);
    assert_eq!(report.failures, 1);
    assert_eq!(sink.count(), 1);
    assert!(sink.errors.borrow()[0].contains("not a url at all"));
    assert!(host.annotations.get("newtabtools/title", "https://d.test/").is_some());
}

#[test]
fn test_non_scalar_annotation_value_is_a_failure() {
    let mut host = TestHost::new();
    let path = host.archive_path("in.zip");
    handcrafted(
        &path,
        json!({"newtabtools/title": {"https://a.test/": ["x"], "https://b.test/": "B"}}),
        json!({}),
    );

    let manifest = Manifest::inspect(&path).unwrap();
    let sink = RecordingSink::default();
    let report = apply_manifest(
        &manifest,
        &mut host.targets(),
        &TransferOptions::default(),
        &sink,
    )
    .unwrap();
    assert_eq!(report.annotations_applied, 1);
    assert_eq!(report.failures, 1);
}

#[test]
fn test_preferences_dispatch_on_value_type() {
    let mut host = TestHost::new();
    let path = host.archive_path("in.zip");
    handcrafted(
        &path,
        json!({}),
        json!({
            "browser.newtabpage.rows": 4,
            "extensions.newtabtools.launcher": "2",
            "extensions.newtabtools.launcher.dark": true
        }),
    );

    let manifest = Manifest::inspect(&path).unwrap();
    let sink = RecordingSink::default();
    let report = apply_manifest(
        &manifest,
        &mut host.targets(),
        &TransferOptions::default(),
        &sink,
    )
    .unwrap();

    assert_eq!(report.preferences_applied, 3);
    assert_eq!(host.prefs.values["browser.newtabpage.rows"], PrefValue::Int(4));
    assert_eq!(
        host.prefs.values["extensions.newtabtools.launcher"],
        PrefValue::String("2".into())
    );
    assert_eq!(
        host.prefs.values["extensions.newtabtools.launcher.dark"],
        PrefValue::Bool(true)
    );
}

#[test]
fn test_unknown_keys_and_names_are_never_written() {
    let mut host = TestHost::new();
    let path = host.archive_path("in.zip");
    handcrafted(
        &path,
        json!({
            "newtabtools/title": {"https://a.test/": "A"},
            "bookmarkProperties/description": {"https://a.test/": "injected"}
        }),
        json!({
            "browser.newtabpage.rows": 2,
            "browser.startup.homepage": "https://evil.test/"
        }),
    );

    let manifest = Manifest::inspect(&path).unwrap();
    let sink = RecordingSink::default();
    let report = apply_manifest(
        &manifest,
        &mut host.targets(),
        &TransferOptions::default(),
        &sink,
    )
    .unwrap();

    assert!(!host.prefs.values.contains_key("browser.startup.homepage"));
    assert!(
        host.annotations
            .get("bookmarkProperties/description", "https://a.test/")
            .is_none()
    );
    assert_eq!(report.preferences_applied, 1);
    assert_eq!(report.annotations_applied, 1);
    assert_eq!(report.warnings.len(), 2);
    assert_eq!(sink.count(), 0);
}

#[test]
fn test_preference_failures_are_isolated() {
    let mut host = TestHost::new();
    host.prefs
        .values
        .insert("browser.newtabpage.columns".into(), PrefValue::String("wide".into()));
    host.prefs
        .locked
        .insert("extensions.newtabtools.recent.show".into());
    let path = host.archive_path("in.zip");
    handcrafted(
        &path,
        json!({}),
        json!({
            "browser.newtabpage.columns": 5,
            "browser.newtabpage.rows": 2.5,
            "extensions.newtabtools.recent.show": false,
            "extensions.newtabtools.thumbs.contain": true,
            "extensions.newtabtools.thumbs.hidebuttons": null
        }),
    );

    let manifest = Manifest::inspect(&path).unwrap();
    let sink = RecordingSink::default();
    let report = apply_manifest(
        &manifest,
        &mut host.targets(),
        &TransferOptions::default(),
        &sink,
    )
    .unwrap();

    // type mismatch, non-integer, locked
    assert_eq!(report.failures, 3);
    assert_eq!(sink.count(), 3);
    // null is skipped with a warning
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.preferences_applied, 1);
    assert_eq!(
        host.prefs.values["extensions.newtabtools.thumbs.contain"],
        PrefValue::Bool(true)
    );
    assert_eq!(
        host.prefs.values["browser.newtabpage.columns"],
        PrefValue::String("wide".into())
    );
}

#[test]
fn test_restores_thumbnails_and_background() {
    let mut host = TestHost::new();
    let scratch = tempfile::tempdir().unwrap();
    let image = scratch.path().join("img");
    std::fs::write(&image, b"thumb").unwrap();
    let background = scratch.path().join("bg");
    std::fs::write(&background, b"background").unwrap();

    let path = host.archive_path("in.zip");
    let mut writer = ArchiveWriter::create(&path).unwrap();
    writer.add_directory("thumbnails/").unwrap();
    writer.add_file("thumbnails/abc.png", &image).unwrap();
    writer.add_file("newtab-background", &background).unwrap();
    writer.finish().unwrap();
    host.write_background(b"old background");

    let manifest = Manifest::inspect(&path).unwrap();
    let sink = RecordingSink::default();
    let report = apply_manifest(
        &manifest,
        &mut host.targets(),
        &TransferOptions::default(),
        &sink,
    )
    .unwrap();

    assert_eq!(report.thumbnails_restored, 1);
    assert!(report.background_restored);
    assert_eq!(
        std::fs::read(host.thumbnails.dir.join("abc.png")).unwrap(),
        b"thumb"
    );
    assert_eq!(
        std::fs::read(host.profile_dir().join("newtab-background")).unwrap(),
        b"background"
    );
}

#[test]
fn test_unsafe_thumbnail_names_are_reported_and_skipped() {
    let mut host = TestHost::new();
    let scratch = tempfile::tempdir().unwrap();
    let image = scratch.path().join("img");
    std::fs::write(&image, b"payload").unwrap();

    let path = host.archive_path("evil.zip");
    let mut writer = ArchiveWriter::create(&path).unwrap();
    writer.add_directory("thumbnails/").unwrap();
    writer.add_file("thumbnails/../escape.png", &image).unwrap();
    writer.add_file("thumbnails/ok.png", &image).unwrap();
    writer.finish().unwrap();

    let manifest = Manifest::inspect(&path).unwrap();
    let sink = RecordingSink::default();
    let report = apply_manifest(
        &manifest,
        &mut host.targets(),
        &TransferOptions::default(),
        &sink,
    )
    .unwrap();

    assert_eq!(report.thumbnails_restored, 1);
    assert_eq!(report.failures, 1);
    assert!(!host.profile_dir().join("escape.png").exists());
    assert!(host.thumbnails.dir.join("ok.png").exists());
}

#[test]
fn test_options_limit_what_is_applied() {
    let mut host = TestHost::new();
    let path = host.archive_path("in.zip");
    handcrafted(
        &path,
        json!({"newtabtools/title": {"https://a.test/": "A"}}),
        json!({"browser.newtabpage.rows": 2}),
    );

    let manifest = Manifest::inspect(&path).unwrap();
    let options = TransferOptions {
        annotations: false,
        ..TransferOptions::default()
    };
    let report = apply_manifest(
        &manifest,
        &mut host.targets(),
        &options,
        &RecordingSink::default(),
    )
    .unwrap();

    assert_eq!(report.annotations_applied, 0);
    assert_eq!(report.preferences_applied, 1);
    assert!(host.annotations.values.is_empty());
}

#[test]
fn test_vanished_archive_aborts_before_writing() {
    let mut host = TestHost::new();
    let path = host.archive_path("in.zip");
    handcrafted(&path, json!({}), json!({"browser.newtabpage.rows": 2}));
    let manifest = Manifest::inspect(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let err = apply_manifest(
        &manifest,
        &mut host.targets(),
        &TransferOptions::default(),
        &RecordingSink::default(),
    )
    .unwrap_err();
    assert!(matches!(err, TransferError::Io(_)));
    assert!(host.prefs.values.is_empty());
}

#[test]
fn test_pref_value_from_json() {
    assert_eq!(
        pref_value_from_json("k", &json!(7)).unwrap(),
        Some(PrefValue::Int(7))
    );
    assert_eq!(
        pref_value_from_json("k", &json!(-1)).unwrap(),
        Some(PrefValue::Int(-1))
    );
    assert!(pref_value_from_json("k", &json!(1u64 << 40)).is_err());
    assert!(pref_value_from_json("k", &json!(1.5)).is_err());
    assert_eq!(pref_value_from_json("k", &json!(null)).unwrap(), None);
    assert_eq!(pref_value_from_json("k", &json!({"a": 1})).unwrap(), None);
}
