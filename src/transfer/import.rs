//! Import apply stage.

use serde_json::Value;
use url::Url;
use web_time::Instant;

use crate::archive::{AnnotationMap, ArchiveReader, Manifest, PreferenceMap, leaf_name_from_entry};
use crate::constants::{
    BACKGROUND_ENTRY, BACKGROUND_FILE, is_transferable_annotation, is_transferable_pref,
};
use crate::error::TransferError;
use crate::host::{
    AnnotationStore, AnnotationValue, ErrorSink, Expiration, ImportTargets, PrefValue,
    PreferenceStore,
};
use crate::transfer::{ImportReport, TransferOptions, TransferWarning};

/// Apply an inspected archive to host state.
///
/// The archive is re-opened first; failing to open it aborts the import
/// before anything is written. Individual annotations, preferences and
/// unsafe thumbnail names are reported to `errors` and skipped. Extraction
/// failures abort the remaining work.
pub fn apply_manifest(
    manifest: &Manifest,
    targets: &mut ImportTargets<'_>,
    options: &TransferOptions,
    errors: &dyn ErrorSink,
) -> Result<ImportReport, TransferError> {
    let started = Instant::now();
    log::info!(
        "Importing settings from {:?} ({})",
        manifest.source,
        options.describe()
    );

    let mut reader = ArchiveReader::open(&manifest.source)?;
    let mut report = ImportReport {
        source: manifest.source.clone(),
        ..ImportReport::default()
    };

    if options.annotations {
        apply_annotations(&manifest.annotations, targets.annotations, errors, &mut report);
    }
    if options.preferences {
        apply_preferences(&manifest.preferences, targets.prefs, errors, &mut report);
    }

    if options.thumbnails {
        let directory = targets.thumbnails.directory();
        for entry in &manifest.thumbnails {
            let Some(leaf) = leaf_name_from_entry(entry) else {
                errors.report(&TransferError::UnsafeEntryName {
                    entry: entry.clone(),
                });
                report.failures += 1;
                continue;
            };
            reader.extract_to(entry, &directory.join(leaf))?;
            report.thumbnails_restored += 1;
        }
    }

    if options.background && manifest.has_background {
        reader.extract_to(BACKGROUND_ENTRY, &targets.profile_dir.join(BACKGROUND_FILE))?;
        report.background_restored = true;
    }

    report.elapsed = started.elapsed();
    log::info!(
        "Imported {} annotations, {} preferences, {} thumbnails, background: {} ({} failures) in {:?}",
        report.annotations_applied,
        report.preferences_applied,
        report.thumbnails_restored,
        report.background_restored,
        report.failures,
        report.elapsed
    );
    Ok(report)
}

fn apply_annotations(
    annotations: &AnnotationMap,
    store: &mut dyn AnnotationStore,
    errors: &dyn ErrorSink,
    report: &mut ImportReport,
) {
    for (name, pages) in annotations {
        if !is_transferable_annotation(name) {
            report.warnings.push(TransferWarning::new(
                name.as_str(),
                "annotation is not transferable, skipped",
            ));
            continue;
        }
        for (page, value) in pages {
            match apply_annotation(store, name, page, value) {
                Ok(()) => report.annotations_applied += 1,
                Err(e) => {
                    errors.report(&e);
                    report.failures += 1;
                }
            }
        }
    }
}

fn apply_annotation(
    store: &mut dyn AnnotationStore,
    name: &str,
    page: &str,
    value: &Value,
) -> Result<(), TransferError> {
    let uri = Url::parse(page).map_err(|source| TransferError::InvalidUrl {
        name: name.to_string(),
        page: page.to_string(),
        source,
    })?;
    let value = AnnotationValue::from_json(page, value)?;
    store
        .set_page_annotation(&uri, name, &value, Expiration::WithHistory)
        .map_err(|e| TransferError::host(page, e))?;
    log::trace!("Set {} on {}", name, page);
    Ok(())
}

fn apply_preferences(
    preferences: &PreferenceMap,
    prefs: &mut dyn PreferenceStore,
    errors: &dyn ErrorSink,
    report: &mut ImportReport,
) {
    for (key, value) in preferences {
        if !is_transferable_pref(key) {
            report.warnings.push(TransferWarning::new(
                key.as_str(),
                "preference is not transferable, skipped",
            ));
            continue;
        }
        let result = pref_value_from_json(key, value).and_then(|pref| match pref {
            Some(pref) => prefs
                .set_value(key, &pref)
                .map(|()| true)
                .map_err(|e| TransferError::host(key.as_str(), e)),
            None => Ok(false),
        });
        match result {
            Ok(true) => {
                log::trace!("Set preference {}", key);
                report.preferences_applied += 1;
            }
            Ok(false) => report.warnings.push(TransferWarning::new(
                key.as_str(),
                format!("value {} is not a scalar, skipped", value),
            )),
            Err(e) => {
                errors.report(&e);
                report.failures += 1;
            }
        }
    }
}

/// Convert an archived preference value, dispatching on its JSON type.
///
/// Returns `Ok(None)` for `null`, arrays and objects, which no preference
/// setter accepts. Numbers must be integers that fit in 32 bits.
pub fn pref_value_from_json(key: &str, value: &Value) -> Result<Option<PrefValue>, TransferError> {
    match value {
        Value::String(s) => Ok(Some(PrefValue::String(s.clone()))),
        Value::Bool(b) => Ok(Some(PrefValue::Bool(*b))),
        Value::Number(n) => n
            .as_i64()
            .and_then(|i| i32::try_from(i).ok())
            .map(|i| Some(PrefValue::Int(i)))
            .ok_or_else(|| TransferError::unsupported_value(key, value)),
        Value::Null | Value::Array(_) | Value::Object(_) => Ok(None),
    }
}
