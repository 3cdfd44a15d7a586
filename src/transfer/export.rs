//! Export transfer stage.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use web_time::Instant;

use crate::archive::{AnnotationMap, ArchiveWriter, PreferenceMap, thumbnail_entry_name};
use crate::config::{BackgroundPolicy, TransferSettings};
use crate::constants::{
    ANNOTATION_NAMES, ANNOTATIONS_ENTRY, BACKGROUND_ENTRY, BACKGROUND_FILE, PREFERENCE_KEYS,
    PREFERENCES_ENTRY, THUMBNAILS_DIR,
};
use crate::error::TransferError;
use crate::host::{AnnotationStore, ExportSources, PreferenceStore};
use crate::transfer::{ExportReport, TransferOptions, TransferWarning};

/// Build `annos.json` from every allow-listed annotation in the store.
pub fn collect_annotations(store: &dyn AnnotationStore) -> Result<AnnotationMap, TransferError> {
    let mut annotations = AnnotationMap::new();
    for &name in ANNOTATION_NAMES {
        let pages = store
            .annotations_named(name)
            .map_err(|e| TransferError::host(name, e))?;
        let mut values = BTreeMap::new();
        for (page, value) in pages {
            let value = serde_json::to_value(&value)
                .map_err(|e| TransferError::json(ANNOTATIONS_ENTRY, e))?;
            values.insert(page, value);
        }
        log::debug!("Collected {} pages for annotation {}", values.len(), name);
        annotations.insert(name.to_string(), values);
    }
    Ok(annotations)
}

/// Build `prefs.json` from the allow-listed preferences that hold a value.
pub fn collect_preferences(prefs: &dyn PreferenceStore) -> Result<PreferenceMap, TransferError> {
    let mut preferences = PreferenceMap::new();
    for &key in PREFERENCE_KEYS {
        let Some(value) = prefs.get_value(key).map_err(|e| TransferError::host(key, e))? else {
            log::trace!("Preference {} not set, skipping", key);
            continue;
        };
        let value =
            serde_json::to_value(&value).map_err(|e| TransferError::json(PREFERENCES_ENTRY, e))?;
        preferences.insert(key.to_string(), value);
    }
    log::debug!("Collected {} preferences", preferences.len());
    Ok(preferences)
}

/// Pick the thumbnail files to archive, keyed by leaf name.
///
/// Only the first `floor(grid cells * overscan)` ranked links are considered.
/// Missing files are skipped and the thumbnail policy filters on whether the
/// file is writable in place. When two links map to the same leaf name the
/// later one wins.
pub fn collect_thumbnails(
    sources: &ExportSources<'_>,
    settings: &TransferSettings,
) -> Result<BTreeMap<String, PathBuf>, TransferError> {
    let limit = settings.thumbnail_limit(sources.links.grid_cell_count());
    let links = sources
        .links
        .links()
        .map_err(|e| TransferError::host("links", e))?;

    let mut selected = BTreeMap::new();
    for link in links.iter().take(limit) {
        let path = sources.thumbnails.path_for_url(&link.url);
        let metadata = match std::fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::trace!("No thumbnail for {}", link.url);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            continue;
        }

        let writable = !metadata.permissions().readonly();
        if !settings.thumbnail_policy.accepts(writable) {
            log::trace!(
                "Skipping thumbnail {:?} (writable: {}, policy: {:?})",
                path,
                writable,
                settings.thumbnail_policy
            );
            continue;
        }

        let Some(leaf) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if selected.insert(leaf.to_string(), path.clone()).is_some() {
            log::debug!("Replacing earlier thumbnail entry {}", leaf);
        }
    }

    log::debug!(
        "Selected {} thumbnails from {} links (limit {})",
        selected.len(),
        links.len(),
        limit
    );
    Ok(selected)
}

/// Write a complete settings archive to `dest`.
///
/// Host state is read before the file is created, so a failing read leaves
/// nothing on disk. Once writing has started, the archive is finished even if
/// a later entry fails, and the partial file stays behind.
pub fn write_archive(
    dest: &Path,
    sources: &ExportSources<'_>,
    options: &TransferOptions,
    settings: &TransferSettings,
) -> Result<ExportReport, TransferError> {
    let started = Instant::now();
    log::info!("Exporting settings to {:?} ({})", dest, options.describe());

    let contents = Contents {
        annotations: if options.annotations {
            collect_annotations(sources.annotations)?
        } else {
            AnnotationMap::new()
        },
        preferences: if options.preferences {
            collect_preferences(sources.prefs)?
        } else {
            PreferenceMap::new()
        },
        thumbnails: if options.thumbnails {
            collect_thumbnails(sources, settings)?
        } else {
            BTreeMap::new()
        },
        background: options
            .background
            .then(|| sources.profile_dir.join(BACKGROUND_FILE)),
    };

    let mut report = ExportReport {
        destination: dest.to_path_buf(),
        annotations_exported: contents.annotations.values().map(|pages| pages.len()).sum(),
        preferences_exported: contents.preferences.len(),
        ..ExportReport::default()
    };

    let mut writer = ArchiveWriter::create(dest)?;
    let written = write_entries(&mut writer, &contents, settings, &mut report);
    let finished = writer.finish();
    written?;
    finished?;

    report.elapsed = started.elapsed();
    log::info!(
        "Exported {} annotations, {} preferences, {} thumbnails, background: {} in {:?}",
        report.annotations_exported,
        report.preferences_exported,
        report.thumbnails_exported,
        report.background_exported,
        report.elapsed
    );
    Ok(report)
}

/// Everything an archive will hold, gathered before the file is created.
struct Contents {
    annotations: AnnotationMap,
    preferences: PreferenceMap,
    thumbnails: BTreeMap<String, PathBuf>,
    background: Option<PathBuf>,
}

fn write_entries(
    writer: &mut ArchiveWriter,
    contents: &Contents,
    settings: &TransferSettings,
    report: &mut ExportReport,
) -> Result<(), TransferError> {
    writer.add_json(ANNOTATIONS_ENTRY, &contents.annotations)?;
    writer.add_json(PREFERENCES_ENTRY, &contents.preferences)?;

    writer.add_directory(THUMBNAILS_DIR)?;
    for (leaf, path) in &contents.thumbnails {
        writer.add_file(&thumbnail_entry_name(leaf), path)?;
        report.thumbnails_exported += 1;
    }

    if let Some(background) = &contents.background {
        if background.is_file() {
            writer.add_file(BACKGROUND_ENTRY, background)?;
            report.background_exported = true;
        } else {
            match settings.background_policy {
                BackgroundPolicy::Optional => report.warnings.push(TransferWarning::new(
                    BACKGROUND_ENTRY,
                    format!("no background image at {}", background.display()),
                )),
                BackgroundPolicy::Required => {
                    return Err(TransferError::MissingBackground {
                        path: background.clone(),
                    });
                }
            }
        }
    }

    Ok(())
}
