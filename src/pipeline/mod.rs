//! Interactive export and import pipelines.
//!
//! A pipeline is a short sequence of awaited stages. Interactive stages
//! (options dialog, file picker, import confirmation) may be cancelled by the
//! user, which ends the pipeline without touching the archive or host state.
//! The transfer stage does the archive work through [`crate::transfer`].
//!
//! ```text
//! export: AwaitingOptions -> AwaitingPath -> Transferring -> Done
//! import: AwaitingPath -> Inspecting -> AwaitingConfirmation -> Transferring -> Done
//!         (any interactive state) -> Cancelled, (any live state) -> Failed
//! ```

mod dialogs;
mod headless;
mod state;


use std::future::Future;
use std::path::{Path, PathBuf};

pub use dialogs::{NativeFilePicker, NativePrompt};
pub use headless::{AutoConfirm, FixedPath};
pub use state::{Direction, PipelineState, Stage};

use crate::archive::Manifest;
use crate::config::TransferSettings;
use crate::constants::{ARCHIVE_EXTENSION, ARCHIVE_FILTER_NAME, DEFAULT_ARCHIVE_NAME};
use crate::error::TransferError;
use crate::host::{ErrorSink, ExportSources, ImportTargets};
use crate::transfer::{ExportReport, ImportReport, TransferOptions, apply_manifest, write_archive};
use state::Tracker;

/// Parameters for a file selection dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRequest {
    /// Dialog title
    pub title: String,
    /// Label of the file type filter
    pub filter_name: &'static str,
    /// Extensions accepted by the filter
    pub extensions: &'static [&'static str],
    /// Suggested file name (save dialogs only)
    pub default_name: Option<String>,
    /// Folder the dialog starts in
    pub directory: Option<PathBuf>,
}

impl FileRequest {
    /// Request for the export destination.
    pub fn save(directory: Option<PathBuf>) -> Self {
        Self {
            title: "Export New Tab Tools settings".to_string(),
            filter_name: ARCHIVE_FILTER_NAME,
            extensions: &[ARCHIVE_EXTENSION],
            default_name: Some(DEFAULT_ARCHIVE_NAME.to_string()),
            directory,
        }
    }

    /// Request for the import source.
    pub fn open(directory: Option<PathBuf>) -> Self {
        Self {
            title: "Import New Tab Tools settings".to_string(),
            filter_name: ARCHIVE_FILTER_NAME,
            extensions: &[ARCHIVE_EXTENSION],
            default_name: None,
            directory,
        }
    }
}

/// Modal file selection.
pub trait FilePicker {
    /// Ask for a destination path. `None` means the user cancelled.
    fn pick_save(&self, request: &FileRequest) -> impl Future<Output = Option<PathBuf>>;

    /// Ask for an existing file. `None` means the user cancelled.
    fn pick_open(&self, request: &FileRequest) -> impl Future<Output = Option<PathBuf>>;
}

/// Modal option and confirmation dialogs.
pub trait Prompt {
    /// Let the user choose what to export. `None` means cancelled.
    fn export_options(
        &self,
        defaults: TransferOptions,
    ) -> impl Future<Output = Option<TransferOptions>>;

    /// Show what an archive contains and ask whether (and what) to apply.
    fn confirm_import(&self, manifest: &Manifest) -> impl Future<Output = Option<TransferOptions>>;

    /// Tell the user the operation was cancelled.
    fn notify_cancelled(&self, direction: Direction);
}

/// How a pipeline run ended.
#[derive(Debug)]
pub enum PipelineResult<R> {
    /// Transfer completed
    Done(R),
    /// User cancelled at an interactive stage
    Cancelled(Stage),
    /// Transfer failed; the error was also sent to the error sink
    Failed(TransferError),
}

impl<R> PipelineResult<R> {
    /// Terminal state corresponding to this result.
    pub fn state(&self) -> PipelineState {
        match self {
            PipelineResult::Done(_) => PipelineState::Done,
            PipelineResult::Cancelled(_) => PipelineState::Cancelled,
            PipelineResult::Failed(_) => PipelineState::Failed,
        }
    }

    /// The report, if the transfer completed.
    pub fn report(&self) -> Option<&R> {
        match self {
            PipelineResult::Done(report) => Some(report),
            _ => None,
        }
    }
}

/// Outcome of the stages before failures are routed to the error sink.
enum Flow<R> {
    Completed(R),
    Cancelled(Stage),
}

/// Drives export and import runs against a prompt, a file picker and an error sink.
pub struct Pipeline<'a, P, F> {
    prompt: &'a P,
    picker: &'a F,
    settings: &'a TransferSettings,
    errors: &'a dyn ErrorSink,
    start_dir: Option<PathBuf>,
}

impl<'a, P: Prompt, F: FilePicker> Pipeline<'a, P, F> {
    /// Create a pipeline.
    pub fn new(
        prompt: &'a P,
        picker: &'a F,
        settings: &'a TransferSettings,
        errors: &'a dyn ErrorSink,
    ) -> Self {
        Self {
            prompt,
            picker,
            settings,
            errors,
            start_dir: None,
        }
    }

    /// Folder the file dialogs start in.
    pub fn with_start_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.start_dir = dir;
        self
    }

    /// Run the export pipeline.
    pub async fn export(&self, sources: &ExportSources<'_>) -> PipelineResult<ExportReport> {
        let mut tracker = Tracker::new(Direction::Export);
        let result = self.export_stages(&mut tracker, sources).await;
        self.finish(tracker, result)
    }

    /// Run the import pipeline.
    pub async fn import(&self, targets: &mut ImportTargets<'_>) -> PipelineResult<ImportReport> {
        let mut tracker = Tracker::new(Direction::Import);
        let result = self.import_stages(&mut tracker, targets).await;
        self.finish(tracker, result)
    }

    async fn export_stages(
        &self,
        tracker: &mut Tracker,
        sources: &ExportSources<'_>,
    ) -> Result<Flow<ExportReport>, TransferError> {
        let Some(options) = self.prompt.export_options(TransferOptions::default()).await else {
            return Ok(Flow::Cancelled(Stage::Options));
        };

        tracker.advance(PipelineState::AwaitingPath)?;
        let request = FileRequest::save(self.start_dir.clone());
        let Some(path) = self.picker.pick_save(&request).await else {
            return Ok(Flow::Cancelled(Stage::FileLocation));
        };
        let path = with_archive_extension(path);

        tracker.advance(PipelineState::Transferring)?;
        let report = write_archive(&path, sources, &options, self.settings)?;

        tracker.advance(PipelineState::Done)?;
        Ok(Flow::Completed(report))
    }

    async fn import_stages(
        &self,
        tracker: &mut Tracker,
        targets: &mut ImportTargets<'_>,
    ) -> Result<Flow<ImportReport>, TransferError> {
        let request = FileRequest::open(self.start_dir.clone());
        let Some(path) = self.picker.pick_open(&request).await else {
            return Ok(Flow::Cancelled(Stage::FileLocation));
        };

        tracker.advance(PipelineState::Inspecting)?;
        let manifest = Manifest::inspect(&path)?;

        tracker.advance(PipelineState::AwaitingConfirmation)?;
        let Some(options) = self.prompt.confirm_import(&manifest).await else {
            return Ok(Flow::Cancelled(Stage::Confirmation));
        };

        tracker.advance(PipelineState::Transferring)?;
        let report = apply_manifest(&manifest, targets, &options, self.errors)?;

        tracker.advance(PipelineState::Done)?;
        Ok(Flow::Completed(report))
    }

    fn finish<R>(
        &self,
        mut tracker: Tracker,
        result: Result<Flow<R>, TransferError>,
    ) -> PipelineResult<R> {
        match result {
            Ok(Flow::Completed(report)) => PipelineResult::Done(report),
            Ok(Flow::Cancelled(stage)) => {
                tracker.terminate(PipelineState::Cancelled);
                log::info!("{} cancelled at {}", tracker.direction().name(), stage.name());
                self.prompt.notify_cancelled(tracker.direction());
                PipelineResult::Cancelled(stage)
            }
            Err(e) => {
                tracker.terminate(PipelineState::Failed);
                self.errors.report(&e);
                PipelineResult::Failed(e)
            }
        }
    }
}

/// Append `.zip` to a chosen path that has no extension.
pub fn with_archive_extension(mut path: PathBuf) -> PathBuf {
    if path.extension().is_none() {
        path.set_extension(ARCHIVE_EXTENSION);
    }
    path
}

/// Folder containing `path`, for remembering where the user last looked.
pub fn parent_folder(path: &Path) -> Option<PathBuf> {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}
