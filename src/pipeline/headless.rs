//! Non-interactive stand-ins for the file picker and prompt.
//!
//! Used when paths and choices come from the command line.

use std::path::PathBuf;

use crate::archive::Manifest;
use crate::pipeline::{Direction, FilePicker, FileRequest, Prompt};
use crate::transfer::TransferOptions;

/// File picker that always answers with the same path.
#[derive(Debug, Clone)]
pub struct FixedPath(pub PathBuf);

impl FilePicker for FixedPath {
    async fn pick_save(&self, _request: &FileRequest) -> Option<PathBuf> {
        Some(self.0.clone())
    }

    async fn pick_open(&self, _request: &FileRequest) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

/// Prompt that accepts every dialog with preset options.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm {
    /// Categories to transfer
    pub options: TransferOptions,
}

impl AutoConfirm {
    /// Accept with the given options.
    pub fn new(options: TransferOptions) -> Self {
        Self { options }
    }
}

impl Prompt for AutoConfirm {
    async fn export_options(&self, _defaults: TransferOptions) -> Option<TransferOptions> {
        Some(self.options)
    }

    async fn confirm_import(&self, manifest: &Manifest) -> Option<TransferOptions> {
        log::info!(
            "Applying {:?} without confirmation:\n{}",
            manifest.source,
            manifest.summary()
        );
        Some(self.options)
    }

    fn notify_cancelled(&self, direction: Direction) {
        log::info!("{} cancelled", direction.name());
    }
}
