//! Native OS dialogs for the interactive stages.

use std::path::{Path, PathBuf};

use rfd::{
    AsyncFileDialog, AsyncMessageDialog, MessageButtons, MessageDialog, MessageDialogResult,
    MessageLevel,
};

use crate::archive::Manifest;
use crate::pipeline::{Direction, FilePicker, FileRequest, Prompt};
use crate::transfer::TransferOptions;

const DIALOG_TITLE: &str = "New Tab Tools";

fn file_dialog(request: &FileRequest) -> AsyncFileDialog {
    let mut dialog = AsyncFileDialog::new()
        .set_title(&request.title)
        .add_filter(request.filter_name, request.extensions);
    if let Some(name) = &request.default_name {
        dialog = dialog.set_file_name(name);
    }
    if let Some(dir) = &request.directory {
        dialog = dialog.set_directory(dir);
    }
    dialog
}

/// File picker backed by the platform's file dialog.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeFilePicker;

impl NativeFilePicker {
    /// Ask for a directory. `None` means the user cancelled.
    pub async fn pick_folder(&self, title: &str, directory: Option<&Path>) -> Option<PathBuf> {
        let mut dialog = AsyncFileDialog::new().set_title(title);
        if let Some(dir) = directory {
            dialog = dialog.set_directory(dir);
        }
        dialog
            .pick_folder()
            .await
            .map(|handle| handle.path().to_path_buf())
    }
}

impl FilePicker for NativeFilePicker {
    async fn pick_save(&self, request: &FileRequest) -> Option<PathBuf> {
        file_dialog(request)
            .save_file()
            .await
            .map(|handle| handle.path().to_path_buf())
    }

    async fn pick_open(&self, request: &FileRequest) -> Option<PathBuf> {
        file_dialog(request)
            .pick_file()
            .await
            .map(|handle| handle.path().to_path_buf())
    }
}

/// Prompt backed by platform message boxes.
///
/// Message boxes only offer OK/Cancel, so the categories themselves come from
/// `options` and the dialog confirms them.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativePrompt {
    /// Categories offered for transfer
    pub options: TransferOptions,
}

impl NativePrompt {
    /// Create a prompt offering `options`.
    pub fn new(options: TransferOptions) -> Self {
        Self { options }
    }

    async fn ask(&self, description: String) -> bool {
        let answer = AsyncMessageDialog::new()
            .set_level(MessageLevel::Info)
            .set_title(DIALOG_TITLE)
            .set_description(description)
            .set_buttons(MessageButtons::OkCancel)
            .show()
            .await;
        matches!(answer, MessageDialogResult::Ok | MessageDialogResult::Yes)
    }
}

impl Prompt for NativePrompt {
    async fn export_options(&self, _defaults: TransferOptions) -> Option<TransferOptions> {
        let description = format!("Export {}?", self.options.describe());
        self.ask(description).await.then_some(self.options)
    }

    async fn confirm_import(&self, manifest: &Manifest) -> Option<TransferOptions> {
        let description = format!(
            "{}\n\n{}\n\nImport {}? Existing values will be overwritten.",
            manifest.source.display(),
            manifest.summary(),
            self.options.describe()
        );
        self.ask(description).await.then_some(self.options)
    }

    fn notify_cancelled(&self, direction: Direction) {
        MessageDialog::new()
            .set_level(MessageLevel::Info)
            .set_title(DIALOG_TITLE)
            .set_description(format!("{} cancelled", direction.name()))
            .set_buttons(MessageButtons::Ok)
            .show();
    }
}
