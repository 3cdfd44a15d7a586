//! Zip writer for settings archives.

use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::TransferError;

/// Writes entries into a new settings archive.
///
/// The destination is created (or truncated) on [`ArchiveWriter::create`].
/// Call [`ArchiveWriter::finish`] to write the central directory; a writer
/// dropped without finishing leaves an unreadable file behind.
pub struct ArchiveWriter {
    zip: ZipWriter<File>,
    path: PathBuf,
    options: SimpleFileOptions,
    names: HashSet<String>,
}

impl ArchiveWriter {
    /// Create the archive file at `path`, truncating any existing file.
    pub fn create(path: &Path) -> Result<Self, TransferError> {
        log::debug!("Creating archive {:?}", path);
        let file = File::create(path)?;
        Ok(Self {
            zip: ZipWriter::new(file),
            path: path.to_path_buf(),
            options: SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Deflated),
            names: HashSet::new(),
        })
    }

    /// Destination path of this archive.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether an entry has already been written.
    pub fn has_entry(&self, entry: &str) -> bool {
        self.names.contains(entry)
    }

    /// Serialize `value` as compact JSON into `entry`.
    pub fn add_json<T: Serialize>(&mut self, entry: &str, value: &T) -> Result<(), TransferError> {
        let data = serde_json::to_vec(value).map_err(|e| TransferError::json(entry, e))?;
        self.zip.start_file(entry, self.options)?;
        self.zip.write_all(&data)?;
        self.names.insert(entry.to_string());
        log::trace!("Wrote {} ({} bytes)", entry, data.len());
        Ok(())
    }

    /// Add a directory marker entry. `entry` must end with `/`.
    pub fn add_directory(&mut self, entry: &str) -> Result<(), TransferError> {
        self.zip.add_directory(entry, self.options)?;
        self.names.insert(entry.to_string());
        log::trace!("Wrote directory {}", entry);
        Ok(())
    }

    /// Copy the contents of `source` into `entry`, returning the byte count.
    pub fn add_file(&mut self, entry: &str, source: &Path) -> Result<u64, TransferError> {
        let mut input = File::open(source)?;
        self.zip.start_file(entry, self.options)?;
        let size = std::io::copy(&mut input, &mut self.zip)?;
        self.names.insert(entry.to_string());
        log::trace!("Wrote {} from {:?} ({} bytes)", entry, source, size);
        Ok(size)
    }

    /// Write the central directory and close the file.
    pub fn finish(self) -> Result<PathBuf, TransferError> {
        let mut file = self.zip.finish()?;
        file.flush()?;
        log::debug!("Closed archive {:?} ({} entries)", self.path, self.names.len());
        Ok(self.path)
    }
}
