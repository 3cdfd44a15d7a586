//! Zip reader for settings archives.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use zip::ZipArchive;

use crate::error::TransferError;

/// Read-only view of a settings archive.
///
/// The underlying file is closed when the reader is dropped, which happens on
/// every exit path of the function owning it.
pub struct ArchiveReader {
    zip: ZipArchive<File>,
    path: PathBuf,
}

impl ArchiveReader {
    /// Open an existing archive.
    pub fn open(path: &Path) -> Result<Self, TransferError> {
        log::debug!("Opening archive {:?}", path);
        let file = File::open(path)?;
        let zip = ZipArchive::new(file)?;
        log::debug!("Archive {:?} contains {} entries", path, zip.len());
        Ok(Self {
            zip,
            path: path.to_path_buf(),
        })
    }

    /// Path this archive was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether `entry` exists.
    pub fn has_entry(&self, entry: &str) -> bool {
        self.zip.index_for_name(entry).is_some()
    }

    /// Parse a JSON entry, or return the default value when it is absent.
    pub fn read_json_or_default<T>(&mut self, entry: &str) -> Result<T, TransferError>
    where
        T: DeserializeOwned + Default,
    {
        if !self.has_entry(entry) {
            log::debug!("No {} in archive, treating as empty", entry);
            return Ok(T::default());
        }
        let mut file = self.zip.by_name(entry)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        serde_json::from_slice(&data).map_err(|e| TransferError::json(entry, e))
    }

    /// Names of all entries starting with `prefix`, excluding `prefix` itself.
    pub fn entries_under(&self, prefix: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .zip
            .file_names()
            .filter(|name| name.starts_with(prefix) && *name != prefix)
            .map(str::to_string)
            .collect();
        names.sort();
        names
    }

    /// Extract `entry` to `dest`, overwriting any existing file.
    ///
    /// Data is written next to `dest` first and renamed into place, so a
    /// failed extraction never leaves a truncated file at `dest`.
    pub fn extract_to(&mut self, entry: &str, dest: &Path) -> Result<u64, TransferError> {
        let mut file = self.zip.by_name(entry)?;
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file_name = dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = dest.with_file_name(format!("{file_name}.part"));
        let size = {
            let mut out = File::create(&tmp)?;
            std::io::copy(&mut file, &mut out)?
        };
        std::fs::rename(&tmp, dest)?;
        log::trace!("Extracted {} to {:?} ({} bytes)", entry, dest, size);
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{ArchiveWriter, PreferenceMap};

    fn write_sample(path: &Path) {
        let mut writer = ArchiveWriter::create(path).unwrap();
        writer
            .add_json("prefs.json", &serde_json::json!({"browser.newtabpage.rows": 4}))
            .unwrap();
        writer.add_directory("thumbnails/").unwrap();
        let dir = path.parent().unwrap();
        std::fs::write(dir.join("b.png"), b"bbb").unwrap();
        std::fs::write(dir.join("a.png"), b"aa").unwrap();
        writer
            .add_file("thumbnails/b.png", &dir.join("b.png"))
            .unwrap();
        writer
            .add_file("thumbnails/a.png", &dir.join("a.png"))
            .unwrap();
        writer.finish().unwrap();
    }

    #[test]
    fn test_reads_json_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.zip");
        write_sample(&path);

        let mut reader = ArchiveReader::open(&path).unwrap();
        let prefs: PreferenceMap = reader.read_json_or_default("prefs.json").unwrap();
        assert_eq!(prefs["browser.newtabpage.rows"], 4);
        let annos: PreferenceMap = reader.read_json_or_default("annos.json").unwrap();
        assert!(annos.is_empty());
    }

    #[test]
    fn test_lists_thumbnail_entries_without_marker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.zip");
        write_sample(&path);

        let reader = ArchiveReader::open(&path).unwrap();
        assert_eq!(
            reader.entries_under("thumbnails/"),
            vec!["thumbnails/a.png".to_string(), "thumbnails/b.png".to_string()]
        );
        assert!(reader.has_entry("thumbnails/"));
        assert!(!reader.has_entry("newtab-background"));
    }

    #[test]
    fn test_extract_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.zip");
        write_sample(&path);
        let dest = dir.path().join("restored").join("b.png");
        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();
        std::fs::write(&dest, b"old contents").unwrap();

        let mut reader = ArchiveReader::open(&path).unwrap();
        assert_eq!(reader.extract_to("thumbnails/b.png", &dest).unwrap(), 3);
        assert_eq!(std::fs::read(&dest).unwrap(), b"bbb");
        assert!(!dest.with_file_name("b.png.part").exists());
    }

    #[test]
    fn test_open_rejects_non_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.zip");
        std::fs::write(&path, b"definitely not a zip").unwrap();
        assert!(matches!(
            ArchiveReader::open(&path),
            Err(TransferError::Zip(_))
        ));
        assert!(matches!(
            ArchiveReader::open(&dir.path().join("missing.zip")),
            Err(TransferError::Io(_))
        ));
    }

    #[test]
    fn test_declared_size_is_not_trusted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lying.zip");
        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        zip.start_file(
            "prefs.json",
            zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored),
        )
        .unwrap();
        std::io::Write::write_all(&mut zip, b"{}").unwrap();
        zip.finish().unwrap();

        // Claim ~2 GiB of uncompressed data in the central directory.
        let mut bytes = std::fs::read(&path).unwrap();
        let central = bytes
            .windows(4)
            .position(|w| w == b"PK\x01\x02")
            .unwrap();
        bytes[central + 24..central + 28].copy_from_slice(&0x7FFF_FFF0u32.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let mut reader = ArchiveReader::open(&path).unwrap();
        let result: Result<PreferenceMap, _> = reader.read_json_or_default("prefs.json");
        match result {
            Ok(prefs) => assert!(prefs.is_empty()),
            Err(e) => assert!(matches!(e, TransferError::Zip(_) | TransferError::Io(_))),
        }
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.zip");
        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        zip.start_file("prefs.json", zip::write::SimpleFileOptions::default())
            .unwrap();
        std::io::Write::write_all(&mut zip, b"{not json").unwrap();
        zip.finish().unwrap();

        let mut reader = ArchiveReader::open(&path).unwrap();
        let result: Result<PreferenceMap, _> = reader.read_json_or_default("prefs.json");
        assert!(matches!(result, Err(TransferError::Json { .. })));
    }
}
