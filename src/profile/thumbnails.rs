//! Page thumbnail cache on disk.

use std::path::{Path, PathBuf};

use md5::{Digest, Md5};

use crate::host::ThumbnailCache;

/// Thumbnail directory where each page's image is named by the MD5 of its URL.
#[derive(Debug, Clone)]
pub struct ThumbnailStorage {
    dir: PathBuf,
}

impl ThumbnailStorage {
    /// Use `dir` as the cache directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Leaf file name for `url`.
    pub fn leaf_name(url: &str) -> String {
        format!("{:x}.png", Md5::digest(url.as_bytes()))
    }
}

impl ThumbnailCache for ThumbnailStorage {
    fn path_for_url(&self, url: &str) -> PathBuf {
        self.dir.join(Self::leaf_name(url))
    }

    fn directory(&self) -> &Path {
        &self.dir
    }
}
