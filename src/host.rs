//! Interfaces to the host browser.
//!
//! The transfer stages never reach for global services. Everything they read
//! from or write to is passed in through these traits, so the archive logic
//! runs the same against a real profile or an in-memory fake.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{HostError, TransferError};

/// Stored type of a preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefType {
    /// Text preference
    String,
    /// 32-bit integer preference
    Int,
    /// Boolean preference
    Bool,
    /// No value stored under this key
    Invalid,
}

impl PrefType {
    /// Short lowercase name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            PrefType::String => "string",
            PrefType::Int => "int",
            PrefType::Bool => "bool",
            PrefType::Invalid => "none",
        }
    }
}

/// A scalar preference value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i32),
    /// Text value
    String(String),
}

impl PrefValue {
    /// The type this value is stored as.
    pub fn pref_type(&self) -> PrefType {
        match self {
            PrefValue::Bool(_) => PrefType::Bool,
            PrefValue::Int(_) => PrefType::Int,
            PrefValue::String(_) => PrefType::String,
        }
    }
}

/// A page annotation value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnnotationValue {
    /// Integer value
    Int(i64),
    /// Floating point value
    Double(f64),
    /// Text value
    String(String),
}

impl AnnotationValue {
    /// Convert an archived JSON value, rejecting anything that is not a scalar.
    pub fn from_json(item: &str, value: &serde_json::Value) -> Result<Self, TransferError> {
        match value {
            serde_json::Value::String(s) => Ok(AnnotationValue::String(s.clone())),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(AnnotationValue::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(AnnotationValue::Double(f))
                } else {
                    Err(TransferError::unsupported_value(item, value))
                }
            }
            _ => Err(TransferError::unsupported_value(item, value)),
        }
    }
}

impl From<&str> for AnnotationValue {
    fn from(s: &str) -> Self {
        AnnotationValue::String(s.to_string())
    }
}

/// Lifetime policy attached to an annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// Dropped when the browser session ends
    Session,
    /// Kept until explicitly removed
    Never,
    /// Removed together with the page's history
    WithHistory,
}

/// A link shown on the new tab page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Page URL
    pub url: String,
    /// Display title, if known
    #[serde(default)]
    pub title: Option<String>,
}

impl Link {
    /// Create a link without a title.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
        }
    }
}

/// Typed access to the browser's preference store.
pub trait PreferenceStore {
    /// Stored type of `key`, or [`PrefType::Invalid`] when unset.
    fn pref_type(&self, key: &str) -> PrefType;

    /// Read a text preference.
    fn get_string(&self, key: &str) -> Result<String, HostError>;

    /// Read an integer preference.
    fn get_int(&self, key: &str) -> Result<i32, HostError>;

    /// Read a boolean preference.
    fn get_bool(&self, key: &str) -> Result<bool, HostError>;

    /// Write a text preference.
    fn set_string(&mut self, key: &str, value: &str) -> Result<(), HostError>;

    /// Write an integer preference.
    fn set_int(&mut self, key: &str, value: i32) -> Result<(), HostError>;

    /// Write a boolean preference.
    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), HostError>;

    /// Read whatever is stored under `key`, dispatching on its type.
    ///
    /// Returns `Ok(None)` when nothing is stored.
    fn get_value(&self, key: &str) -> Result<Option<PrefValue>, HostError> {
        let value = match self.pref_type(key) {
            PrefType::String => PrefValue::String(self.get_string(key)?),
            PrefType::Int => PrefValue::Int(self.get_int(key)?),
            PrefType::Bool => PrefValue::Bool(self.get_bool(key)?),
            PrefType::Invalid => return Ok(None),
        };
        Ok(Some(value))
    }

    /// Write `value` with the setter matching its type.
    fn set_value(&mut self, key: &str, value: &PrefValue) -> Result<(), HostError> {
        match value {
            PrefValue::String(s) => self.set_string(key, s),
            PrefValue::Int(i) => self.set_int(key, *i),
            PrefValue::Bool(b) => self.set_bool(key, *b),
        }
    }
}

/// Per-page annotations kept by the browser.
pub trait AnnotationStore {
    /// Every page carrying an annotation called `name`.
    fn pages_with_annotation(&self, name: &str) -> Result<Vec<Url>, HostError>;

    /// The value of annotation `name` on `page`.
    fn page_annotation(&self, page: &Url, name: &str) -> Result<AnnotationValue, HostError>;

    /// Every page carrying `name` with its value, keyed by the page text as stored.
    fn annotations_named(&self, name: &str) -> Result<Vec<(String, AnnotationValue)>, HostError> {
        self.pages_with_annotation(name)?
            .into_iter()
            .map(|page| {
                let value = self.page_annotation(&page, name)?;
                Ok((page.to_string(), value))
            })
            .collect()
    }

    /// Create or overwrite annotation `name` on `page`.
    fn set_page_annotation(
        &mut self,
        page: &Url,
        name: &str,
        value: &AnnotationValue,
        expiration: Expiration,
    ) -> Result<(), HostError>;
}

/// On-disk cache of page thumbnails.
pub trait ThumbnailCache {
    /// File the thumbnail for `url` is (or would be) stored in.
    fn path_for_url(&self, url: &str) -> PathBuf;

    /// Directory holding all thumbnail files.
    fn directory(&self) -> &Path;
}

/// Ranked list of links currently relevant to the new tab page.
pub trait LinkSource {
    /// Links in display order.
    fn links(&self) -> Result<Vec<Link>, HostError>;

    /// Number of cells in the currently displayed grid.
    fn grid_cell_count(&self) -> usize;
}

/// Receives failures that must not halt the caller.
pub trait ErrorSink {
    /// Record one failure.
    fn report(&self, error: &TransferError);
}

/// Error sink that writes to the log at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn report(&self, error: &TransferError) {
        log::error!("{}", error);
    }
}

/// Host state read by an export.
pub struct ExportSources<'a> {
    /// Preference store
    pub prefs: &'a dyn PreferenceStore,
    /// Annotation store
    pub annotations: &'a dyn AnnotationStore,
    /// Thumbnail cache
    pub thumbnails: &'a dyn ThumbnailCache,
    /// Ranked links and grid size
    pub links: &'a dyn LinkSource,
    /// Profile directory holding the background image
    pub profile_dir: &'a Path,
}

/// Host state written by an import.
pub struct ImportTargets<'a> {
    /// Preference store
    pub prefs: &'a mut dyn PreferenceStore,
    /// Annotation store
    pub annotations: &'a mut dyn AnnotationStore,
    /// Thumbnail cache
    pub thumbnails: &'a dyn ThumbnailCache,
    /// Profile directory receiving the background image
    pub profile_dir: &'a Path,
}
