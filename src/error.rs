//! Error types for settings transfer operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by host collaborators (preference store, annotation store, profile files).
#[derive(Error, Debug)]
pub enum HostError {
    /// Preference or annotation does not exist
    #[error("No such key: {key}")]
    NoSuchKey {
        /// The missing key
        key: String,
    },

    /// Stored value has a different type than the one requested
    #[error("Type mismatch for '{key}': expected {expected}, found {found}")]
    TypeMismatch {
        /// Key being accessed
        key: String,
        /// Type the caller asked for
        expected: &'static str,
        /// Type actually stored
        found: &'static str,
    },

    /// Page identifier could not be parsed as a URL
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        /// The rejected text
        url: String,
        /// Parser error
        source: url::ParseError,
    },

    /// Profile file could not be parsed
    #[error("Malformed {what}: {message}")]
    Malformed {
        /// What was being parsed (e.g. "prefs.js line 4")
        what: String,
        /// Description of the problem
        message: String,
    },

    /// I/O error on a profile file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Places database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl HostError {
    /// Create a missing key error.
    pub fn no_such_key(key: impl Into<String>) -> Self {
        Self::NoSuchKey { key: key.into() }
    }

    /// Create a malformed data error.
    pub fn malformed(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            what: what.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur while exporting or importing a settings archive.
#[derive(Error, Debug)]
pub enum TransferError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Zip container could not be read or written
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON parsing or serialization error
    #[error("JSON error in {entry}: {source}")]
    Json {
        /// Archive entry being processed
        entry: String,
        /// Underlying serde error
        source: serde_json::Error,
    },

    /// A host collaborator failed
    #[error("{item}: {source}")]
    Host {
        /// Item being transferred (preference key, page URL, ...)
        item: String,
        /// Host failure
        source: HostError,
    },

    /// Page identifier in the archive is not a valid URL
    #[error("Invalid page '{page}' for annotation '{name}': {source}")]
    InvalidUrl {
        /// Annotation name
        name: String,
        /// The rejected page text
        page: String,
        /// Parser error
        source: url::ParseError,
    },

    /// Value in the archive has a type this field does not accept
    #[error("Unsupported value for '{item}': {value}")]
    UnsupportedValue {
        /// Item carrying the value
        item: String,
        /// JSON rendering of the rejected value
        value: String,
    },

    /// Thumbnail entry name does not map to a plain file name
    #[error("Refusing to extract entry '{entry}': not a plain file name")]
    UnsafeEntryName {
        /// Full archive entry name
        entry: String,
    },

    /// Background image required but absent from the profile
    #[error("Background image not found: {path:?}")]
    MissingBackground {
        /// Path where the image was expected
        path: PathBuf,
    },

    /// Pipeline attempted a transition its state machine forbids
    #[error("Illegal pipeline transition from {from} to {to}")]
    IllegalTransition {
        /// Current state
        from: &'static str,
        /// Requested state
        to: &'static str,
    },
}

impl TransferError {
    /// Wrap a JSON error with the entry it came from.
    pub fn json(entry: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            entry: entry.into(),
            source,
        }
    }

    /// Wrap a host error with the item it concerned.
    pub fn host(item: impl Into<String>, source: HostError) -> Self {
        Self::Host {
            item: item.into(),
            source,
        }
    }

    /// Create an unsupported value error.
    pub fn unsupported_value(item: impl Into<String>, value: &serde_json::Value) -> Self {
        Self::UnsupportedValue {
            item: item.into(),
            value: value.to_string(),
        }
    }
}
