//! New Tab Tools settings archives.
//!
//! Exports the customisations of the New Tab Tools page (per-page titles,
//! grid and launcher preferences, cached thumbnails, the background image)
//! into a single zip archive, and applies such an archive to a profile.
//!
//! The transfer stages in [`transfer`] work against the host traits in
//! [`host`]; [`profile`] implements them on top of a browser profile
//! directory and [`pipeline`] wraps them in the interactive
//! choose-options, pick-file, confirm flow.

pub mod archive;
pub mod config;
pub mod constants;
pub mod error;
pub mod host;
pub mod pipeline;
pub mod profile;
pub mod transfer;

#[cfg(test)]
mod test_host;

pub use archive::Manifest;
pub use config::{ConfigError, ToolConfig, TransferSettings};
pub use error::{HostError, TransferError};
pub use host::{ErrorSink, ExportSources, ImportTargets, LogErrorSink};
pub use pipeline::{Pipeline, PipelineResult};
pub use profile::Profile;
pub use transfer::{ExportReport, ImportReport, TransferOptions};
