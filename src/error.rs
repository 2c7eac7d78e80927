//! Error types for setup-time failures and process exit codes.
//!
//! Per-file relocation failures live in [`crate::relocator::RelocationError`]
//! and never surface here: they are counted and logged, not propagated.

use std::path::PathBuf;

use crate::config::ConfigError;

/// Normal completion, including runs where individual files failed.
pub const EXIT_SUCCESS: u8 = 0;
/// Configuration or setup failure before any file was touched.
pub const EXIT_FATAL: u8 = 1;
/// The run was stopped by an interrupt signal.
pub const EXIT_INTERRUPTED: u8 = 130;

/// Fatal errors that abort a run before (or instead of) relocation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A `TYPE=DIR` argument could not be parsed.
    #[error("Invalid destination specifier: {0}")]
    InvalidDestinationSpec(String),

    /// The type name is not a known top-level MIME type.
    #[error("Unknown media type '{0}'")]
    UnknownMediaType(String),

    /// `unclassified` was given as a destination key.
    #[error("Files without a type cannot be given a destination")]
    UnclassifiedDestination,

    #[error("{role} is required")]
    MissingDirectory { role: String },

    #[error("Invalid {role}: {}", path.display())]
    InvalidDirectory { role: String, path: PathBuf },

    /// The source root exists but its entries cannot be listed.
    #[error("Cannot read source directory {}: {source}", path.display())]
    UnreadableSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not read MIME table {}: {source}", path.display())]
    MimeTable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not overwriting existing '{}' file", path.display())]
    WouldClobber { path: PathBuf },

    #[error("Could not download mime type data: {0}")]
    MimeDownload(String),

    #[error("Could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The async runtime could not be started.
    #[error("Failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
