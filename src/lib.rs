//! mediasort - relocate files into per-type destination trees
//!
//! This library walks a source directory, classifies every file by the
//! top-level part of its MIME type, and moves or copies the files whose type
//! has a configured destination, preserving their path relative to the
//! source root. Relocation runs in fixed-size concurrent batches.

pub mod cli;
pub mod config;
pub mod destinations;
pub mod error;
pub mod fs_ops;
pub mod logging;
pub mod media_type;
pub mod metrics;
pub mod mime_download;
pub mod mime_table;
pub mod output;
pub mod relocator;
pub mod scanner;

pub use cli::{Cli, RunReport, run_cli};
pub use config::{CompiledFilters, Config, ConfigError};
pub use destinations::DestinationMap;
pub use error::{Error, Result};
pub use media_type::{MediaType, TypeClassifier};
pub use metrics::RunMetrics;
pub use mime_table::MimeTable;
pub use relocator::{RelocationMode, Relocator};
pub use scanner::{FileTask, TreeScanner};
