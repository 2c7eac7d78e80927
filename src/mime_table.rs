//! Extension to MIME type resolution.
//!
//! A [`MimeTable`] layers entries read from `mime.types`-style files over the
//! built-in table shipped with `mime_guess`. The file format is the classic
//! one: a MIME type followed by one or more extensions, whitespace separated,
//! with `#` comments.
//!
//! ```text
//! # Mime types generated from ...
//! image/x-canon-cr3		cr3
//! image/jpeg jpg jpeg jpe
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// File name searched for in the working directory and next to the executable.
pub const LOCAL_TABLE_NAME: &str = "mime.types";

/// Host tables read before any override file, in order. Missing files are skipped.
pub const SYSTEM_TABLES: &[&str] = &[
    "/etc/mime.types",
    "/etc/httpd/mime.types",
    "/etc/httpd/conf/mime.types",
    "/etc/apache/mime.types",
    "/etc/apache2/mime.types",
    "/usr/local/etc/httpd/conf/mime.types",
    "/usr/local/etc/mime.types",
];

/// Lookup table from lower-case extension to MIME type.
#[derive(Debug, Clone, Default)]
pub struct MimeTable {
    entries: HashMap<String, String>,
    builtin: bool,
}

/// Where a table's entries should come from.
#[derive(Debug, Clone)]
pub struct MimeTableOptions {
    /// Explicit override file; it is an error if it cannot be read.
    pub override_file: Option<PathBuf>,
    /// Read [`SYSTEM_TABLES`].
    pub system_tables: bool,
    /// Fall back to the `mime_guess` table.
    pub builtin_table: bool,
}

impl Default for MimeTableOptions {
    fn default() -> Self {
        Self {
            override_file: None,
            system_tables: true,
            builtin_table: true,
        }
    }
}

impl MimeTable {
    /// A table with no entries and no built-in fallback.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A table backed only by the built-in `mime_guess` data.
    pub fn builtin() -> Self {
        Self {
            entries: HashMap::new(),
            builtin: true,
        }
    }

    /// Builds a table from system tables and the first override file found.
    pub fn load(options: &MimeTableOptions) -> Result<Self> {
        let mut table = if options.builtin_table {
            Self::builtin()
        } else {
            Self::empty()
        };

        if options.system_tables {
            for path in SYSTEM_TABLES.iter().map(Path::new) {
                if path.is_file() {
                    match table.load_file(path) {
                        Ok(count) => debug!(path = %path.display(), entries = count, "loaded system MIME table"),
                        Err(e) => debug!(error = %e, "skipping unreadable system MIME table"),
                    }
                }
            }
        }

        if let Some(path) = options.override_file.as_deref() {
            let count = table.load_file(path)?;
            debug!(path = %path.display(), entries = count, "using MIME table override");
        } else if let Some(path) = find_local_table() {
            let count = table.load_file(&path)?;
            debug!(path = %path.display(), entries = count, "using MIME table override");
        }

        Ok(table)
    }

    /// Reads a `mime.types` file into the table and returns the entries added.
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let content = fs::read_to_string(path).map_err(|source| Error::MimeTable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.parse(&content))
    }

    /// Parses table text. Later entries replace earlier ones for the same extension.
    pub fn parse(&mut self, content: &str) -> usize {
        let mut count = 0;
        for line in content.lines() {
            let line = line.split('#').next().unwrap_or_default();
            let mut columns = line.split_whitespace();
            let Some(mime) = columns.next() else {
                continue;
            };
            if !mime.contains('/') {
                continue;
            }
            for ext in columns {
                self.insert(ext, mime);
                count += 1;
            }
        }
        count
    }

    /// Adds a single mapping. `*.ext`, `.ext` and `ext` are all accepted.
    pub fn insert(&mut self, ext: &str, mime: &str) {
        let ext = ext.trim_start_matches('*').trim_start_matches('.').to_lowercase();
        if !ext.is_empty() {
            self.entries.insert(ext, mime.to_lowercase());
        }
    }

    /// Resolves a lower-case extension without the leading dot.
    pub fn lookup(&self, ext: &str) -> Option<String> {
        if let Some(mime) = self.entries.get(ext) {
            return Some(mime.clone());
        }
        if self.builtin {
            return mime_guess::from_ext(ext).first_raw().map(str::to_string);
        }
        None
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `mime.types` in the working directory, then next to the executable.
fn find_local_table() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_TABLE_NAME);
    if local.is_file() {
        return Some(local);
    }
    let beside_exe = std::env::current_exe()
        .ok()?
        .parent()?
        .join(LOCAL_TABLE_NAME);
    beside_exe.is_file().then_some(beside_exe)
}
