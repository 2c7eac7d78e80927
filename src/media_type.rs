//! Coarse file typing by MIME top-level type.
//!
//! A file's type is the part of its MIME type before the `/`, looked up by
//! extension in a [`MimeTable`]. Sidecar formats that have no registered MIME
//! type (e.g. Adobe `.xmp` or DxO `.dop` correction files) are covered by a
//! small extension override table.
//!
//! # Examples
//!
//! ```
//! use mediasort::media_type::{MediaType, TypeClassifier};
//! use mediasort::mime_table::MimeTable;
//! use std::path::Path;
//!
//! let classifier = TypeClassifier::new(MimeTable::builtin());
//! assert_eq!(classifier.classify(Path::new("a/b/1.jpg")), MediaType::Image);
//! assert_eq!(classifier.classify(Path::new("a/b/v1.MP4")), MediaType::Video);
//! assert_eq!(classifier.classify(Path::new("README")), MediaType::Unclassified);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::error::Error;
use crate::mime_table::MimeTable;

/// Extensions that the standard tables miss, mapped to their type.
pub const EXTRA_EXTENSION_TYPES: &[(&str, MediaType)] = &[
    // adobe correction files
    ("xmp", MediaType::Image),
    // dxo correction files
    ("dop", MediaType::Image),
];

/// A top-level MIME type, or `Unclassified` when none could be determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Application,
    Audio,
    Font,
    Image,
    Message,
    Model,
    Multipart,
    Text,
    Video,
    /// No MIME type or override matched, or the top-level type is not registered.
    Unclassified,
}

impl MediaType {
    /// Every classifiable type, in name order.
    pub const KNOWN: [MediaType; 9] = [
        MediaType::Application,
        MediaType::Audio,
        MediaType::Font,
        MediaType::Image,
        MediaType::Message,
        MediaType::Model,
        MediaType::Multipart,
        MediaType::Text,
        MediaType::Video,
    ];

    /// Returns the lower-case type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Application => "application",
            MediaType::Audio => "audio",
            MediaType::Font => "font",
            MediaType::Image => "image",
            MediaType::Message => "message",
            MediaType::Model => "model",
            MediaType::Multipart => "multipart",
            MediaType::Text => "text",
            MediaType::Video => "video",
            MediaType::Unclassified => "unclassified",
        }
    }

    /// Takes the top-level part of a MIME type string.
    ///
    /// ```
    /// use mediasort::media_type::MediaType;
    ///
    /// assert_eq!(MediaType::from_mime("image/jpeg"), MediaType::Image);
    /// assert_eq!(MediaType::from_mime("VIDEO/mp4"), MediaType::Video);
    /// assert_eq!(MediaType::from_mime("chemical/x-pdb"), MediaType::Unclassified);
    /// ```
    pub fn from_mime(mime: &str) -> MediaType {
        let top = mime.split('/').next().unwrap_or_default().trim();
        Self::from_name(top).unwrap_or(MediaType::Unclassified)
    }

    fn from_name(name: &str) -> Option<MediaType> {
        let name = name.to_lowercase();
        Self::KNOWN.into_iter().find(|kind| kind.as_str() == name)
    }

    pub fn is_classified(&self) -> bool {
        *self != MediaType::Unclassified
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = Error;

    /// Parses a type name case-insensitively. `unclassified` is accepted here;
    /// callers that need a destination key reject it themselves.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case(MediaType::Unclassified.as_str()) {
            return Ok(MediaType::Unclassified);
        }
        Self::from_name(trimmed).ok_or_else(|| Error::UnknownMediaType(trimmed.to_string()))
    }
}

/// Resolves a file path to its [`MediaType`].
#[derive(Debug, Clone)]
pub struct TypeClassifier {
    table: MimeTable,
    extra_extensions: HashMap<String, MediaType>,
    sniff_content: bool,
}

impl TypeClassifier {
    /// Creates a classifier over `table` with the default extension overrides.
    pub fn new(table: MimeTable) -> Self {
        let extra_extensions = EXTRA_EXTENSION_TYPES
            .iter()
            .map(|(ext, kind)| (ext.to_string(), *kind))
            .collect();
        Self {
            table,
            extra_extensions,
            sniff_content: false,
        }
    }

    /// Adds (or replaces) an extension override. Leading dots are ignored.
    pub fn add_extension_override(&mut self, ext: &str, kind: MediaType) {
        let ext = ext.trim_start_matches('.').to_lowercase();
        self.extra_extensions.insert(ext, kind);
    }

    /// Falls back to reading magic bytes when no table knows the extension.
    pub fn with_content_sniffing(mut self, enabled: bool) -> Self {
        self.sniff_content = enabled;
        self
    }

    /// Classifies `path`.
    ///
    /// 1. MIME table lookup by extension; a hit decides the result
    /// 2. Extension override table
    /// 3. Content sniffing, if enabled
    /// 4. `Unclassified`
    pub fn classify(&self, path: &Path) -> MediaType {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());

        if let Some(ext) = ext.as_deref() {
            if let Some(mime) = self.table.lookup(ext) {
                return MediaType::from_mime(&mime);
            }
            if let Some(kind) = self.extra_extensions.get(ext) {
                return *kind;
            }
        }

        if self.sniff_content {
            match infer::get_from_path(path) {
                Ok(Some(kind)) => return MediaType::from_mime(kind.mime_type()),
                Ok(None) => {}
                Err(e) => debug!(path = %path.display(), error = %e, "content sniffing failed"),
            }
        }

        MediaType::Unclassified
    }
}
