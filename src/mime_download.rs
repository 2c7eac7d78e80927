//! Generates a local `mime.types` from ImageMagick's MIME registry.
//!
//! ImageMagick knows many camera RAW and niche image formats that the usual
//! system tables do not. Its `mime.xml` lists them as
//! `<mime type="image/x-canon-cr2" pattern="*.cr2" ... />` elements.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{self, Write as _};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{Error, Result};

pub const IMAGEMAGICK_MIME_XML_URL: &str =
    "https://raw.githubusercontent.com/ImageMagick/ImageMagick/main/config/mime.xml";

static XML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static regex"));
static MIME_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<mime\s([^>]*)>").expect("static regex"));
static ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([\w:-]+)\s*=\s*"([^"]*)""#).expect("static regex"));

/// Extracts `(mime type, extension)` pairs from `mime.xml` content.
///
/// Only simple patterns survive: `*.ext` becomes `ext`, a bare name is kept
/// as is, anything with other glob characters is dropped. Commented-out
/// elements are ignored.
pub fn convert_mime_xml(xml: &str) -> Vec<(String, String)> {
    let xml = XML_COMMENT.replace_all(xml, "");
    let mut entries = Vec::new();
    for element in MIME_ELEMENT.captures_iter(&xml) {
        let mut mime_type = None;
        let mut pattern = None;
        for attribute in ATTRIBUTE.captures_iter(&element[1]) {
            match &attribute[1] {
                "type" => mime_type = Some(attribute[2].to_string()),
                "pattern" => pattern = Some(attribute[2].to_string()),
                _ => {}
            }
        }
        let (Some(mime_type), Some(pattern)) = (mime_type, pattern) else {
            continue;
        };
        let ext = if let Some(stripped) = pattern.strip_prefix("*.") {
            stripped.to_string()
        } else {
            pattern
        };
        if ext.contains('[') || ext.contains('*') {
            debug!(pattern = %ext, mime_type = %mime_type, "ignoring complex pattern");
            continue;
        }
        entries.push((mime_type, ext));
    }
    entries
}

/// Renders entries in `mime.types` format with a provenance header.
pub fn render_mime_types(entries: &[(String, String)], url: &str) -> String {
    let mut out = format!("# Mime types generated from {url}\n\n");
    for (mime_type, ext) in entries {
        let _ = writeln!(out, "{mime_type}\t\t{ext}");
    }
    out
}

/// Downloads `url`, converts it and writes `dest`. Refuses to overwrite.
///
/// Returns the number of entries written.
pub fn download_mime_types(url: &str, dest: &Path) -> Result<usize> {
    if dest.exists() {
        return Err(Error::WouldClobber {
            path: dest.to_path_buf(),
        });
    }

    debug!(url, "downloading reference mime types");
    let body = reqwest::blocking::get(url)
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(|e| Error::MimeDownload(e.to_string()))?;

    let entries = convert_mime_xml(&body);
    write_new(dest, &render_mime_types(&entries, url))?;
    info!(path = %dest.display(), entries = entries.len(), "generated MIME table");
    Ok(entries.len())
}

/// Writes `contents` to `dest`, failing if the file already exists.
fn write_new(dest: &Path, contents: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .map_err(|source| match source.kind() {
            io::ErrorKind::AlreadyExists => Error::WouldClobber {
                path: dest.to_path_buf(),
            },
            _ => Error::Write {
                path: dest.to_path_buf(),
                source,
            },
        })?;
    file.write_all(contents.as_bytes())
        .map_err(|source| Error::Write {
            path: dest.to_path_buf(),
            source,
        })
}
