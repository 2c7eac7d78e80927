//! Destination rules: which directory each media type is relocated under.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::media_type::MediaType;

/// Immutable mapping from media type to a canonical destination root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationMap {
    roots: BTreeMap<MediaType, PathBuf>,
}

impl DestinationMap {
    /// Parses `TYPE=DIR` specifiers, validating every directory.
    ///
    /// A type given twice keeps its last directory.
    pub fn parse<I, S>(specs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = Self::default();
        for spec in specs {
            let (kind, dir) = parse_spec(spec.as_ref())?;
            let root = resolve_dir(dir, &format!("Destination dir for {kind}"))?;
            map.insert(kind, root)?;
        }
        Ok(map)
    }

    /// Adds a rule. `root` is used as given; [`DestinationMap::parse`] canonicalises.
    pub fn insert(&mut self, kind: MediaType, root: PathBuf) -> Result<()> {
        if !kind.is_classified() {
            return Err(Error::UnclassifiedDestination);
        }
        if let Some(previous) = self.roots.insert(kind, root) {
            debug!(%kind, previous = %previous.display(), "destination replaced");
        }
        Ok(())
    }

    pub fn get(&self, kind: MediaType) -> Option<&Path> {
        self.roots.get(&kind).map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MediaType, &Path)> {
        self.roots.iter().map(|(kind, root)| (*kind, root.as_path()))
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl fmt::Display for DestinationMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules: Vec<String> = self
            .iter()
            .map(|(kind, root)| format!("{kind}={}", root.display()))
            .collect();
        write!(f, "{{{}}}", rules.join(", "))
    }
}

fn parse_spec(spec: &str) -> Result<(MediaType, &str)> {
    let Some((name, dir)) = spec.split_once('=') else {
        return Err(Error::InvalidDestinationSpec(spec.to_string()));
    };
    let (name, dir) = (name.trim(), dir.trim());
    if name.is_empty() {
        return Err(Error::InvalidDestinationSpec(spec.to_string()));
    }
    let kind: MediaType = name.parse()?;
    if !kind.is_classified() {
        return Err(Error::UnclassifiedDestination);
    }
    Ok((kind, dir))
}

/// Expands `~`, canonicalises and checks that `path` is an existing directory.
///
/// `role` names the argument in error messages, e.g. "Source directory".
pub fn resolve_dir(path: &str, role: &str) -> Result<PathBuf> {
    if path.is_empty() {
        return Err(Error::MissingDirectory {
            role: role.to_string(),
        });
    }

    let expanded = expand_home(path);
    let invalid = || Error::InvalidDirectory {
        role: role.to_string(),
        path: expanded.clone(),
    };
    let resolved = expanded.canonicalize().map_err(|_| invalid())?;
    if !resolved.is_dir() {
        return Err(Error::InvalidDirectory {
            role: role.to_string(),
            path: resolved,
        });
    }
    Ok(resolved)
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~')
        && (rest.is_empty() || rest.starts_with('/'))
        && let Ok(home) = std::env::var("HOME")
    {
        return PathBuf::from(home).join(rest.trim_start_matches('/'));
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_valid_specs() {
        let temp_dir = TempDir::new().unwrap();
        let images = temp_dir.path().join("images");
        let videos = temp_dir.path().join("videos");
        fs::create_dir(&images).unwrap();
        fs::create_dir(&videos).unwrap();

        let map = DestinationMap::parse([
            format!("Image={}", images.display()),
            format!(" video = {} ", videos.display()),
        ])
        .unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get(MediaType::Image), Some(images.canonicalize().unwrap().as_path()));
        assert_eq!(map.get(MediaType::Video), Some(videos.canonicalize().unwrap().as_path()));
        assert_eq!(map.get(MediaType::Audio), None);
    }

    #[test]
    fn test_last_duplicate_wins() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("first");
        let second = temp_dir.path().join("second");
        fs::create_dir(&first).unwrap();
        fs::create_dir(&second).unwrap();

        let map = DestinationMap::parse([
            format!("image={}", first.display()),
            format!("IMAGE={}", second.display()),
        ])
        .unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(MediaType::Image), Some(second.canonicalize().unwrap().as_path()));
    }

    #[test]
    fn test_missing_separator() {
        let result = DestinationMap::parse(["image:/tmp"]);
        assert!(matches!(result, Err(Error::InvalidDestinationSpec(_))));
    }

    #[test]
    fn test_empty_type_or_dir() {
        assert!(matches!(
            DestinationMap::parse(["=/tmp"]),
            Err(Error::InvalidDestinationSpec(_))
        ));
        assert!(matches!(
            DestinationMap::parse(["image="]),
            Err(Error::MissingDirectory { .. })
        ));
    }

    #[test]
    fn test_unknown_and_unclassified_types() {
        assert!(matches!(
            DestinationMap::parse(["pictures=/tmp"]),
            Err(Error::UnknownMediaType(_))
        ));
        assert!(matches!(
            DestinationMap::parse(["unclassified=/tmp"]),
            Err(Error::UnclassifiedDestination)
        ));
    }

    #[test]
    fn test_destination_must_be_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not_a_dir");
        fs::write(&file, "x").unwrap();

        assert!(matches!(
            DestinationMap::parse([format!("image={}", file.display())]),
            Err(Error::InvalidDirectory { .. })
        ));
        assert!(matches!(
            DestinationMap::parse(["image=/non/existent/dir"]),
            Err(Error::InvalidDirectory { .. })
        ));
    }

    #[test]
    fn test_display_lists_rules() {
        let mut map = DestinationMap::default();
        map.insert(MediaType::Video, PathBuf::from("/out/videos")).unwrap();
        map.insert(MediaType::Image, PathBuf::from("/out/images")).unwrap();
        assert_eq!(map.to_string(), "{image=/out/images, video=/out/videos}");
    }
}
