//! Source tree walk producing relocation tasks.
//!
//! [`TreeScanner`] is a plain iterator over a `walkdir` walk: tasks are
//! produced one at a time as the relocator pulls them, and the walk cannot be
//! restarted. The walk does not follow directory symlinks, and destination
//! roots nested inside the source root are not descended into.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::CompiledFilters;
use crate::destinations::DestinationMap;
use crate::error::{Error, Result};
use crate::media_type::{MediaType, TypeClassifier};

/// One planned relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub kind: MediaType,
}

/// Lazy walk of a source root, yielding a [`FileTask`] per wanted file.
pub struct TreeScanner<'a> {
    root: PathBuf,
    walker: walkdir::IntoIter,
    destinations: &'a DestinationMap,
    classifier: &'a TypeClassifier,
    filters: Option<&'a CompiledFilters>,
}

impl<'a> TreeScanner<'a> {
    /// Starts a scan of `root`, which is canonicalised first.
    ///
    /// Fails if the root cannot be listed, so an unreadable source aborts the
    /// run instead of looking like an empty tree.
    pub fn new(
        root: &Path,
        destinations: &'a DestinationMap,
        classifier: &'a TypeClassifier,
    ) -> Result<Self> {
        let root = root.canonicalize().map_err(|_| Error::InvalidDirectory {
            role: "Source directory".to_string(),
            path: root.to_path_buf(),
        })?;
        fs::read_dir(&root).map_err(|source| Error::UnreadableSource {
            path: root.clone(),
            source,
        })?;
        let walker = WalkDir::new(&root).sort_by_file_name().into_iter();
        Ok(Self {
            root,
            walker,
            destinations,
            classifier,
            filters: None,
        })
    }

    /// Applies scan filters to paths relative to the root.
    pub fn with_filters(mut self, filters: &'a CompiledFilters) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `dir` is, or lies under, a destination root nested in the source root.
    fn is_destination(&self, dir: &Path) -> bool {
        self.destinations
            .iter()
            .any(|(_, dest)| dest.starts_with(&self.root) && dir.starts_with(dest))
    }

    /// Turns one walked file into a task, or `None` if it is not wanted.
    ///
    /// Walked paths hang off the canonical root and directory symlinks are not
    /// followed, so stripping the root yields the canonical relative path.
    fn plan(&self, path: &Path) -> Option<FileTask> {
        let relative = match path.strip_prefix(&self.root) {
            Ok(relative) => relative,
            Err(_) => {
                warn!(path = %path.display(), root = %self.root.display(), "file outside source root");
                return None;
            }
        };

        if let Some(filters) = self.filters
            && !filters.should_include(relative)
        {
            debug!(path = %path.display(), "excluded by filters");
            return None;
        }

        let kind = self.classifier.classify(path);
        let Some(dest_root) = self.destinations.get(kind) else {
            debug!(path = %path.display(), %kind, "skipping file with unknown or unwanted type");
            return None;
        };

        Some(FileTask {
            source: path.to_path_buf(),
            destination: dest_root.join(relative),
            kind,
        })
    }
}

impl Iterator for TreeScanner<'_> {
    type Item = FileTask;

    fn next(&mut self) -> Option<FileTask> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "cannot read directory entry");
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_dir() && entry.depth() > 0 && self.is_destination(entry.path()) {
                debug!(path = %entry.path().display(), "not descending into destination");
                self.walker.skip_current_dir();
                continue;
            }

            let is_file =
                file_type.is_file() || (file_type.is_symlink() && entry.path().is_file());
            if !is_file {
                continue;
            }

            if let Some(task) = self.plan(entry.path()) {
                return Some(task);
            }
        }
    }
}
