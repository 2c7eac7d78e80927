//! Run configuration.
//!
//! Settings that rarely change between runs live in a TOML file; command-line
//! flags override them. Besides relocation and classification knobs the file
//! can carry scan filters that keep files out of the run entirely:
//! - Exact filename matching
//! - Glob pattern matching (against the path relative to the source root)
//! - File extension matching
//! - Regex pattern matching
//! - Include (whitelist) rules that override exclude rules
//!
//! # Configuration File Format
//!
//! ```toml
//! [relocate]
//! concurrency = 5
//!
//! [classify]
//! mime_types = "/home/me/mime.types"
//! system_tables = true
//! builtin_table = true
//! sniff_content = false
//!
//! [classify.extra_extensions]
//! xmp = "image"
//! thm = "video"
//!
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["@eaDir/**"]
//! extensions = ["tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::media_type::{MediaType, TypeClassifier};
use crate::mime_table::{MimeTable, MimeTableOptions};
use crate::relocator::DEFAULT_CONCURRENCY;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_NAME: &str = ".mediasortrc.toml";

/// Errors that can occur while loading or compiling configuration.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("Invalid media type '{name}' for extension '{ext}'")]
    InvalidExtensionType { ext: String, name: String },

    #[error("Concurrency must be at least 1")]
    InvalidConcurrency,

    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relocate: RelocateSettings,
    #[serde(default)]
    pub classify: ClassifySettings,
    #[serde(default)]
    pub filters: FilterRules,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelocateSettings {
    /// Number of files relocated concurrently per batch.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Default for RelocateSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifySettings {
    /// Override `mime.types` file.
    #[serde(default)]
    pub mime_types: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub system_tables: bool,

    #[serde(default = "default_true")]
    pub builtin_table: bool,

    /// Read magic bytes of files no table recognises.
    #[serde(default)]
    pub sniff_content: bool,

    /// Extension overrides, added to the built-in `xmp`/`dop` entries.
    #[serde(default)]
    pub extra_extensions: BTreeMap<String, String>,
}

impl Default for ClassifySettings {
    fn default() -> Self {
        Self {
            mime_types: None,
            system_tables: true,
            builtin_table: true,
            sniff_content: false,
            extra_extensions: BTreeMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Scan filter rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to include hidden files (starting with "."). Defaults to true.
    #[serde(default = "default_true")]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Rules for including files (whitelist, overrides exclude rules).
    #[serde(default)]
    pub include: IncludeRules,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the path relative to the source root.
    #[serde(default)]
    pub patterns: Vec<String>,

    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Config {
    /// Load configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if given (must exist)
    /// 2. `.mediasortrc.toml` in the current directory
    /// 3. `~/.config/mediasort/config.toml`
    /// 4. Defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_NAME);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("mediasort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Validated batch width.
    pub fn concurrency(&self) -> Result<usize, ConfigError> {
        match self.relocate.concurrency {
            0 => Err(ConfigError::InvalidConcurrency),
            n => Ok(n),
        }
    }

    pub fn mime_table_options(&self) -> MimeTableOptions {
        MimeTableOptions {
            override_file: self.classify.mime_types.clone(),
            system_tables: self.classify.system_tables,
            builtin_table: self.classify.builtin_table,
        }
    }

    /// Builds a classifier over `table` with this configuration's overrides.
    pub fn classifier(&self, table: MimeTable) -> Result<TypeClassifier, ConfigError> {
        let mut classifier =
            TypeClassifier::new(table).with_content_sniffing(self.classify.sniff_content);
        for (ext, name) in &self.classify.extra_extensions {
            let kind = name
                .parse::<MediaType>()
                .ok()
                .filter(MediaType::is_classified)
                .ok_or_else(|| ConfigError::InvalidExtensionType {
                    ext: ext.clone(),
                    name: name.clone(),
                })?;
            classifier.add_extension_override(ext, kind);
        }
        Ok(classifier)
    }

    /// Compile the filter rules for matching.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Pre-compiled filter rules.
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            exclude_regexes,
            include_patterns: compile_globs(&rules.include.patterns)?,
        })
    }

    /// Check whether a file (path relative to the scanned root) takes part in the run.
    ///
    /// Include patterns win; otherwise hidden files, exact names, extensions,
    /// globs and regexes exclude in that order.
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = relative_path.extension()
            && self
                .exclude_extensions
                .contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}
