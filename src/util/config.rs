//! Configuration file support for distpack.
//!
//! distpack supports two configuration file locations:
//! - Global: `~/.distpack/config.toml` - User-wide defaults
//! - Project: `.distpack/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::NameMatching;
use crate::inspect::InspectorTool;
use crate::resolver::UnresolvedPolicy;

/// distpack configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Packaging settings
    pub package: PackageConfig,

    /// Header generation settings
    pub embed: EmbedConfig,
}

/// Packaging-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Directories searched for shared libraries, in order
    pub search_path: Vec<PathBuf>,

    /// Binaries always resolved and packaged
    pub extra_binaries: Vec<PathBuf>,

    /// Handling of unresolved dependencies (warn, error)
    pub unresolved: Option<UnresolvedPolicy>,

    /// Name comparison (exact, ignore-ascii-case)
    pub name_matching: Option<NameMatching>,

    /// Glob patterns for libraries the target system provides
    pub system_libraries: Vec<String>,

    /// Import table reader (objdump, readelf)
    pub inspector: Option<InspectorTool>,

    /// Explicit path to the inspector program
    pub inspector_path: Option<PathBuf>,
}

/// Header generation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    /// Include guard for generated headers
    pub guard: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration, or defaults if the file doesn't exist.
    ///
    /// A file that exists but can't be read or parsed is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge another config into this one (other takes precedence).
    ///
    /// Lists are replaced, not concatenated, so a project can narrow a
    /// global search path.
    pub fn merge(&mut self, other: Config) {
        // Package settings
        if !other.package.search_path.is_empty() {
            self.package.search_path = other.package.search_path;
        }
        if !other.package.extra_binaries.is_empty() {
            self.package.extra_binaries = other.package.extra_binaries;
        }
        if other.package.unresolved.is_some() {
            self.package.unresolved = other.package.unresolved;
        }
        if other.package.name_matching.is_some() {
            self.package.name_matching = other.package.name_matching;
        }
        if !other.package.system_libraries.is_empty() {
            self.package.system_libraries = other.package.system_libraries;
        }
        if other.package.inspector.is_some() {
            self.package.inspector = other.package.inspector;
        }
        if other.package.inspector_path.is_some() {
            self.package.inspector_path = other.package.inspector_path;
        }

        // Embed settings
        if other.embed.guard.is_some() {
            self.embed.guard = other.embed.guard;
        }
    }

    /// Make relative paths relative to `base` instead of the current
    /// directory.
    pub fn rebase(&mut self, base: &Path) {
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        self.package.search_path.iter_mut().for_each(rebase);
        self.package.extra_binaries.iter_mut().for_each(rebase);
        if let Some(path) = self.package.inspector_path.as_mut() {
            rebase(path);
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.distpack/config.toml)
/// 2. Global config (~/.distpack/config.toml)
/// 3. Defaults
///
/// Relative paths in the project config are taken relative to the project
/// root, the directory holding `.distpack/`. Missing files count as empty;
/// malformed files are errors.
pub fn load_config(global_path: &Path, project_path: &Path) -> Result<Config> {
    let mut config = Config::default();

    // Load global config first
    config.merge(Config::load_or_default(global_path)?);

    // Project config overrides global
    let mut project = Config::load_or_default(project_path)?;
    if let Some(root) = project_path.parent().and_then(Path::parent) {
        project.rebase(root);
    }
    config.merge(project);

    Ok(config)
}

/// Get the global distpack config directory (~/.distpack).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".distpack"))
}

/// Get the global config path (~/.distpack/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.distpack/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".distpack").join("config.toml")
}
