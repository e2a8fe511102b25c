//! Application metadata embedded into generated headers.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// The three fields rendered into the generated header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    /// Application name
    pub name: String,

    /// Version string, e.g. `1.2.3`
    pub version: String,

    /// Release type, e.g. `alpha`, `beta`, `release`
    pub release_type: String,
}

/// On-disk layout of a metadata file: an `[app]` table.
#[derive(Debug, Deserialize)]
struct MetadataFile {
    app: AppMetadata,
}

impl AppMetadata {
    /// Create metadata from its three fields.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        release_type: impl Into<String>,
    ) -> Self {
        AppMetadata {
            name: name.into(),
            version: version.into(),
            release_type: release_type.into(),
        }
    }

    /// Load metadata from a TOML file with an `[app]` table.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read metadata file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("failed to parse metadata file: {}", path.display()))
    }

    /// Parse metadata from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let file: MetadataFile = toml::from_str(contents)?;
        Ok(file.app)
    }

    /// Fields paired with the names used in diagnostics.
    pub fn fields(&self) -> [(&'static str, &str); 3] {
        [
            ("name", self.name.as_str()),
            ("version", self.version.as_str()),
            ("release_type", self.release_type.as_str()),
        ]
    }
}
