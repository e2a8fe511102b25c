//! Command implementations

pub mod completions;
pub mod embed;
pub mod package;
pub mod resolve;

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::ResolveArgs;
use distpack::core::SearchPath;
use distpack::inspect::ToolInspector;
use distpack::resolver::ResolveOptions;
use distpack::util::config::{global_config_path, load_config, project_config_path, Config};

/// Load configuration (global + project) for the current directory.
pub fn current_config() -> Result<Config> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let global = global_config_path().unwrap_or_default();
    load_config(&global, &project_config_path(&cwd))
}

/// Resolution settings with CLI flags taking precedence over config.
pub struct ResolveSettings {
    pub search_path: SearchPath,
    pub extra_binaries: Vec<PathBuf>,
    pub options: ResolveOptions,
    pub inspector: ToolInspector,
}

impl ResolveSettings {
    pub fn new(args: ResolveArgs, config: Config) -> Result<Self> {
        let package = config.package;

        // Lists given on the command line replace the configured ones
        let search_path = if args.search_path.is_empty() {
            package.search_path
        } else {
            args.search_path
        };
        let extra_binaries = if args.extra_binaries.is_empty() {
            package.extra_binaries
        } else {
            args.extra_binaries
        };
        let system_libraries = if args.system_libraries.is_empty() {
            package.system_libraries
        } else {
            args.system_libraries
        };

        let options = ResolveOptions::new()
            .with_matching(args.name_matching.or(package.name_matching).unwrap_or_default())
            .with_unresolved(args.unresolved.or(package.unresolved).unwrap_or_default())
            .with_system_libraries(&system_libraries)?;

        let mut inspector = ToolInspector::new(args.inspector.or(package.inspector).unwrap_or_default());
        if let Some(program) = args.inspector_path.or(package.inspector_path) {
            inspector = inspector.with_program(program);
        }

        tracing::debug!(
            "search path: {:?}, matching: {}, unresolved: {}",
            search_path,
            options.matching,
            options.unresolved
        );

        Ok(ResolveSettings {
            search_path: SearchPath::new(search_path),
            extra_binaries,
            options,
            inspector,
        })
    }
}
