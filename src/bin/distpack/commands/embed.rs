//! `distpack embed` command

use anyhow::{Context, Result};

use super::current_config;
use crate::cli::EmbedArgs;
use distpack::core::AppMetadata;
use distpack::ops::{embed, HeaderOptions};

pub fn execute(args: EmbedArgs) -> Result<()> {
    let config = current_config()?;

    // Flags override individual fields of the metadata file
    let metadata = match &args.metadata {
        Some(path) => {
            let mut metadata = AppMetadata::load(path)?;
            if let Some(name) = args.app_name {
                metadata.name = name;
            }
            if let Some(version) = args.app_version {
                metadata.version = version;
            }
            if let Some(release_type) = args.release_type {
                metadata.release_type = release_type;
            }
            metadata
        }
        None => AppMetadata::new(
            args.app_name
                .context("--app-name is required without --metadata")?,
            args.app_version
                .context("--app-version is required without --metadata")?,
            args.release_type
                .context("--release-type is required without --metadata")?,
        ),
    };

    let mut options = HeaderOptions::default();
    if let Some(guard) = args.guard.or(config.embed.guard) {
        options = options.with_guard(guard);
    }

    if embed(&metadata, &args.output, &options)? {
        eprintln!("    Generated {}", args.output.display());
    } else {
        eprintln!("    Fresh {}", args.output.display());
    }

    Ok(())
}
