//! `distpack resolve` command

use anyhow::{bail, Result};

use super::{current_config, ResolveSettings};
use crate::cli::ResolveCmdArgs;
use distpack::resolver::resolve;

pub fn execute(args: ResolveCmdArgs) -> Result<()> {
    let config = current_config()?;
    let settings = ResolveSettings::new(args.resolve, config)?;

    let mut binaries = args.binaries;
    binaries.extend(settings.extra_binaries);
    if binaries.is_empty() {
        bail!("no binaries given; pass at least one binary or configure `extra_binaries`");
    }
    if let Some(missing) = binaries.iter().find(|b| !b.is_file()) {
        bail!("binary not found: {}", missing.display());
    }

    let resolution = resolve(
        &binaries,
        &settings.search_path,
        &settings.options,
        &settings.inspector,
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
        return Ok(());
    }

    for (name, path) in &resolution.resolved {
        println!("{} => {}", name, path.display());
    }
    for name in &resolution.skipped {
        println!("{} => (system)", name);
    }
    for name in &resolution.unresolved {
        println!("{} => not found", name);
    }

    Ok(())
}
