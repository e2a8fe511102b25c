//! `distpack package` command

use anyhow::Result;

use super::{current_config, ResolveSettings};
use crate::cli::PackageArgs;
use distpack::ops::{format_report, package, PackageInputs, PackageOptions};

pub fn execute(args: PackageArgs) -> Result<()> {
    let config = current_config()?;
    let settings = ResolveSettings::new(args.resolve, config)?;

    let inputs = PackageInputs::new(args.output)
        .with_entry_files(args.files)
        .with_extra_binaries(settings.extra_binaries)
        .with_auxiliary_files(args.auxiliary);

    let mut opts = PackageOptions::new(settings.search_path)
        .with_resolve_options(settings.options)
        .with_dry_run(args.dry_run);
    if let Some(format) = args.format {
        opts = opts.with_format(format);
    }

    let report = package(&inputs, &opts, &settings.inspector)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&report));
    }

    Ok(())
}
