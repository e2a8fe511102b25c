//! distpack CLI - Package native applications with their shared libraries

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use distpack::inspect::InspectError;
use distpack::ops::{EmbedError, PackageError};
use distpack::resolver::ResolveError;
use distpack::util::diagnostic::{emit, Diagnostic};

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("distpack=debug")
    } else {
        EnvFilter::new("distpack=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli) {
        match diagnostic_for(&e) {
            Some(diag) => emit(&diag, color),
            None => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Package(args) => commands::package::execute(args),
        Commands::Resolve(args) => commands::resolve::execute(args),
        Commands::Embed(args) => commands::embed::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Rich diagnostic for typed library errors anywhere in the chain.
fn diagnostic_for(err: &anyhow::Error) -> Option<Diagnostic> {
    if let Some(e) = err.downcast_ref::<PackageError>() {
        return Some(e.to_diagnostic());
    }
    if let Some(e) = err.downcast_ref::<ResolveError>() {
        return Some(e.to_diagnostic());
    }
    if let Some(e) = err.downcast_ref::<InspectError>() {
        return Some(e.to_diagnostic());
    }
    if let Some(e) = err.downcast_ref::<EmbedError>() {
        return Some(e.to_diagnostic());
    }
    None
}
