//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use distpack::archive::ArchiveFormat;
use distpack::core::NameMatching;
use distpack::inspect::InspectorTool;
use distpack::resolver::UnresolvedPolicy;

/// distpack - Package native applications with their shared libraries
#[derive(Parser)]
#[command(name = "distpack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Package binaries, their shared libraries and extra files into an archive
    Package(PackageArgs),

    /// Print the shared libraries a set of binaries needs
    Resolve(ResolveCmdArgs),

    /// Generate a C++ header holding application metadata
    Embed(EmbedArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by every command that resolves dependencies.
#[derive(Args)]
pub struct ResolveArgs {
    /// Directory to search for shared libraries (repeatable, searched in order)
    #[arg(short = 'L', long = "search-path", value_name = "DIR")]
    pub search_path: Vec<PathBuf>,

    /// Extra binary to resolve and package (repeatable)
    #[arg(long = "extra-binary", value_name = "FILE")]
    pub extra_binaries: Vec<PathBuf>,

    /// What to do with dependencies not found on the search path (warn, error)
    #[arg(long)]
    pub unresolved: Option<UnresolvedPolicy>,

    /// How library names are compared (exact, ignore-ascii-case)
    #[arg(long)]
    pub name_matching: Option<NameMatching>,

    /// Glob for libraries the target system provides (repeatable)
    #[arg(long = "system-lib", value_name = "GLOB")]
    pub system_libraries: Vec<String>,

    /// Tool used to read import tables (objdump, readelf)
    #[arg(long)]
    pub inspector: Option<InspectorTool>,

    /// Path to the inspector program
    #[arg(long, value_name = "PATH", env = "DISTPACK_INSPECTOR_PATH")]
    pub inspector_path: Option<PathBuf>,
}

#[derive(Args)]
pub struct PackageArgs {
    /// Archive to create (.zip, .tar.gz or .tgz)
    #[arg(short, long, value_name = "ARCHIVE")]
    pub output: PathBuf,

    /// Files to package; binaries are detected by suffix
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// File to package as-is, without inspection (repeatable)
    #[arg(long = "aux", value_name = "FILE")]
    pub auxiliary: Vec<PathBuf>,

    /// Archive format, overriding the output extension
    #[arg(long)]
    pub format: Option<ArchiveFormat>,

    /// Show what would be packaged without writing the archive
    #[arg(long)]
    pub dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub resolve: ResolveArgs,
}

#[derive(Args)]
pub struct ResolveCmdArgs {
    /// Binaries whose dependencies are resolved
    #[arg(value_name = "BINARIES")]
    pub binaries: Vec<PathBuf>,

    /// Print the resolution as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub resolve: ResolveArgs,
}

#[derive(Args)]
pub struct EmbedArgs {
    /// Header file to write
    #[arg(short, long, value_name = "HEADER")]
    pub output: PathBuf,

    /// TOML file with an [app] table (name, version, release_type)
    #[arg(long, value_name = "FILE")]
    pub metadata: Option<PathBuf>,

    /// Application name
    #[arg(long)]
    pub app_name: Option<String>,

    /// Application version
    #[arg(long)]
    pub app_version: Option<String>,

    /// Release type (e.g. alpha, beta, release)
    #[arg(long)]
    pub release_type: Option<String>,

    /// Include guard
    #[arg(long)]
    pub guard: Option<String>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
