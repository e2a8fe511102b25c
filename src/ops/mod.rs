//! High-level operations.
//!
//! This module contains the implementation of distpack commands.

pub mod embed;
pub mod package;

pub use embed::{embed, render, EmbedError, HeaderOptions, DEFAULT_GUARD};
pub use package::{
    format_report, package, PackageError, PackageInputs, PackageOptions, PackageReport,
};
