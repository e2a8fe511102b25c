//! distpack - Package native applications with their shared libraries
//!
//! This crate provides the core library functionality for distpack,
//! including transitive shared-library resolution, flat archive packaging,
//! and metadata header generation.

pub mod archive;
pub mod core;
pub mod inspect;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test utilities and mocks for distpack unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a table-driven dependency inspector and
/// on-disk library trees.
#[cfg(test)]
pub mod test_support;

pub use archive::{ArchiveFormat, ArchiveManifest};
pub use core::{AppMetadata, BinaryKind, NameMatching, SearchPath};
pub use inspect::{DependencyInspector, InspectError, ToolInspector};
pub use resolver::{resolve, Resolution, ResolveError, ResolveOptions, UnresolvedPolicy};
