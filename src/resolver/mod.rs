//! Shared-library dependency resolution.
//!
//! Computes the transitive closure of native libraries needed by a set of
//! entry binaries, locating each one on an ordered search path.

pub mod errors;
pub mod resolve;

pub use errors::ResolveError;
pub use resolve::{resolve, Resolution, ResolveOptions, UnresolvedPolicy};
