//! Core data structures for distpack.
//!
//! This module contains the foundational types used throughout distpack:
//! - Binary references and suffix classification
//! - Ordered library search paths and name matching
//! - Application metadata

pub mod binary;
pub mod metadata;
pub mod search_path;

pub use binary::{partition_files, BinaryKind, BinaryRef};
pub use metadata::AppMetadata;
pub use search_path::{NameMatching, SearchPath};
