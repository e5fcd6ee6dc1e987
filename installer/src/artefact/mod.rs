//! Artefact retrieval and unpacking.
//!
//! # Sub-modules
//!
//! - [`download`] - Download and read-through cache traits with HTTP
//!   implementations.
//! - [`extraction`] - Archive extraction with path traversal protection.

pub mod download;
pub mod extraction;
