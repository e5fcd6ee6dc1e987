//! Storage manifest model, loading, and download URL resolution.
//!
//! The OpenVINO storage server publishes `filetree.json`, a JSON tree that
//! lists every directory and file it serves. This module loads that tree
//! and resolves the single archive matching a version, operating system,
//! release, and architecture.
//!
//! # Sub-modules
//!
//! - [`error`] - Failure taxonomy for loading and resolution.
//! - [`loader`] - Read-through manifest loading.
//! - [`node`] - Manifest tree nodes (`FileTreeNode`).
//! - [`os`] - Recognized operating systems (`Os`).
//! - [`resolver`] - Tree traversal and file matching (`UrlResolver`).

pub mod error;
pub mod loader;
pub mod node;
pub mod os;
pub mod resolver;

pub use error::FileTreeError;
pub use loader::{FILETREE_FILE_NAME, FILETREE_URL, load_filetree, load_filetree_from, parse_filetree};
pub use node::{FileTreeNode, NodeKind};
pub use os::Os;
pub use resolver::{DEFAULT_ARCH, ResolutionRequest, STORAGE_URL, UrlResolver, resolve_url};
