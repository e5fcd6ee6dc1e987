//! OpenVINO installer library.
//!
//! This crate resolves, downloads, and extracts OpenVINO release archives
//! published on the OpenVINO storage server, or installs the Intel APT
//! packages. It is used by the `openvino-installer` CLI binary and can be
//! consumed programmatically for testing or custom installation workflows.
//!
//! # Modules
//!
//! - [`apt`] - APT repository setup and package installation
//! - [`artefact`] - Cached download and archive extraction
//! - [`cli`] - Command-line argument definitions
//! - [`command`] - External command execution
//! - [`config`] - Configuration file loading and merging
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`environment`] - Host OS, architecture, and distribution detection
//! - [`error`] - Aggregated error types
//! - [`filetree`] - Storage manifest model and URL resolution
//! - [`output`] - Progress output and environment export
//! - [`pipeline`] - Archive installation orchestration
//! - [`policy`] - Version and codename conventions
//! - [`target`] - Merging inputs with host detection

pub mod apt;
pub mod artefact;
pub mod cli;
pub mod command;
pub mod config;
pub mod dirs;
pub mod environment;
pub mod error;
pub mod filetree;
pub mod output;
pub mod pipeline;
pub mod policy;
pub mod target;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
