//! GLib packager library.
//!
//! This crate fetches the Ubuntu bionic-updates binary packages of GLib
//! 2.56.4, verifies them against recorded SHA-256 digests, and repackages
//! their libraries and headers into a layout a native build toolchain can
//! consume. It is used by the `glib-packager` CLI binary and can be driven
//! programmatically through [`pipeline`].
//!
//! # Modules
//!
//! - [`artefact`] - Artefact table, download, verification, and extraction
//! - [`cli`] - Command-line argument definitions
//! - [`command`] - External tool invocation behind a mockable trait
//! - [`compiler_config`] - Include paths, library paths, and link names
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`error`] - Error types for every pipeline stage
//! - [`layout`] - Repackaging of the extracted tree
//! - [`output`] - Progress, summary, and dry-run formatting
//! - [`package_info`] - `package_info.json` emission
//! - [`pipeline`] - End-to-end orchestration
//! - [`platform`] - Platform descriptors and architecture translation
//! - [`resolve`] - The `resolve` subcommand
//! - [`triplet`] - Multiarch triplet computation

pub mod artefact;
pub mod cli;
pub mod command;
pub mod compiler_config;
pub mod dirs;
pub mod error;
pub mod layout;
pub mod output;
pub mod package_info;
pub mod pipeline;
pub mod platform;
pub mod resolve;
pub mod triplet;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
