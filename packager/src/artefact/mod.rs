//! Artefact resolution, retrieval, verification, and extraction.
//!
//! # Sub-modules
//!
//! - [`catalogue`] - The fixed per-architecture artefact table.
//! - [`download`] - Artefact download trait and HTTP implementation.
//! - [`extraction`] - Two-stage `.deb` unpacking with path traversal
//!   protection.
//! - [`sha256_digest`] - SHA-256 digest newtype (`Sha256Digest`).
//! - [`verification`] - Digest computation and the fetch-and-verify gate.

pub mod catalogue;
pub mod download;
pub mod extraction;
pub mod sha256_digest;
pub mod verification;
