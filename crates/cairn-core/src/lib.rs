//! Cairn Core - Foundational types for the Cairn asset pipeline
//!
//! This crate provides the types that all other Cairn crates depend on:
//! - `Fingerprint` - SHA-256 content fingerprints, base64 encoded
//! - Error types and Result alias

mod error;
mod hash;

pub use error::{CairnError, Result};
pub use hash::{Fingerprint, FILENAME_FINGERPRINT_LEN};
