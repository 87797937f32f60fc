//! Cairn Asset - Namespaced asset publishing with content fingerprints
//!
//! Resolves logical references such as `@app/css/app.css` to files
//! published under a public web root, named after their content hash,
//! and memoizes the resolution for the lifetime of the process.

mod asset;
mod compression;
pub mod config;
mod file_type;
mod html;
mod loader;
mod manifest;
mod namespace;
mod registry;
mod storage;

pub use asset::{is_valid_namespace, Asset, AssetKey};
pub use compression::{Compressor, GzipCompression};
pub use config::{AssetServices, CairnConfig};
pub use file_type::{FileTypePolicy, FileTypeRegistry, INTEGRITY_SLOT, URL_SLOT};
pub use html::{AssetHtmlGenerator, AssetUrl};
pub use loader::{ContentLoader, FileLoader, LoadMode};
pub use manifest::{AssetManifest, ManifestEntry};
pub use namespace::NamespaceRegistry;
pub use registry::AssetRegistry;
pub use storage::AssetStorage;
