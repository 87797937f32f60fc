//! Persisted record of resolved assets
//!
//! Lets another process reuse what a build already published without
//! importing again. Stored as TOML:
//!
//! ```toml
//! [[asset]]
//! namespace = "bundles"
//! path = "css/app.css"
//! fingerprint = "h3LUaPuRc45texQ23DvE1PSvbZAnLNR0ajQ60dLILzM="
//! fingerprint_in_filename = true
//! ```

use crate::asset::Asset;
use cairn_core::{CairnError, Fingerprint, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One resolved asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub namespace: String,
    pub path: String,
    pub fingerprint: Fingerprint,
    #[serde(default)]
    pub fingerprint_in_filename: bool,
}

impl ManifestEntry {
    pub fn from_asset(asset: &Asset) -> Option<Self> {
        asset.fingerprint().map(|fingerprint| Self {
            namespace: asset.namespace().to_string(),
            path: asset.path().to_string(),
            fingerprint: *fingerprint,
            fingerprint_in_filename: asset.filename_fingerprint().is_some(),
        })
    }

    /// Rebuild the resolved asset. Paths are re-checked like parsed references.
    pub fn to_asset(&self) -> Result<Asset> {
        let asset = Asset::parse(&format!("@{}/{}", self.namespace, self.path))?;
        Ok(asset.with_fingerprint(self.fingerprint, self.fingerprint_in_filename))
    }
}

/// Snapshot of an asset registry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetManifest {
    #[serde(default, rename = "asset")]
    pub assets: Vec<ManifestEntry>,
}

impl AssetManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| CairnError::ManifestError(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CairnError::ManifestError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        crate::storage::write_atomic(path.as_ref(), self.to_toml()?.as_bytes())
    }
}
