//! Public URLs and HTML link markup for resolved assets

use crate::asset::Asset;
use crate::loader::LoadMode;
use crate::registry::AssetRegistry;
use cairn_core::{CairnError, Result};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Builds public URLs of published assets
#[derive(Clone)]
pub struct AssetUrl {
    registry: Arc<AssetRegistry>,
    base_url: String,
}

impl AssetUrl {
    /// URLs are rooted at `/`, i.e. the public path
    pub fn new(registry: Arc<AssetRegistry>) -> Self {
        Self::with_base_url(registry, "")
    }

    /// URLs are prefixed with `base_url`, e.g. a CDN origin
    pub fn with_base_url(registry: Arc<AssetRegistry>, base_url: &str) -> Self {
        Self {
            registry,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `<base>/<output_dir>/<namespace>/<published file name>`, resolving
    /// the asset first
    pub fn generate(&self, asset: &Asset) -> Result<String> {
        let resolved = self.registry.get(asset)?;
        Ok(self.url_for_resolved(&resolved))
    }

    fn url_for_resolved(&self, asset: &Asset) -> String {
        let output_dir = self.registry.storage().output_dir();
        let mut url = self.base_url.clone();
        if !output_dir.is_empty() {
            url.push('/');
            url.push_str(output_dir);
        }
        url.push('/');
        url.push_str(asset.namespace());
        url.push('/');
        url.push_str(&asset.published_file_name());
        url
    }
}

/// Renders `<link>`/`<script>` markup for lists of asset references
pub struct AssetHtmlGenerator {
    registry: Arc<AssetRegistry>,
    urls: AssetUrl,
    debug: bool,
}

impl AssetHtmlGenerator {
    /// With `debug` set, links carry no integrity attribute
    pub fn new(registry: Arc<AssetRegistry>, urls: AssetUrl, debug: bool) -> Self {
        Self {
            registry,
            urls,
            debug,
        }
    }

    /// Markup linking every reference, in order.
    ///
    /// All references are parsed before anything is resolved. A file type
    /// without link format fails with `UnsupportedFileType`.
    pub fn link_assets(&self, references: &[&str]) -> Result<String> {
        let assets = references
            .iter()
            .map(|reference| Asset::parse(reference))
            .collect::<Result<Vec<_>>>()?;

        let file_types = self.registry.storage().file_types();
        let mut html = String::new();

        for asset in &assets {
            file_types.link_format_for(asset)?;
            let resolved = self.registry.get(asset)?;
            let url = self.urls.url_for_resolved(&resolved);
            let integrity = self.integrity_attribute(&resolved);

            if let Some(link) = file_types
                .policy_for_asset(&resolved)
                .render_link(&url, &integrity)
            {
                html.push_str(&link);
            }
        }

        Ok(html)
    }

    /// Source content of an asset, for embedding it directly in a page.
    ///
    /// Content that is not valid UTF-8 fails with `SourceFileUnreadable`.
    pub fn inline(&self, reference: &str) -> Result<String> {
        let asset = Asset::parse(reference)?;
        let content = self
            .registry
            .storage()
            .loader()
            .load_file(&asset, LoadMode::Source)?;
        String::from_utf8(content).map_err(|e| CairnError::SourceFileUnreadable {
            reference: asset.reference(),
            path: PathBuf::from(asset.path()),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })
    }

    fn integrity_attribute(&self, asset: &Asset) -> String {
        match (self.debug, asset.fingerprint()) {
            (false, Some(fingerprint)) => format!(r#" integrity="sha256-{}""#, fingerprint),
            _ => String::new(),
        }
    }
}
