//! Loading the raw bytes of source assets

use crate::asset::Asset;
use crate::namespace::NamespaceRegistry;
use cairn_core::{CairnError, Result};
use std::io::ErrorKind;
use std::sync::Arc;

/// Which flavor of an asset to load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// As referenced during development, e.g. for inlining
    Source,
    /// As published under the storage root
    Prod,
}

/// Source of asset content
pub trait ContentLoader: Send + Sync {
    fn load_file(&self, asset: &Asset, mode: LoadMode) -> Result<Vec<u8>>;
}

/// Reads assets straight from their namespace directory.
///
/// Content is passed through untouched in both modes.
pub struct FileLoader {
    namespaces: Arc<NamespaceRegistry>,
}

impl FileLoader {
    pub fn new(namespaces: Arc<NamespaceRegistry>) -> Self {
        Self { namespaces }
    }

    pub fn namespaces(&self) -> &NamespaceRegistry {
        &self.namespaces
    }
}

impl ContentLoader for FileLoader {
    fn load_file(&self, asset: &Asset, _mode: LoadMode) -> Result<Vec<u8>> {
        let path = self.namespaces.resolve(asset)?;

        std::fs::read(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => CairnError::SourceFileNotFound {
                reference: asset.reference(),
                path,
            },
            _ => CairnError::SourceFileUnreadable {
                reference: asset.reference(),
                path,
                source,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixture_namespaces;

    #[test]
    fn test_load_fixture() {
        let loader = FileLoader::new(Arc::new(fixture_namespaces()));
        let asset = Asset::parse("@bundles/test/css/app.css").unwrap();
        let content = loader.load_file(&asset, LoadMode::Prod).unwrap();
        assert!(String::from_utf8(content).unwrap().contains("margin: 0"));
    }

    #[test]
    fn test_modes_are_passthrough() {
        let loader = FileLoader::new(Arc::new(fixture_namespaces()));
        let asset = Asset::parse("@other/test/css/app2.css").unwrap();
        assert_eq!(
            loader.load_file(&asset, LoadMode::Source).unwrap(),
            loader.load_file(&asset, LoadMode::Prod).unwrap()
        );
    }

    #[test]
    fn test_missing_file() {
        let loader = FileLoader::new(Arc::new(fixture_namespaces()));
        let asset = Asset::parse("@bundles/missing.css").unwrap();
        assert!(matches!(
            loader.load_file(&asset, LoadMode::Prod),
            Err(CairnError::SourceFileNotFound { .. })
        ));
    }

    #[test]
    fn test_directory_is_unreadable() {
        let loader = FileLoader::new(Arc::new(fixture_namespaces()));
        let asset = Asset::parse("@bundles/test/css").unwrap();
        assert!(matches!(
            loader.load_file(&asset, LoadMode::Prod),
            Err(CairnError::SourceFileUnreadable { .. })
        ));
    }
}
