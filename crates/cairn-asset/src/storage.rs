//! Publishing assets under the public storage root
//!
//! Published files live at
//! `<public_path>/<output_dir>/<namespace>/<dir>/<base>[.<fingerprint>].<ext>[.gz]`.

use crate::asset::Asset;
use crate::compression::Compressor;
use crate::file_type::FileTypeRegistry;
use crate::loader::{ContentLoader, LoadMode};
use cairn_core::{CairnError, Fingerprint, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Write `data` to `path` so that readers never observe a partial file.
///
/// The content goes to a uniquely named temp file in the target directory
/// first and is renamed into place. Concurrent writers of the same path all
/// succeed; the last rename wins.
pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let write_error = |source: std::io::Error| CairnError::StorageWriteError {
        path: path.to_path_buf(),
        source,
    };

    let parent = path.parent().ok_or_else(|| {
        write_error(std::io::Error::new(
            ErrorKind::InvalidInput,
            "path has no parent directory",
        ))
    })?;
    fs::create_dir_all(parent).map_err(write_error)?;

    // fixed length, so any name that fits the target also fits the temp file
    let temp_path = parent.join(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));

    let written = fs::File::create(&temp_path).and_then(|mut file| {
        file.write_all(data)?;
        file.sync_all()
    });
    if let Err(e) = written.and_then(|_| fs::rename(&temp_path, path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(write_error(e));
    }

    Ok(())
}

/// Imports assets into the public storage root
pub struct AssetStorage {
    loader: Arc<dyn ContentLoader>,
    file_types: Arc<FileTypeRegistry>,
    compressor: Arc<dyn Compressor>,
    output_dir: String,
    storage_path: PathBuf,
}

impl AssetStorage {
    /// `public_path` is the absolute web root, `output_dir` the directory
    /// below it that holds published assets.
    pub fn new<P: AsRef<Path>>(
        loader: Arc<dyn ContentLoader>,
        file_types: Arc<FileTypeRegistry>,
        compressor: Arc<dyn Compressor>,
        public_path: P,
        output_dir: &str,
    ) -> Self {
        let output_dir = output_dir.trim_matches('/').to_string();
        let public_path = public_path.as_ref().to_string_lossy();
        let storage_path = PathBuf::from(format!(
            "{}/{}",
            public_path.trim_end_matches('/'),
            output_dir
        ));

        Self {
            loader,
            file_types,
            compressor,
            output_dir,
            storage_path,
        }
    }

    /// Root of all published files
    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    /// Output directory relative to the public path, without slashes
    pub fn output_dir(&self) -> &str {
        &self.output_dir
    }

    pub fn file_types(&self) -> &FileTypeRegistry {
        &self.file_types
    }

    pub fn loader(&self) -> &dyn ContentLoader {
        self.loader.as_ref()
    }

    /// Where an asset is published, given its current fingerprint state
    pub fn output_path(&self, asset: &Asset) -> Result<PathBuf> {
        asset.ensure_contained()?;
        Ok(self
            .storage_path
            .join(asset.namespace())
            .join(asset.published_file_name()))
    }

    /// Fingerprint and publish an asset, returning it with the fingerprint
    /// attached.
    ///
    /// Importing unchanged content again yields the same fingerprint and
    /// identical output. A failed gzip pass is logged and leaves the
    /// uncompressed file in place.
    pub fn import(&self, mut asset: Asset) -> Result<Asset> {
        let content = self.loader.load_file(&asset, LoadMode::Prod)?;
        let policy = self.file_types.policy_for_asset(&asset);

        asset.attach_fingerprint(
            Fingerprint::from_bytes(&content),
            policy.fingerprint_in_filename,
        );

        let output_path = self.output_path(&asset)?;
        write_atomic(&output_path, &content)?;
        tracing::info!(
            asset = %asset,
            path = %output_path.display(),
            bytes = content.len(),
            "published asset"
        );

        if policy.gzip {
            if let Err(e) = self.compressor.compress_file(&output_path) {
                tracing::warn!(asset = %asset, error = %e, "serving asset uncompressed");
            }
        }

        Ok(asset)
    }

    /// Remove the whole storage root. A missing root is not an error.
    pub fn remove_all_stored_files(&self) -> Result<()> {
        match fs::remove_dir_all(&self.storage_path) {
            Ok(()) => {
                tracing::info!(path = %self.storage_path.display(), "removed stored assets");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CairnError::StorageWriteError {
                path: self.storage_path.clone(),
                source,
            }),
        }
    }
}
