//! Pre-compression of published files

use crate::storage::write_atomic;
use cairn_core::{CairnError, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Produces a compressed sibling of a published file
pub trait Compressor: Send + Sync {
    /// Compress `path`, returning the path of the compressed copy
    fn compress_file(&self, path: &Path) -> Result<PathBuf>;
}

/// Writes `<path>.gz` next to the original
#[derive(Debug, Clone, Copy)]
pub struct GzipCompression {
    level: Compression,
}

impl Default for GzipCompression {
    fn default() -> Self {
        Self {
            level: Compression::best(),
        }
    }
}

impl GzipCompression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }

    fn gzip(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), self.level);
        encoder.write_all(data)?;
        encoder.finish()
    }
}

impl Compressor for GzipCompression {
    fn compress_file(&self, path: &Path) -> Result<PathBuf> {
        let compression_error = |source: std::io::Error| CairnError::CompressionError {
            path: path.to_path_buf(),
            source,
        };

        let data = std::fs::read(path).map_err(compression_error)?;
        let compressed = self.gzip(&data).map_err(compression_error)?;

        let mut target = path.as_os_str().to_owned();
        target.push(".gz");
        let target = PathBuf::from(target);

        write_atomic(&target, &compressed).map_err(|e| match e {
            CairnError::StorageWriteError { source, .. } => compression_error(source),
            other => other,
        })?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_dir;
    use flate2::read::GzDecoder;
    use std::fs;
    use std::io::Read;

    #[test]
    fn test_compress_file() {
        let dir = temp_dir();
        let file = dir.join("app.css");
        let content = "body { margin: 0; }\n".repeat(50);
        fs::write(&file, &content).unwrap();

        let target = GzipCompression::new().compress_file(&file).unwrap();
        assert_eq!(target, dir.join("app.css.gz"));

        let mut decoded = String::new();
        GzDecoder::new(fs::File::open(&target).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, content);
        assert!(fs::metadata(&target).unwrap().len() < content.len() as u64);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_compress_missing_file() {
        let dir = temp_dir();
        let result = GzipCompression::new().compress_file(&dir.join("missing.js"));
        assert!(matches!(result, Err(CairnError::CompressionError { .. })));
        fs::remove_dir_all(&dir).ok();
    }
}
