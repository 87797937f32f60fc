//! Error types for Cairn

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Cairn operations
#[derive(Debug, Error)]
pub enum CairnError {
    #[error("Can't parse asset reference: '{0}'")]
    MalformedReference(String),

    #[error("Invalid asset reference '{0}': no path given")]
    EmptyPath(String),

    #[error("Invalid asset reference '{0}': must not contain path '..'")]
    PathTraversal(String),

    #[error("Unknown asset namespace '{namespace}' (referenced by '{reference}')")]
    NamespaceNotFound { namespace: String, reference: String },

    #[error("No HTML link format found for file of type '{file_type}' ({reference})")]
    UnsupportedFileType { file_type: String, reference: String },

    #[error("Source file not found for '{reference}': {}", path.display())]
    SourceFileNotFound { reference: String, path: PathBuf },

    #[error("Source file for '{reference}' is unreadable ({}): {source}", path.display())]
    SourceFileUnreadable {
        reference: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    StorageWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to compress {}: {source}", path.display())]
    CompressionError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Manifest error: {0}")]
    ManifestError(String),
}

impl CairnError {
    /// Whether this error stems from invalid user or configuration input,
    /// as opposed to the environment or the filesystem.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            CairnError::MalformedReference(_)
                | CairnError::EmptyPath(_)
                | CairnError::PathTraversal(_)
                | CairnError::NamespaceNotFound { .. }
                | CairnError::UnsupportedFileType { .. }
                | CairnError::ConfigError(_)
        )
    }
}

/// Result type alias for Cairn operations
pub type Result<T> = std::result::Result<T, CairnError>;

impl From<toml::de::Error> for CairnError {
    fn from(err: toml::de::Error) -> Self {
        CairnError::ConfigError(err.to_string())
    }
}

impl From<toml::ser::Error> for CairnError {
    fn from(err: toml::ser::Error) -> Self {
        CairnError::ManifestError(err.to_string())
    }
}
