//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `CAIRN_PUBLIC_PATH`, `CAIRN_OUTPUT_DIR`
//! 2. Project: `cairn.toml` (or an explicit path)
//! 3. Global: `~/.cairn/config.toml`
//!
//! ```toml
//! output_dir = "assets"
//!
//! [entries]
//! app = "assets/app"
//! vendor = "node_modules/@company"
//!
//! [file_types.woff2]
//! fingerprint_in_filename = true
//! ```

use crate::asset::is_valid_namespace;
use crate::compression::GzipCompression;
use crate::file_type::{FileTypePolicy, FileTypeRegistry};
use crate::html::{AssetHtmlGenerator, AssetUrl};
use crate::loader::FileLoader;
use crate::namespace::{normalize_path, NamespaceRegistry};
use crate::registry::AssetRegistry;
use crate::storage::AssetStorage;
use cairn_core::{CairnError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const PUBLIC_PATH_ENV: &str = "CAIRN_PUBLIC_PATH";
pub const OUTPUT_DIR_ENV: &str = "CAIRN_OUTPUT_DIR";

fn default_output_dir() -> String {
    "assets".to_string()
}

/// Config file structure; every field is optional so layers can be merged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CairnConfigFile {
    #[serde(default)]
    pub project_dir: Option<PathBuf>,
    /// Namespace to directory, relative to the project dir
    #[serde(default)]
    pub entries: BTreeMap<String, PathBuf>,
    /// Absolute path of the web root, or relative to the project dir
    #[serde(default)]
    pub public_path: Option<PathBuf>,
    /// Directory below the public path that receives published assets
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub debug: Option<bool>,
    #[serde(default)]
    pub file_types: BTreeMap<String, FileTypePolicy>,
}

/// Resolved configuration with all layers applied
#[derive(Debug, Clone)]
pub struct CairnConfig {
    pub project_dir: PathBuf,
    pub entries: BTreeMap<String, PathBuf>,
    pub public_path: PathBuf,
    pub output_dir: String,
    pub debug: bool,
    pub file_types: BTreeMap<String, FileTypePolicy>,
}

/// Everything wired from one config, one instance per process
pub struct AssetServices {
    pub namespaces: Arc<NamespaceRegistry>,
    pub registry: Arc<AssetRegistry>,
    pub urls: AssetUrl,
    pub html: AssetHtmlGenerator,
}

impl CairnConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = CairnConfigFile::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                Self::merge_into(&mut config, Self::load_file(&global_path)?);
            }
        }

        Self::merge_into(&mut config, Self::load_file(path)?);
        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok());

        Self::resolve(config, Self::config_dir(path)?)
    }

    /// Load config from a specific file path only (no global layer)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        Self::resolve(config, Self::config_dir(path)?)
    }

    /// Parse a single config document. Relative paths resolve against `base_dir`.
    pub fn from_toml(content: &str, base_dir: &Path) -> Result<Self> {
        let file: CairnConfigFile = toml::from_str(content)?;
        Self::resolve(file, base_dir.to_path_buf())
    }

    /// Check the namespace map and file type table.
    ///
    /// Namespaces must match `[a-z][a-z0-9_]*` (any case), entry paths may
    /// not contain `...` and must stay inside the project dir.
    pub fn validate(&self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(CairnError::ConfigError(
                "At least one entry namespace is required".to_string(),
            ));
        }
        if let Some(bad) = self.entries.keys().find(|ns| !is_valid_namespace(ns)) {
            return Err(CairnError::ConfigError(format!(
                "The namespaces must start with a-z and can only contain a-z, 0-9 and _: '{}'",
                bad
            )));
        }
        if self.output_dir.trim_matches('/').is_empty() {
            return Err(CairnError::ConfigError(
                "output_dir must name a directory below the public path".to_string(),
            ));
        }

        self.namespace_registry()?;
        self.file_type_registry()?;
        Ok(())
    }

    pub fn namespace_registry(&self) -> Result<NamespaceRegistry> {
        NamespaceRegistry::with_entries(&self.project_dir, &self.entries)
    }

    /// Built-in file types with the configured ones layered on top
    pub fn file_type_registry(&self) -> Result<FileTypeRegistry> {
        let mut registry = FileTypeRegistry::with_builtins();
        for (extension, policy) in &self.file_types {
            registry.register(extension, policy.clone())?;
        }
        Ok(registry)
    }

    /// Validate and wire the asset pipeline
    pub fn build(&self) -> Result<AssetServices> {
        self.validate()?;

        let namespaces = Arc::new(self.namespace_registry()?);
        let storage = AssetStorage::new(
            Arc::new(FileLoader::new(Arc::clone(&namespaces))),
            Arc::new(self.file_type_registry()?),
            Arc::new(GzipCompression::new()),
            &self.public_path,
            &self.output_dir,
        );
        let registry = Arc::new(AssetRegistry::new(storage));
        let urls = AssetUrl::new(Arc::clone(&registry));
        let html = AssetHtmlGenerator::new(Arc::clone(&registry), urls.clone(), self.debug);

        tracing::debug!(
            namespaces = namespaces.len(),
            storage = %registry.storage().storage_path().display(),
            "asset pipeline ready"
        );

        Ok(AssetServices {
            namespaces,
            registry,
            urls,
            html,
        })
    }

    fn resolve(file: CairnConfigFile, config_dir: PathBuf) -> Result<Self> {
        let project_dir = normalize_path(&match file.project_dir {
            Some(dir) => config_dir.join(dir),
            None => config_dir,
        });
        let public_path = normalize_path(
            &project_dir.join(file.public_path.unwrap_or_else(|| PathBuf::from("public"))),
        );

        Ok(CairnConfig {
            project_dir,
            entries: file.entries,
            public_path,
            output_dir: file.output_dir.unwrap_or_else(default_output_dir),
            debug: file.debug.unwrap_or(false),
            file_types: file.file_types,
        })
    }

    fn config_dir(path: &Path) -> Result<PathBuf> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if dir.is_absolute() {
            return Ok(dir);
        }
        let cwd = std::env::current_dir().map_err(|e| {
            CairnError::ConfigError(format!("Cannot determine current directory: {}", e))
        })?;
        Ok(cwd.join(dir))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".cairn").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<CairnConfigFile> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CairnError::ConfigError(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            CairnError::ConfigError(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn merge_into(base: &mut CairnConfigFile, overlay: CairnConfigFile) {
        if overlay.project_dir.is_some() {
            base.project_dir = overlay.project_dir;
        }
        base.entries.extend(overlay.entries);
        if overlay.public_path.is_some() {
            base.public_path = overlay.public_path;
        }
        if overlay.output_dir.is_some() {
            base.output_dir = overlay.output_dir;
        }
        if overlay.debug.is_some() {
            base.debug = overlay.debug;
        }
        base.file_types.extend(overlay.file_types);
    }

    fn apply_env_overrides<F>(config: &mut CairnConfigFile, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(public_path) = lookup(PUBLIC_PATH_ENV) {
            config.public_path = Some(PathBuf::from(public_path));
        }
        if let Some(output_dir) = lookup(OUTPUT_DIR_ENV) {
            config.output_dir = Some(output_dir);
        }
    }
}
