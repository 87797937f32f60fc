//! Per-file-type publishing policy

use crate::asset::Asset;
use cairn_core::{CairnError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Slot for the asset URL in an HTML link format
pub const URL_SLOT: &str = "{url}";
/// Slot for the integrity attribute snippet in an HTML link format
pub const INTEGRITY_SLOT: &str = "{integrity}";

/// Publishing rules for one file type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTypePolicy {
    #[serde(default = "default_true")]
    pub fingerprint_in_filename: bool,
    #[serde(default)]
    pub gzip: bool,
    /// Markup template with a `{url}` and an `{integrity}` slot
    #[serde(default)]
    pub html_link_format: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Default for FileTypePolicy {
    fn default() -> Self {
        Self::generic()
    }
}

impl FileTypePolicy {
    /// Fallback for unknown and extensionless files
    pub fn generic() -> Self {
        Self {
            fingerprint_in_filename: true,
            gzip: false,
            html_link_format: None,
        }
    }

    /// Fingerprinted, gzip compressed, without link markup
    pub fn compressed() -> Self {
        Self {
            gzip: true,
            ..Self::generic()
        }
    }

    pub fn stylesheet() -> Self {
        Self {
            html_link_format: Some(format!(
                r#"<link rel="stylesheet" href="{}"{}>"#,
                URL_SLOT, INTEGRITY_SLOT
            )),
            ..Self::compressed()
        }
    }

    pub fn script() -> Self {
        Self {
            html_link_format: Some(format!(
                r#"<script defer src="{}"{}></script>"#,
                URL_SLOT, INTEGRITY_SLOT
            )),
            ..Self::compressed()
        }
    }

    /// Check that a link format carries each slot exactly once
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(format) = &self.html_link_format {
            for slot in [URL_SLOT, INTEGRITY_SLOT] {
                let count = format.matches(slot).count();
                if count != 1 {
                    return Err(format!(
                        "html_link_format must contain {} exactly once, found {}",
                        slot, count
                    ));
                }
            }
        }
        Ok(())
    }

    /// Render the link markup, if this file type has any.
    ///
    /// Slots are filled in one pass over the template, so slot text inside
    /// the substituted values is left alone.
    pub fn render_link(&self, url: &str, integrity: &str) -> Option<String> {
        let format = self.html_link_format.as_ref()?;
        let mut html = String::with_capacity(format.len() + url.len() + integrity.len());
        let mut rest = format.as_str();

        loop {
            let next = [(URL_SLOT, url), (INTEGRITY_SLOT, integrity)]
                .into_iter()
                .filter_map(|(slot, value)| rest.find(slot).map(|at| (at, slot, value)))
                .min_by_key(|(at, _, _)| *at);

            let Some((at, slot, value)) = next else {
                html.push_str(rest);
                return Some(html);
            };
            html.push_str(&rest[..at]);
            html.push_str(value);
            rest = &rest[at + slot.len()..];
        }
    }
}

/// Lookup table from lowercase extension to policy, with a mandatory fallback.
///
/// Built at startup, read-only afterwards.
#[derive(Debug, Clone)]
pub struct FileTypeRegistry {
    types: HashMap<String, FileTypePolicy>,
    fallback: FileTypePolicy,
}

impl Default for FileTypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl FileTypeRegistry {
    /// Registry with only the given fallback
    pub fn new(fallback: FileTypePolicy) -> Self {
        Self {
            types: HashMap::new(),
            fallback,
        }
    }

    /// Registry with the built-in web file types
    pub fn with_builtins() -> Self {
        let mut registry = Self::new(FileTypePolicy::generic());
        registry.types.insert("css".to_string(), FileTypePolicy::stylesheet());
        registry.types.insert("js".to_string(), FileTypePolicy::script());
        for ext in ["svg", "json", "xml", "txt", "map"] {
            registry.types.insert(ext.to_string(), FileTypePolicy::compressed());
        }
        registry
    }

    /// Add or replace the policy for an extension
    pub fn register(&mut self, extension: &str, policy: FileTypePolicy) -> Result<()> {
        policy
            .validate()
            .map_err(|e| CairnError::ConfigError(format!("File type '{}': {}", extension, e)))?;
        self.types
            .insert(extension.trim_start_matches('.').to_ascii_lowercase(), policy);
        Ok(())
    }

    /// Policy for a file type, falling back to the generic one
    pub fn policy_for(&self, file_type: &str) -> &FileTypePolicy {
        self.types.get(file_type).unwrap_or(&self.fallback)
    }

    pub fn policy_for_asset(&self, asset: &Asset) -> &FileTypePolicy {
        self.policy_for(asset.file_type())
    }

    /// The link format for an asset, or `UnsupportedFileType` if it has none
    pub fn link_format_for(&self, asset: &Asset) -> Result<&str> {
        self.policy_for_asset(asset)
            .html_link_format
            .as_deref()
            .ok_or_else(|| CairnError::UnsupportedFileType {
                file_type: asset.file_type().to_string(),
                reference: asset.reference(),
            })
    }
}
