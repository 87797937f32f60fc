//! Logical asset identity: `@namespace/relative/path`

use cairn_core::{CairnError, Fingerprint, Result};
use std::fmt;

/// Whether `name` matches the namespace grammar `[a-z][a-z0-9_]*`.
///
/// Letters are accepted in either case; callers keep the name as written.
pub fn is_valid_namespace(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn has_parent_segment(path: &str) -> bool {
    path.split('/').any(|segment| segment == "..")
}

/// Lookup identity of an asset. The fingerprint never takes part in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetKey {
    pub namespace: String,
    pub path: String,
}

/// A logical asset, optionally carrying the fingerprint of its published
/// content.
///
/// The fingerprint is present iff the asset went through a successful
/// storage import (or was restored from a manifest of such imports).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    namespace: String,
    path: String,
    file_type: String,
    fingerprint: Option<Fingerprint>,
    filename_fingerprint: Option<String>,
}

impl Asset {
    /// Create an asset programmatically. Leading slashes are dropped from `path`.
    pub fn new(namespace: &str, path: &str) -> Self {
        let path = path.trim_start_matches('/').to_string();
        let file_type = file_type_of(&path);
        Self {
            namespace: namespace.to_string(),
            path,
            file_type,
            fingerprint: None,
            filename_fingerprint: None,
        }
    }

    /// Parse a logical reference such as `@bundles/app/app.css`.
    pub fn parse(reference: &str) -> Result<Self> {
        let malformed = || CairnError::MalformedReference(reference.to_string());

        let rest = reference.strip_prefix('@').ok_or_else(malformed)?;
        let (namespace, path) = rest.split_once('/').ok_or_else(malformed)?;
        if !is_valid_namespace(namespace) {
            return Err(malformed());
        }

        if has_parent_segment(path) {
            return Err(CairnError::PathTraversal(reference.to_string()));
        }
        let path = path
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect::<Vec<_>>()
            .join("/");
        if path.is_empty() {
            return Err(CairnError::EmptyPath(reference.to_string()));
        }

        Ok(Self::new(namespace, &path))
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Path relative to the namespace root, without leading slash
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Lowercased extension, empty if the file has none
    pub fn file_type(&self) -> &str {
        &self.file_type
    }

    pub fn fingerprint(&self) -> Option<&Fingerprint> {
        self.fingerprint.as_ref()
    }

    /// The short fingerprint embedded in the published file name, if any
    pub fn filename_fingerprint(&self) -> Option<&str> {
        self.filename_fingerprint.as_deref()
    }

    pub fn is_resolved(&self) -> bool {
        self.fingerprint.is_some()
    }

    pub fn key(&self) -> AssetKey {
        AssetKey {
            namespace: self.namespace.clone(),
            path: self.path.clone(),
        }
    }

    /// The logical reference string, `@namespace/path`
    pub fn reference(&self) -> String {
        format!("@{}/{}", self.namespace, self.path)
    }

    /// Fails with `PathTraversal` if the path holds a `..` segment, which only
    /// programmatically built assets can.
    pub(crate) fn ensure_contained(&self) -> Result<()> {
        if has_parent_segment(&self.path) {
            return Err(CairnError::PathTraversal(self.reference()));
        }
        Ok(())
    }

    /// Attach the content fingerprint. Re-attaching replaces the previous one.
    pub fn attach_fingerprint(&mut self, fingerprint: Fingerprint, include_in_filename: bool) {
        self.filename_fingerprint = include_in_filename.then(|| fingerprint.filename_token());
        self.fingerprint = Some(fingerprint);
    }

    /// Consuming variant of [`Asset::attach_fingerprint`]
    pub fn with_fingerprint(mut self, fingerprint: Fingerprint, include_in_filename: bool) -> Self {
        self.attach_fingerprint(fingerprint, include_in_filename);
        self
    }

    /// Path of the published file relative to the namespace's output directory.
    ///
    /// `css/app.css` becomes `css/app.<fingerprint>.css` when a filename
    /// fingerprint is attached, and stays `css/app.css` otherwise.
    pub fn published_file_name(&self) -> String {
        let (dir, file_name) = match self.path.rsplit_once('/') {
            Some((dir, file_name)) => (format!("{}/", dir), file_name),
            None => (String::new(), self.path.as_str()),
        };

        let base = if self.file_type.is_empty() {
            file_name
        } else {
            // file_type is the lowercased extension, so strip by length
            &file_name[..file_name.len() - self.file_type.len() - 1]
        };

        let mut published = format!("{}{}", dir, base);
        if let Some(token) = &self.filename_fingerprint {
            published.push('.');
            published.push_str(token);
        }
        if !self.file_type.is_empty() {
            published.push('.');
            published.push_str(&self.file_type);
        }
        published
    }

    /// Resolve `relative` against the directory of this asset, staying in
    /// the same namespace. A CSS file at `css/app.css` referencing
    /// `../img/logo.svg` yields `img/logo.svg`.
    ///
    /// Fails with `PathTraversal` if the result would leave the namespace root.
    pub fn with_relative(&self, relative: &str) -> Result<Self> {
        let mut segments: Vec<&str> = if relative.starts_with('/') {
            Vec::new()
        } else {
            match self.path.rsplit_once('/') {
                Some((dir, _)) => dir.split('/').collect(),
                None => Vec::new(),
            }
        };

        for segment in relative.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(CairnError::PathTraversal(format!(
                            "{} -> {}",
                            self.reference(),
                            relative
                        )));
                    }
                }
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            return Err(CairnError::EmptyPath(format!(
                "{} -> {}",
                self.reference(),
                relative
            )));
        }

        Ok(Self::new(&self.namespace, &segments.join("/")))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}/{}", self.namespace, self.path)
    }
}

fn file_type_of(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let asset = Asset::parse("@bundles/test/css/app.css").unwrap();
        assert_eq!(asset.namespace(), "bundles");
        assert_eq!(asset.path(), "test/css/app.css");
        assert_eq!(asset.file_type(), "css");
        assert!(!asset.is_resolved());
    }

    #[test]
    fn test_parse_trims_slashes() {
        let asset = Asset::parse("@ns//a/b.js/").unwrap();
        assert_eq!(asset.path(), "a/b.js");

        let asset = Asset::parse("@ns/./a/./b.js").unwrap();
        assert_eq!(asset.path(), "a/b.js");
    }

    #[test]
    fn test_parse_keeps_namespace_case() {
        let asset = Asset::parse("@Bundles/app.js").unwrap();
        assert_eq!(asset.namespace(), "Bundles");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Asset::parse("@Bad-Namespace/x"),
            Err(CairnError::MalformedReference(_))
        ));
        assert!(matches!(
            Asset::parse("bundles/x.css"),
            Err(CairnError::MalformedReference(_))
        ));
        assert!(matches!(
            Asset::parse("@1ns/x.css"),
            Err(CairnError::MalformedReference(_))
        ));
        assert!(matches!(
            Asset::parse("@ns"),
            Err(CairnError::MalformedReference(_))
        ));
        assert!(matches!(
            Asset::parse("@ns/../x"),
            Err(CairnError::PathTraversal(_))
        ));
        assert!(matches!(
            Asset::parse("@ns/a/b/../../c"),
            Err(CairnError::PathTraversal(_))
        ));
        assert!(matches!(Asset::parse("@ns/"), Err(CairnError::EmptyPath(_))));
        assert!(matches!(Asset::parse("@ns///"), Err(CairnError::EmptyPath(_))));
        assert!(matches!(Asset::parse("@ns/./"), Err(CairnError::EmptyPath(_))));
    }

    #[test]
    fn test_dots_inside_names_are_not_traversal() {
        let asset = Asset::parse("@ns/vendor/jquery..min.js").unwrap();
        assert_eq!(asset.file_type(), "js");
    }

    #[test]
    fn test_file_type() {
        assert_eq!(Asset::new("ns", "a/b.CSS").file_type(), "css");
        assert_eq!(Asset::new("ns", "a/b.min.js").file_type(), "js");
        assert_eq!(Asset::new("ns", "a/LICENSE").file_type(), "");
        assert_eq!(Asset::new("ns", "a.dir/LICENSE").file_type(), "");
    }

    #[test]
    fn test_published_file_name_without_fingerprint() {
        let asset = Asset::new("ns", "test/js/test.js");
        assert_eq!(asset.published_file_name(), "test/js/test.js");

        let asset = Asset::new("ns", "test.js")
            .with_fingerprint(Fingerprint::from_bytes(b""), false);
        assert_eq!(asset.published_file_name(), "test.js");
        assert!(asset.fingerprint().is_some());
        assert!(asset.filename_fingerprint().is_none());
    }

    #[test]
    fn test_published_file_name_with_fingerprint() {
        let asset = Asset::new("ns", "test/css/App.CSS")
            .with_fingerprint(Fingerprint::from_bytes(b""), true);
        assert_eq!(
            asset.published_file_name(),
            "test/css/App.47DEQpj8HBSa+_TImW+5.css"
        );
    }

    #[test]
    fn test_published_file_name_without_extension() {
        let asset = Asset::new("ns", "docs/LICENSE")
            .with_fingerprint(Fingerprint::from_bytes(b""), true);
        assert_eq!(asset.published_file_name(), "docs/LICENSE.47DEQpj8HBSa+_TImW+5");
    }

    #[test]
    fn test_published_file_name_never_escapes() {
        let refs = [
            "@a/x.css",
            "@a/deep/nested/dir/file.min.js",
            "@a/.hidden",
            "@a/./x/./y.svg",
            "@a/noext",
        ];
        for reference in refs {
            let asset = Asset::parse(reference)
                .unwrap()
                .with_fingerprint(Fingerprint::from_bytes(reference.as_bytes()), true);
            let published = asset.published_file_name();
            assert!(!published.starts_with('/'), "{}", published);
            assert!(!published.split('/').any(|s| s == ".."), "{}", published);
        }
    }

    #[test]
    fn test_fingerprint_not_part_of_identity() {
        let plain = Asset::new("ns", "a.css");
        let hashed = plain.clone().with_fingerprint(Fingerprint::from_bytes(b"x"), true);
        assert_eq!(plain.key(), hashed.key());
    }

    #[test]
    fn test_with_relative() {
        let css = Asset::new("bundles", "test/css/app.css");
        let img = css.with_relative("../img/logo.svg").unwrap();
        assert_eq!(img.namespace(), "bundles");
        assert_eq!(img.path(), "test/img/logo.svg");

        let sibling = css.with_relative("./print.css").unwrap();
        assert_eq!(sibling.path(), "test/css/print.css");

        let rooted = css.with_relative("/fonts/a.woff2").unwrap();
        assert_eq!(rooted.path(), "fonts/a.woff2");
    }

    #[test]
    fn test_with_relative_rejects_escape() {
        let css = Asset::new("bundles", "test/app.css");
        assert!(css.with_relative("../x.css").is_ok());
        assert!(matches!(
            css.with_relative("../../x.css"),
            Err(CairnError::PathTraversal(_))
        ));
        assert!(matches!(css.with_relative(".."), Err(CairnError::EmptyPath(_))));
    }

    #[test]
    fn test_namespace_grammar() {
        assert!(is_valid_namespace("bundles"));
        assert!(is_valid_namespace("a_1"));
        assert!(is_valid_namespace("Other"));
        assert!(!is_valid_namespace(""));
        assert!(!is_valid_namespace("_a"));
        assert!(!is_valid_namespace("a-b"));
    }
}
