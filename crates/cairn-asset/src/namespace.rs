//! Namespace to directory mapping

use crate::asset::{is_valid_namespace, Asset};
use cairn_core::{CairnError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Marker that may never appear in a configured entry path
const RESERVED_MARKER: &str = "...";

/// Lexically normalize a path, resolving `.` and `..` without touching the
/// filesystem.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Registry of asset namespaces and their root directories.
///
/// Filled once at startup, read-only afterwards.
#[derive(Debug, Clone)]
pub struct NamespaceRegistry {
    project_dir: PathBuf,
    entries: BTreeMap<String, PathBuf>,
}

impl NamespaceRegistry {
    /// Create an empty registry. Entry roots must stay inside `project_dir`.
    pub fn new<P: AsRef<Path>>(project_dir: P) -> Self {
        Self {
            project_dir: normalize_path(project_dir.as_ref()),
            entries: BTreeMap::new(),
        }
    }

    /// Create a registry from `(namespace, root)` pairs
    pub fn with_entries<P, I, S, R>(project_dir: P, entries: I) -> Result<Self>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = (S, R)>,
        S: AsRef<str>,
        R: AsRef<Path>,
    {
        let mut registry = Self::new(project_dir);
        for (namespace, root) in entries {
            registry.register(namespace.as_ref(), root)?;
        }
        Ok(registry)
    }

    /// Register a namespace. Relative roots are taken from the project dir.
    pub fn register<R: AsRef<Path>>(&mut self, namespace: &str, root: R) -> Result<()> {
        let root = root.as_ref();

        if !is_valid_namespace(namespace) {
            return Err(CairnError::ConfigError(format!(
                "Invalid namespace '{}': must start with a-z and only contain a-z, 0-9 and _",
                namespace
            )));
        }
        if root.to_string_lossy().contains(RESERVED_MARKER) {
            return Err(CairnError::ConfigError(format!(
                "Entry '{}' must not contain '{}': {}",
                namespace,
                RESERVED_MARKER,
                root.display()
            )));
        }

        let resolved = normalize_path(&self.project_dir.join(root));
        if !resolved.starts_with(&self.project_dir) {
            return Err(CairnError::ConfigError(format!(
                "Entry '{}' points outside of the project dir: {}",
                namespace,
                root.display()
            )));
        }

        if self.entries.contains_key(namespace) {
            return Err(CairnError::ConfigError(format!(
                "Namespace '{}' is registered twice",
                namespace
            )));
        }

        self.entries.insert(namespace.to_string(), resolved);
        Ok(())
    }

    /// Absolute source path of an asset
    pub fn resolve(&self, asset: &Asset) -> Result<PathBuf> {
        let root = self.root(asset.namespace()).ok_or_else(|| CairnError::NamespaceNotFound {
            namespace: asset.namespace().to_string(),
            reference: asset.reference(),
        })?;
        asset.ensure_contained()?;
        Ok(root.join(asset.path()))
    }

    /// Root directory of a namespace
    pub fn root(&self, namespace: &str) -> Option<&Path> {
        self.entries.get(namespace).map(PathBuf::as_path)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every regular file below a namespace root, as sorted assets
    pub fn list_assets(&self, namespace: &str) -> Result<Vec<Asset>> {
        let root = self.root(namespace).ok_or_else(|| CairnError::NamespaceNotFound {
            namespace: namespace.to_string(),
            reference: format!("@{}", namespace),
        })?;

        let mut paths = Vec::new();
        Self::scan_directory(root, root, &mut paths)?;
        paths.sort();

        Ok(paths
            .into_iter()
            .map(|path| Asset::new(namespace, &path))
            .collect())
    }

    /// Every asset of every namespace
    pub fn all_assets(&self) -> Result<Vec<Asset>> {
        let mut assets = Vec::new();
        for namespace in self.namespaces() {
            assets.extend(self.list_assets(namespace)?);
        }
        Ok(assets)
    }

    fn scan_directory(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<()> {
        if !dir.exists() {
            return Ok(());
        }

        let unreadable = |source: std::io::Error| CairnError::SourceFileUnreadable {
            reference: dir.display().to_string(),
            path: dir.to_path_buf(),
            source,
        };

        for entry in fs::read_dir(dir).map_err(unreadable)? {
            let entry = entry.map_err(unreadable)?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(unreadable)?;

            // only real directories are descended into; a symlink counts
            // when it points at a file
            let is_file = if file_type.is_dir() {
                Self::scan_directory(root, &path, out)?;
                false
            } else if file_type.is_symlink() {
                fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false)
            } else {
                file_type.is_file()
            };

            if is_file {
                let relative = match path.strip_prefix(root) {
                    Ok(relative) => relative,
                    Err(_) => continue,
                };
                let segments: Option<Vec<&str>> =
                    relative.components().map(|c| c.as_os_str().to_str()).collect();
                if let Some(segments) = segments {
                    out.push(segments.join("/"));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures_dir;

    fn registry() -> NamespaceRegistry {
        NamespaceRegistry::with_entries(
            fixtures_dir(),
            [("bundles", "bundles"), ("other", "other")],
        )
        .unwrap()
    }

    #[test]
    fn test_resolve() {
        let registry = registry();
        let asset = Asset::parse("@bundles/test/css/app.css").unwrap();
        let path = registry.resolve(&asset).unwrap();
        assert_eq!(path, fixtures_dir().join("bundles/test/css/app.css"));
        assert!(path.starts_with(registry.root("bundles").unwrap()));
    }

    #[test]
    fn test_resolve_unknown_namespace() {
        let registry = registry();
        let asset = Asset::parse("@vendor/app.js").unwrap();
        assert!(matches!(
            registry.resolve(&asset),
            Err(CairnError::NamespaceNotFound { .. })
        ));

        // lookup is case sensitive
        let asset = Asset::parse("@Bundles/test/js/test.js").unwrap();
        assert!(registry.resolve(&asset).is_err());
    }

    #[test]
    fn test_resolve_rejects_programmatic_traversal() {
        let registry = registry();
        let asset = Asset::new("bundles", "../other/test/css/app2.css");
        assert!(matches!(
            registry.resolve(&asset),
            Err(CairnError::PathTraversal(_))
        ));
    }

    #[test]
    fn test_register_validation() {
        let mut registry = NamespaceRegistry::new("/srv/project");
        assert!(registry.register("app", "assets/app").is_ok());
        assert!(registry.register("Admin_2", "assets/admin").is_ok());
        assert!(registry.register("app", "assets/other").is_err());
        assert!(registry.register("bad-name", "assets").is_err());
        assert!(registry.register("dots", "assets/.../x").is_err());
        assert!(registry.register("escape", "../outside").is_err());
        assert!(registry.register("abs", "/etc").is_err());
        assert!(registry.register("inner", "a/../b").is_ok());
        assert_eq!(registry.root("inner"), Some(Path::new("/srv/project/b")));
    }

    #[test]
    fn test_list_assets() {
        let registry = registry();
        let assets = registry.list_assets("bundles").unwrap();
        let paths: Vec<&str> = assets.iter().map(|a| a.path()).collect();
        assert_eq!(
            paths,
            vec!["test/css/app.css", "test/img/logo.svg", "test/js/test.js"]
        );

        let all = registry.all_assets().unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.iter().any(|a| a.reference() == "@other/test/css/app2.css"));
    }

    #[cfg(unix)]
    #[test]
    fn test_list_assets_skips_directory_symlinks() {
        use std::os::unix::fs::symlink;

        let project = crate::test_support::temp_dir();
        let root = project.join("app");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("a.css"), "a {}").unwrap();
        symlink(&root, root.join("sub/loop")).unwrap();
        symlink(root.join("a.css"), root.join("sub/b.css")).unwrap();
        symlink(root.join("gone.css"), root.join("dangling.css")).unwrap();

        let registry = NamespaceRegistry::with_entries(&project, [("app", "app")]).unwrap();
        let assets = registry.list_assets("app").unwrap();
        let paths: Vec<&str> = assets.iter().map(|a| a.path()).collect();
        assert_eq!(paths, vec!["a.css", "sub/b.css"]);

        fs::remove_dir_all(&project).ok();
    }
}
