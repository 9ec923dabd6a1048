//! Mapping import paths onto GOPATH source directories

use crate::error::{AuditError, Result};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable holding the root directories
pub const GOPATH_ENV: &str = "GOPATH";

/// Ordered set of GOPATH roots, each expected to contain `src/<import path>`
#[derive(Debug, Clone)]
pub struct GopathIndex {
    roots: Vec<PathBuf>,
    /// Roots and their `src` directories; ancestor searches stop here.
    boundaries: HashSet<PathBuf>,
}

impl GopathIndex {
    pub fn new(roots: Vec<PathBuf>) -> Result<Self> {
        if roots.is_empty() {
            return Err(AuditError::NoRoots);
        }

        let boundaries = roots
            .iter()
            .flat_map(|root| [root.clone(), root.join("src")])
            .collect();

        Ok(Self { roots, boundaries })
    }

    /// Parse a platform path list such as `/a:/b`.
    ///
    /// An empty element stands for the current directory.
    pub fn from_path_list(value: &OsStr) -> Result<Self> {
        if value.is_empty() {
            return Err(AuditError::NoRoots);
        }

        let roots = std::env::split_paths(value)
            .map(|dir| {
                if dir.as_os_str().is_empty() {
                    PathBuf::from(".")
                } else {
                    dir
                }
            })
            .collect();

        Self::new(roots)
    }

    /// Read the roots from `$GOPATH`
    pub fn from_env() -> Result<Self> {
        let value = std::env::var_os(GOPATH_ENV).ok_or(AuditError::NoRoots)?;
        Self::from_path_list(&value)
    }

    /// Roots in configured order
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Source directory of `import_path` under the first root that has it
    pub fn resolve(&self, import_path: &str) -> Result<PathBuf> {
        self.locate(import_path)
            .map(|(_, dir)| dir)
            .ok_or_else(|| AuditError::PackageNotFound {
                import_path: import_path.to_string(),
            })
    }

    /// The root whose `src` tree contains `import_path`
    pub fn containing_root(&self, import_path: &str) -> Result<&Path> {
        self.locate(import_path)
            .map(|(root, _)| root)
            .ok_or_else(|| AuditError::PackageNotFound {
                import_path: import_path.to_string(),
            })
    }

    /// Whether `dir` is a root or a root's `src` directory
    pub fn is_root(&self, dir: &Path) -> bool {
        self.boundaries.contains(dir)
    }

    fn locate(&self, import_path: &str) -> Option<(&Path, PathBuf)> {
        self.roots.iter().find_map(|root| {
            let dir = root.join("src").join(import_path);
            if dir.is_dir() {
                debug!("Resolved {} to {}", import_path, dir.display());
                Some((root.as_path(), dir))
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_no_roots() {
        assert!(matches!(GopathIndex::new(vec![]), Err(AuditError::NoRoots)));
        assert!(matches!(
            GopathIndex::from_path_list(OsStr::new("")),
            Err(AuditError::NoRoots)
        ));
    }

    #[test]
    fn test_resolve_searches_roots_in_order() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        fs::create_dir_all(second.path().join("src/org/pkg")).unwrap();
        fs::create_dir_all(first.path().join("src/org/shared")).unwrap();
        fs::create_dir_all(second.path().join("src/org/shared")).unwrap();

        let index =
            GopathIndex::new(vec![first.path().to_path_buf(), second.path().to_path_buf()])
                .unwrap();

        assert_eq!(
            index.resolve("org/pkg").unwrap(),
            second.path().join("src/org/pkg")
        );
        assert_eq!(
            index.resolve("org/shared").unwrap(),
            first.path().join("src/org/shared")
        );
        assert_eq!(index.containing_root("org/pkg").unwrap(), second.path());
        assert!(matches!(
            index.resolve("org/missing"),
            Err(AuditError::PackageNotFound { .. })
        ));
    }

    #[test]
    fn test_files_are_not_packages() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("src/org")).unwrap();
        fs::write(root.path().join("src/org/file"), "").unwrap();

        let index = GopathIndex::new(vec![root.path().to_path_buf()]).unwrap();
        assert!(index.resolve("org/file").is_err());
    }

    #[test]
    fn test_path_list() {
        let list = std::env::join_paths(["/one", "/two"]).unwrap();
        let index = GopathIndex::from_path_list(&list).unwrap();

        assert_eq!(
            index.roots(),
            &[PathBuf::from("/one"), PathBuf::from("/two")]
        );
        assert!(index.is_root(Path::new("/one")));
        assert!(index.is_root(Path::new("/two/src")));
        assert!(!index.is_root(Path::new("/two/src/org")));
    }
}
