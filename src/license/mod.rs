//! License discovery and identification
//!
//! - [`matcher`] guesses a [`LicenseKind`] from raw text.
//! - [`locator`] finds a license file inside a directory.
//! - [`LicenseResolver`] combines the two.

pub mod locator;
pub mod matcher;

pub use locator::{LicenseFileLocator, DEFAULT_LICENSE_FILES};
pub use matcher::{classify_text, LicenseKind};

use crate::error::LicenseError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A license whose type has been identified
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct License {
    kind: LicenseKind,
    text: String,
    source: Option<PathBuf>,
}

impl License {
    /// Build a license from an explicit type and text, not backed by a file
    pub fn new(kind: LicenseKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            source: None,
        }
    }

    pub fn kind(&self) -> LicenseKind {
        self.kind
    }

    /// Canonical identifier, e.g. `"MIT"`
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// File the license was read from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

/// Reads and identifies licenses
#[derive(Debug, Clone, Default)]
pub struct LicenseResolver {
    locator: LicenseFileLocator,
}

impl LicenseResolver {
    pub fn new(locator: LicenseFileLocator) -> Self {
        Self { locator }
    }

    pub fn locator(&self) -> &LicenseFileLocator {
        &self.locator
    }

    /// Find the license file in `dir` and identify it
    pub fn resolve_dir(&self, dir: &Path) -> Result<License, LicenseError> {
        let path = self.locator.find(dir)?;
        self.resolve_file(&path)
    }

    /// Read `path` and identify the license it contains
    pub fn resolve_file(&self, path: &Path) -> Result<License, LicenseError> {
        let bytes = std::fs::read(path).map_err(|source| LicenseError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes).into_owned();

        match classify_text(&text) {
            Some(kind) => {
                debug!("{} identified as {}", path.display(), kind);
                Ok(License {
                    kind,
                    text,
                    source: Some(path.to_path_buf()),
                })
            }
            None => Err(LicenseError::UnrecognizedLicense {
                path: Some(path.to_path_buf()),
                text,
            }),
        }
    }

    /// Identify license text that is already in memory
    pub fn resolve_text(&self, text: &str) -> Result<License, LicenseError> {
        classify_text(text)
            .map(|kind| License::new(kind, text))
            .ok_or_else(|| LicenseError::UnrecognizedLicense {
                path: None,
                text: text.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_new_license() {
        let license = License::new(LicenseKind::Mit, "Some license text.");
        assert_eq!(license.name(), "MIT");
        assert_eq!(license.text(), "Some license text.");
        assert!(license.source().is_none());
    }

    #[test]
    fn test_resolve_dir() {
        let dir = TempDir::new().unwrap();
        let resolver = LicenseResolver::default();

        assert!(matches!(
            resolver.resolve_dir(dir.path()),
            Err(LicenseError::NoLicenseFile { .. })
        ));

        let path = dir.path().join("LICENSE");
        fs::write(&path, "The MIT License (MIT)").unwrap();

        let license = resolver.resolve_dir(dir.path()).unwrap();
        assert_eq!(license.kind(), LicenseKind::Mit);
        assert_eq!(license.text(), "The MIT License (MIT)");
        assert_eq!(license.source(), Some(path.as_path()));
    }

    #[test]
    fn test_unrecognized_file_keeps_text() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("COPYING"), "No license data").unwrap();

        match LicenseResolver::default().resolve_dir(dir.path()) {
            Err(LicenseError::UnrecognizedLicense { path, text }) => {
                assert_eq!(path, Some(dir.path().join("COPYING")));
                assert_eq!(text, "No license data");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_unreadable_license_file() {
        let dir = TempDir::new().unwrap();
        // A directory named LICENSE is located but cannot be read as a file
        fs::create_dir(dir.path().join("LICENSE")).unwrap();

        assert!(matches!(
            LicenseResolver::default().resolve_dir(dir.path()),
            Err(LicenseError::Read { .. })
        ));
    }

    #[test]
    fn test_resolve_text() {
        let resolver = LicenseResolver::default();

        let license = resolver
            .resolve_text("Eclipse Public License - v 1.0")
            .unwrap();
        assert_eq!(license.kind(), LicenseKind::Epl10);
        assert!(license.source().is_none());

        assert!(resolver.resolve_text("hello").is_err());
    }
}
