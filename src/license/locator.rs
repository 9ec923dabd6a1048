//! Finding a license file inside a directory

use crate::error::LicenseError;
use std::path::{Path, PathBuf};
use tracing::trace;

/// File names searched for, in order, when looking for a license
pub const DEFAULT_LICENSE_FILES: &[&str] = &[
    "LICENSE",
    "LICENSE.txt",
    "LICENSE.md",
    "license.txt",
    "COPYING",
    "COPYING.txt",
    "COPYING.md",
    "copying.txt",
    "MIT.LICENSE",
];

/// Looks for well-known license file names in a single directory (non-recursive)
#[derive(Debug, Clone)]
pub struct LicenseFileLocator {
    file_names: Vec<String>,
}

impl Default for LicenseFileLocator {
    fn default() -> Self {
        Self::new(DEFAULT_LICENSE_FILES.iter().map(|name| name.to_string()))
    }
}

impl LicenseFileLocator {
    pub fn new(file_names: impl IntoIterator<Item = String>) -> Self {
        Self {
            file_names: file_names.into_iter().collect(),
        }
    }

    /// Candidate file names in search order
    pub fn file_names(&self) -> &[String] {
        &self.file_names
    }

    /// Return the first candidate that exists in `dir`.
    ///
    /// A directory that is missing, unreadable, or not a directory at all is
    /// reported the same way as one without a license file.
    pub fn find(&self, dir: &Path) -> Result<PathBuf, LicenseError> {
        let not_found = || LicenseError::NoLicenseFile {
            dir: dir.to_path_buf(),
        };

        match std::fs::metadata(dir) {
            Ok(meta) if meta.is_dir() => {}
            _ => return Err(not_found()),
        }

        for name in &self.file_names {
            let candidate = dir.join(name);
            if candidate.exists() {
                trace!("Found license file {}", candidate.display());
                return Ok(candidate);
            }
        }

        Err(not_found())
    }
}
