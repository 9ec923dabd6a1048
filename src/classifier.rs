//! License lookup with parent-directory fallback and policy classification

use crate::config::{PolicyConfig, DEFAULT_MAX_PARENT_HOPS};
use crate::error::LicenseError;
use crate::gopath::GopathIndex;
use crate::license::{License, LicenseResolver};
use crate::types::Verdict;
use std::path::{Path, PathBuf};
use tracing::{debug, error, trace};

/// License name reported when none could be determined
pub const UNKNOWN_LICENSE: &str = "Unknown";
/// License name reported when the license file could not be read
pub const ERROR_LICENSE: &str = "Error";

/// Result of classifying one dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub verdict: Verdict,
    /// File the license was read from
    pub license_file: Option<PathBuf>,
    /// License identifier, or [`UNKNOWN_LICENSE`] / [`ERROR_LICENSE`]
    pub license: String,
    /// I/O failure that prevented classification
    pub error: Option<String>,
}

impl Classification {
    fn new(verdict: Verdict, license: impl Into<String>, license_file: Option<PathBuf>) -> Self {
        Self {
            verdict,
            license_file,
            license: license.into(),
            error: None,
        }
    }
}

/// Applies a [`PolicyConfig`] to the license found for a dependency
#[derive(Debug, Clone)]
pub struct LicenseClassifier {
    policy: PolicyConfig,
    resolver: LicenseResolver,
    gopath: GopathIndex,
    max_parent_hops: usize,
}

impl LicenseClassifier {
    pub fn new(policy: PolicyConfig, resolver: LicenseResolver, gopath: GopathIndex) -> Self {
        Self {
            policy,
            resolver,
            gopath,
            max_parent_hops: DEFAULT_MAX_PARENT_HOPS,
        }
    }

    pub fn max_parent_hops(mut self, hops: usize) -> Self {
        self.max_parent_hops = hops;
        self
    }

    /// Search `dir` and then its parents for a license.
    ///
    /// The search gives up after `max_parent_hops` directories and never
    /// enters a GOPATH root, so a license belonging to another project is
    /// never picked up.
    pub fn find_license(&self, dir: &Path) -> Result<License, LicenseError> {
        let mut candidate = Some(dir);

        for _ in 0..self.max_parent_hops {
            let Some(current) = candidate else {
                break;
            };
            if self.gopath.is_root(current) {
                trace!("Reached GOPATH root at {}", current.display());
                break;
            }

            match self.resolver.resolve_dir(current) {
                Err(LicenseError::NoLicenseFile { .. }) => {
                    trace!("No license file in {}", current.display());
                }
                other => return other,
            }

            candidate = current.parent();
        }

        Err(LicenseError::NoLicenseFile {
            dir: dir.to_path_buf(),
        })
    }

    /// Classify the dependency `import_path` whose source lives in `dir`
    pub fn classify(&self, dir: &Path, import_path: &str) -> Classification {
        let excepted = self.policy.is_exception(import_path);

        match self.find_license(dir) {
            Ok(license) => self.apply_policy(&license, import_path),
            Err(LicenseError::NoLicenseFile { .. }) => {
                debug!("{}: no license file", import_path);
                let verdict = if excepted {
                    Verdict::Allowed
                } else {
                    Verdict::NoLicense
                };
                Classification::new(verdict, UNKNOWN_LICENSE, None)
            }
            Err(LicenseError::UnrecognizedLicense { path, .. }) => {
                debug!("{}: could not guess license type", import_path);
                let verdict = if excepted {
                    Verdict::Allowed
                } else {
                    Verdict::Unknown
                };
                Classification::new(verdict, UNKNOWN_LICENSE, path)
            }
            Err(err) => {
                error!("Could not determine license for {}: {}", import_path, err);
                Classification {
                    error: Some(err.to_string()),
                    ..Classification::new(Verdict::Unknown, ERROR_LICENSE, None)
                }
            }
        }
    }

    fn apply_policy(&self, license: &License, import_path: &str) -> Classification {
        let name = license.name();

        let verdict = if self.policy.is_blacklisted(name) {
            Verdict::Banned
        } else if self.policy.is_whitelisted(name) {
            Verdict::Allowed
        } else if self.policy.is_exception(import_path) {
            Verdict::Allowed
        } else {
            Verdict::Marginal
        };
        debug!("{}: {} -> {}", import_path, name, verdict);

        Classification::new(verdict, name, license.source().map(Path::to_path_buf))
    }
}
