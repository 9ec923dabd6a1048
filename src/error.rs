//! Error types for the audit system

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Failures that abort the whole run
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("GOPATH not set: no root directories configured")]
    NoRoots,

    #[error("could not find package {import_path} in GOPATH")]
    PackageNotFound { import_path: String },

    #[error("failed to read dependency manifest {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("package metadata query failed: {0}")]
    MetadataCommand(String),

    #[error("{} package(s) failed to load: {}", packages.len(), format_failures(packages))]
    PackageLoad { packages: Vec<(String, String)> },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml_ng::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Failures while resolving the license of a single directory.
///
/// `NoLicenseFile` and `UnrecognizedLicense` are expected outcomes that the
/// classifier folds into a verdict; `Read` means a license file was found but
/// could not be read.
#[derive(Error, Debug)]
pub enum LicenseError {
    #[error("license: unable to find any license file in {}", dir.display())]
    NoLicenseFile { dir: PathBuf },

    #[error("license: could not guess license type")]
    UnrecognizedLicense {
        path: Option<PathBuf>,
        text: String,
    },

    #[error("license: failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_failures(packages: &[(String, String)]) -> String {
    packages
        .iter()
        .map(|(import_path, err)| format!("{import_path} ({err})"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl AuditError {
    /// Create a manifest error
    pub fn manifest(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a metadata command error
    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::MetadataCommand(msg.into())
    }
}
