//! # gopath_license_audit
//!
//! Audits the licenses of a Go project's third-party dependencies:
//! - **Discovery**: list every non-standard package the project imports,
//!   including packages only its tests import, or read them from a manifest
//! - **Location**: map each import path onto a `$GOPATH/src` directory
//! - **Identification**: find the license file, falling back to parent
//!   directories, and guess its type from the text
//! - **Policy**: classify each license against a whitelist, blacklist and
//!   per-package exceptions
//!
//! ## Quick Start
//!
//! ```no_run
//! use gopath_license_audit::{audit_project, load_policy, AuditConfig, ListerKind};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let project = Path::new(".");
//! let config = AuditConfig::builder()
//!     .policy(load_policy(project, None)?)
//!     .build();
//! let lister = ListerKind::Query {
//!     project_dir: project.to_path_buf(),
//!     go_program: "go".into(),
//! }
//! .build();
//!
//! let report = audit_project(project, lister.as_ref(), &config)?;
//! for dep in &report.dependencies {
//!     println!("{}: {} ({})", dep.import_path, dep.license, dep.verdict);
//! }
//! # Ok(())
//! # }
//! ```

mod audit;
mod classifier;
mod config;
mod error;
mod gopath;
pub mod license;
pub mod lister;
pub mod metadata;
mod types;

// Re-export public API
pub use audit::{audit_dependencies, audit_project};
pub use classifier::{Classification, LicenseClassifier, ERROR_LICENSE, UNKNOWN_LICENSE};
pub use config::{
    discover_policy, load_policy, AuditConfig, AuditConfigBuilder, PolicyConfig,
    DEFAULT_MAX_PARENT_HOPS, POLICY_FILE_NAMES,
};
pub use error::{AuditError, LicenseError, Result};
pub use gopath::{GopathIndex, GOPATH_ENV};
pub use license::{License, LicenseKind, LicenseResolver};
pub use lister::{DependencyLister, InputSource, ListerKind};
pub use types::{AuditReport, AuditSummary, DependencyReport, Verdict};
