//! Core data types for license audit reporting

use chrono::{DateTime, Utc};
use colored::Color;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete audit report for a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    /// Path to the audited project
    pub project_path: String,
    /// Timestamp when audit was performed
    pub timestamp: DateTime<Utc>,
    /// Whether a license policy was in force
    pub policy_applied: bool,
    /// One entry per dependency, in listing order
    pub dependencies: Vec<DependencyReport>,
    /// Summary statistics
    pub summary: AuditSummary,
}

/// Summary statistics for an audit report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total_dependencies: usize,
    pub allowed: usize,
    pub banned: usize,
    pub marginal: usize,
    pub unknown: usize,
    pub no_license: usize,
    /// Dependencies whose license file could not be read
    pub errors: usize,
    /// Dependencies whose verdict fails the run
    pub failing: usize,
}

/// Outcome for a single dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyReport {
    pub import_path: String,
    /// Directory the dependency was resolved to
    pub directory: PathBuf,
    /// License identifier, `"Unknown"` when undetermined or `"Error"` when unreadable
    pub license: String,
    /// File the license was read from
    pub license_file: Option<PathBuf>,
    pub verdict: Verdict,
    /// Set when the license could not be determined because of an I/O failure
    pub error: Option<String>,
    pub fails_build: bool,
}

/// Policy classification of a dependency's license
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// License file present but its type could not be determined
    Unknown,
    /// No license file found
    NoLicense,
    /// License is on the blacklist
    Banned,
    /// License is whitelisted, or the dependency is an exception
    Allowed,
    /// Recognized license that the policy neither allows nor denies
    Marginal,
}

impl Verdict {
    pub fn color(&self) -> Color {
        match self {
            Self::Unknown => Color::Magenta,
            Self::NoLicense => Color::Cyan,
            Self::Allowed => Color::Green,
            Self::Banned => Color::Red,
            Self::Marginal => Color::Yellow,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::NoLicense => "NO LICENSE",
            Self::Allowed => "CHECKS OUT",
            Self::Banned => "CONTRABAND",
            Self::Marginal => "BORDERLINE",
        }
    }

    pub fn fails_build(&self) -> bool {
        !matches!(self, Self::Allowed)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "Unknown"),
            Self::NoLicense => write!(f, "No license"),
            Self::Banned => write!(f, "Banned"),
            Self::Allowed => write!(f, "Allowed"),
            Self::Marginal => write!(f, "Marginal"),
        }
    }
}

impl AuditReport {
    /// Create a new audit report
    pub fn new(project_path: String, policy_applied: bool) -> Self {
        Self {
            project_path,
            timestamp: Utc::now(),
            policy_applied,
            dependencies: Vec::new(),
            summary: AuditSummary::default(),
        }
    }

    /// True when no dependency fails the run and every license could be read
    pub fn passed(&self) -> bool {
        self.summary.failing == 0 && self.summary.errors == 0
    }

    /// Compute summary statistics from dependencies
    pub fn compute_summary(&mut self) {
        let mut summary = AuditSummary {
            total_dependencies: self.dependencies.len(),
            ..AuditSummary::default()
        };

        for dep in &self.dependencies {
            match dep.verdict {
                Verdict::Allowed => summary.allowed += 1,
                Verdict::Banned => summary.banned += 1,
                Verdict::Marginal => summary.marginal += 1,
                Verdict::Unknown => summary.unknown += 1,
                Verdict::NoLicense => summary.no_license += 1,
            }

            if dep.error.is_some() {
                summary.errors += 1;
            }

            if dep.fails_build {
                summary.failing += 1;
            }
        }

        self.summary = summary;
    }
}
