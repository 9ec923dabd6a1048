//! Main audit orchestration logic

use crate::classifier::LicenseClassifier;
use crate::config::AuditConfig;
use crate::error::Result;
use crate::gopath::GopathIndex;
use crate::license::{LicenseFileLocator, LicenseResolver};
use crate::lister::DependencyLister;
use crate::types::{AuditReport, DependencyReport};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Audit the project at `project_path`, resolving dependencies through `$GOPATH`
pub fn audit_project(
    project_path: &Path,
    lister: &dyn DependencyLister,
    config: &AuditConfig,
) -> Result<AuditReport> {
    let gopath = GopathIndex::from_env()?;
    audit_dependencies(project_path, lister, &gopath, config)
}

/// List the dependencies, locate each one under `gopath`, and classify its license
pub fn audit_dependencies(
    project_path: &Path,
    lister: &dyn DependencyLister,
    gopath: &GopathIndex,
    config: &AuditConfig,
) -> Result<AuditReport> {
    info!("Starting audit of project at: {}", project_path.display());

    let dependencies = lister.list_dependencies()?;
    info!("Found {} dependencies", dependencies.len());

    let policy_applied = config.policy.is_some();
    let resolver = LicenseResolver::new(LicenseFileLocator::new(config.license_files.clone()));
    let classifier = LicenseClassifier::new(
        config.policy.clone().unwrap_or_default(),
        resolver,
        gopath.clone(),
    )
    .max_parent_hops(config.max_parent_hops);

    let mut report = AuditReport::new(project_path.display().to_string(), policy_applied);
    let mut seen = HashSet::new();

    for import_path in dependencies {
        if !seen.insert(import_path.clone()) {
            warn!("Skipping duplicate dependency: {}", import_path);
            continue;
        }

        let directory = gopath.resolve(&import_path)?;
        debug!("Processing dependency: {} ({})", import_path, directory.display());

        let classification = classifier.classify(&directory, &import_path);
        let fails_build = policy_applied && classification.verdict.fails_build();

        report.dependencies.push(DependencyReport {
            import_path,
            directory,
            license: classification.license,
            license_file: classification.license_file,
            verdict: classification.verdict,
            error: classification.error,
            fails_build,
        });
    }

    report.compute_summary();

    let summary = &report.summary;
    info!(
        "Audit complete: {}/{} allowed, {} banned, {} marginal",
        summary.allowed, summary.total_dependencies, summary.banned, summary.marginal
    );
    info!(
        "{} unknown, {} without license, {} errors",
        summary.unknown, summary.no_license, summary.errors
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolicyConfig;
    use crate::error::AuditError;
    use crate::types::Verdict;
    use std::fs;
    use tempfile::TempDir;

    struct FixedLister(Vec<&'static str>);

    impl DependencyLister for FixedLister {
        fn list_dependencies(&self) -> Result<Vec<String>> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    fn gopath_with(packages: &[(&str, Option<&str>)]) -> (TempDir, GopathIndex) {
        let root = TempDir::new().unwrap();
        for (import_path, license) in packages {
            let dir = root.path().join("src").join(import_path);
            fs::create_dir_all(&dir).unwrap();
            if let Some(text) = license {
                fs::write(dir.join("LICENSE"), text).unwrap();
            }
        }
        let index = GopathIndex::new(vec![root.path().to_path_buf()]).unwrap();
        (root, index)
    }

    fn mit_only() -> AuditConfig {
        AuditConfig::builder()
            .policy(Some(PolicyConfig {
                whitelist: ["MIT".to_string()].into(),
                ..Default::default()
            }))
            .build()
    }

    #[test]
    fn test_whitelisted_dependency_passes() {
        let (_root, gopath) = gopath_with(&[("github.com/acme/lib", Some("The MIT License"))]);
        let lister = FixedLister(vec!["github.com/acme/lib"]);

        let report =
            audit_dependencies(Path::new("."), &lister, &gopath, &mit_only()).unwrap();

        assert_eq!(report.dependencies.len(), 1);
        let dep = &report.dependencies[0];
        assert_eq!(dep.verdict, Verdict::Allowed);
        assert_eq!(dep.license, "MIT");
        assert!(!dep.fails_build);
        assert!(report.passed());
    }

    #[test]
    fn test_missing_license_fails() {
        let (_root, gopath) = gopath_with(&[("github.com/acme/bare", None)]);
        let lister = FixedLister(vec!["github.com/acme/bare"]);

        let report =
            audit_dependencies(Path::new("."), &lister, &gopath, &mit_only()).unwrap();

        let dep = &report.dependencies[0];
        assert_eq!(dep.verdict, Verdict::NoLicense);
        assert_eq!(dep.license, "Unknown");
        assert!(dep.fails_build);
        assert!(!report.passed());
    }

    #[test]
    fn test_without_policy_nothing_fails() {
        let (_root, gopath) = gopath_with(&[
            ("github.com/acme/bare", None),
            ("github.com/acme/gpl", Some("GNU GENERAL PUBLIC LICENSE\nVersion 2, June 1991")),
        ]);
        let lister = FixedLister(vec!["github.com/acme/bare", "github.com/acme/gpl"]);

        let report =
            audit_dependencies(Path::new("."), &lister, &gopath, &AuditConfig::default())
                .unwrap();

        assert!(!report.policy_applied);
        assert_eq!(report.dependencies[1].license, "GPL-2.0");
        assert!(report.dependencies.iter().all(|d| !d.fails_build));
        assert!(report.passed());
    }

    #[test]
    fn test_unresolvable_dependency_aborts() {
        let (_root, gopath) = gopath_with(&[]);
        let lister = FixedLister(vec!["github.com/acme/ghost"]);

        let err = audit_dependencies(Path::new("."), &lister, &gopath, &mit_only()).unwrap_err();
        assert!(matches!(err, AuditError::PackageNotFound { .. }));
    }

    #[test]
    fn test_duplicates_reported_once() {
        let (_root, gopath) = gopath_with(&[("github.com/acme/lib", Some("The MIT License"))]);
        let lister = FixedLister(vec!["github.com/acme/lib", "github.com/acme/lib"]);

        let report =
            audit_dependencies(Path::new("."), &lister, &gopath, &mit_only()).unwrap();
        assert_eq!(report.dependencies.len(), 1);
        assert_eq!(report.summary.total_dependencies, 1);
    }

    #[test]
    fn test_extra_license_file_names() {
        let (root, gopath) = gopath_with(&[("github.com/acme/odd", None)]);
        fs::write(
            root.path().join("src/github.com/acme/odd/LICENCE"),
            "The MIT License",
        )
        .unwrap();
        let lister = FixedLister(vec!["github.com/acme/odd"]);

        let report =
            audit_dependencies(Path::new("."), &lister, &gopath, &mit_only()).unwrap();
        assert_eq!(report.dependencies[0].verdict, Verdict::NoLicense);

        let config = AuditConfig {
            license_files: vec!["LICENCE".to_string()],
            ..mit_only()
        };
        let report = audit_dependencies(Path::new("."), &lister, &gopath, &config).unwrap();
        assert_eq!(report.dependencies[0].verdict, Verdict::Allowed);
    }
}
