//! Package metadata from the Go toolchain
//!
//! The audit only needs a handful of fields per package. They are obtained by
//! running `go list -e -json`, which prints one JSON object per package. The
//! [`PackageQuery`] trait keeps the rest of the crate independent of the
//! command so tests can substitute canned metadata.

use crate::error::{AuditError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Import paths passed to a single `go list` invocation
const DEFAULT_BATCH_SIZE: usize = 256;

/// Metadata for one package, as reported by `go list -json`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageInfo {
    pub import_path: String,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub standard: bool,
    /// Direct and transitive imports
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default)]
    pub test_imports: Vec<String>,
    #[serde(default, rename = "XTestImports")]
    pub xtest_imports: Vec<String>,
    #[serde(default)]
    pub error: Option<PackageError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PackageError {
    pub err: String,
}

impl PackageInfo {
    /// Imports used only by the package's tests, including black-box tests
    pub fn test_only_imports(&self) -> impl Iterator<Item = &String> {
        self.test_imports.iter().chain(self.xtest_imports.iter())
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.err.as_str())
    }
}

/// Source of package metadata
pub trait PackageQuery {
    /// Describe every package matched by `specs`, which may be import paths
    /// or patterns such as `./...`.
    fn query(&self, specs: &[String]) -> Result<Vec<PackageInfo>>;
}

/// [`PackageQuery`] backed by `go list`
#[derive(Debug, Clone)]
pub struct GoList {
    program: PathBuf,
    dir: PathBuf,
    batch_size: usize,
}

impl GoList {
    /// Run queries from `dir`, which anchors relative patterns like `./...`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from("go"),
            dir: dir.into(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Use a different `go` executable
    pub fn program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn run(&self, specs: &[String]) -> Result<Vec<PackageInfo>> {
        debug!(
            "Running {} list for {} package pattern(s) in {}",
            self.program.display(),
            specs.len(),
            self.dir.display()
        );

        let mut cmd = Command::new(&self.program);
        cmd.args(["list", "-e", "-json"])
            .args(specs)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stderr(Stdio::inherit());

        // Resolve packages through GOPATH rather than a module graph
        if std::env::var_os("GO111MODULE").is_none() {
            cmd.env("GO111MODULE", "off");
        }

        let output = cmd.output().map_err(|e| {
            AuditError::metadata(format!("failed to run {}: {}", self.program.display(), e))
        })?;

        if !output.status.success() {
            return Err(AuditError::metadata(format!(
                "{} list exited with {}",
                self.program.display(),
                output.status
            )));
        }

        parse_packages(&output.stdout)
    }
}

impl PackageQuery for GoList {
    fn query(&self, specs: &[String]) -> Result<Vec<PackageInfo>> {
        let mut packages = Vec::new();
        for batch in specs.chunks(self.batch_size) {
            packages.extend(self.run(batch)?);
        }
        Ok(packages)
    }
}

/// Parse the concatenated JSON objects printed by `go list -json`
pub fn parse_packages(bytes: &[u8]) -> Result<Vec<PackageInfo>> {
    serde_json::Deserializer::from_slice(bytes)
        .into_iter::<PackageInfo>()
        .map(|package| package.map_err(AuditError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GO_LIST_OUTPUT: &str = r#"{
	"Dir": "/go/src/github.com/acme/app",
	"ImportPath": "github.com/acme/app",
	"Name": "main",
	"Deps": [
		"errors",
		"github.com/acme/lib"
	],
	"TestImports": [
		"testing",
		"github.com/acme/assert"
	],
	"XTestImports": [
		"github.com/acme/app"
	]
}
{
	"ImportPath": "github.com/acme/missing",
	"Standard": false,
	"Error": {
		"ImportStack": ["github.com/acme/missing"],
		"Pos": "",
		"Err": "cannot find package"
	}
}
{
	"Dir": "/usr/lib/go/src/errors",
	"ImportPath": "errors",
	"Standard": true
}
"#;

    #[test]
    fn test_parse_go_list_stream() {
        let packages = parse_packages(GO_LIST_OUTPUT.as_bytes()).unwrap();
        assert_eq!(packages.len(), 3);

        let app = &packages[0];
        assert_eq!(app.import_path, "github.com/acme/app");
        assert_eq!(app.dir.as_deref(), Some(Path::new("/go/src/github.com/acme/app")));
        assert!(!app.standard);
        assert_eq!(app.deps, vec!["errors", "github.com/acme/lib"]);
        assert_eq!(
            app.test_only_imports().collect::<Vec<_>>(),
            vec!["testing", "github.com/acme/assert", "github.com/acme/app"]
        );
        assert!(app.error.is_none());

        assert_eq!(packages[1].error_message(), Some("cannot find package"));
        assert!(packages[2].standard);
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_packages(b"").unwrap().is_empty());
        assert!(parse_packages(b"  \n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed_output() {
        assert!(matches!(
            parse_packages(b"{\"ImportPath\": "),
            Err(AuditError::JsonError(_))
        ));
    }

    #[test]
    fn test_missing_program() {
        let list = GoList::new(".").program("/nonexistent/go-binary");
        let err = list.query(&["./...".to_string()]).unwrap_err();
        assert!(matches!(err, AuditError::MetadataCommand(_)));
    }

    #[test]
    fn test_empty_query_runs_nothing() {
        let list = GoList::new(".").program("/nonexistent/go-binary");
        assert!(list.query(&[]).unwrap().is_empty());
    }
}
