//! Discovering the import paths a project depends on
//!
//! Three strategies implement [`DependencyLister`]:
//! - [`ManifestLister`] reads an already-flattened `Godeps.json`-style manifest.
//! - [`PackageListLister`] reads newline-separated import paths.
//! - [`QueryLister`] asks the Go toolchain for every package the project and
//!   its tests import.
//!
//! Every strategy returns each import path once and never returns a path that
//! lies under another returned path.

use crate::error::{AuditError, Result};
use crate::metadata::{GoList, PackageInfo, PackageQuery};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, info};

/// Pattern matching every package of the project being audited
pub const PROJECT_PATTERN: &str = "./...";

/// Import path cgo uses for its pseudo-package
const CGO_PSEUDO_PACKAGE: &str = "C";

/// Produces the dependency import paths for one run
pub trait DependencyLister {
    fn list_dependencies(&self) -> Result<Vec<String>>;
}

/// Where a lister reads its input from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Path(PathBuf),
    Stdin,
}

impl InputSource {
    /// `-` selects standard input, anything else is a file path
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else {
            Self::Path(PathBuf::from(arg))
        }
    }

    fn label(&self) -> PathBuf {
        match self {
            Self::Path(path) => path.clone(),
            Self::Stdin => PathBuf::from("<stdin>"),
        }
    }

    fn read_to_string(&self) -> Result<String> {
        let mut contents = String::new();
        let read = match self {
            Self::Path(path) => std::fs::File::open(path)
                .and_then(|mut file| file.read_to_string(&mut contents)),
            Self::Stdin => std::io::stdin().read_to_string(&mut contents),
        };
        read.map_err(|e| AuditError::manifest(self.label(), e.to_string()))?;
        Ok(contents)
    }
}

/// Explicit choice of listing strategy
#[derive(Debug, Clone)]
pub enum ListerKind {
    Manifest(InputSource),
    PackageList(InputSource),
    Query {
        project_dir: PathBuf,
        go_program: PathBuf,
    },
}

impl ListerKind {
    pub fn build(self) -> Box<dyn DependencyLister> {
        match self {
            Self::Manifest(source) => Box::new(ManifestLister::new(source)),
            Self::PackageList(source) => Box::new(PackageListLister::new(source)),
            Self::Query {
                project_dir,
                go_program,
            } => Box::new(QueryLister::new(
                GoList::new(project_dir).program(go_program),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Manifest {
    deps: Vec<ManifestDependency>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ManifestDependency {
    import_path: String,
}

/// Lists the dependencies recorded in a JSON manifest (`{"Deps": [{"ImportPath": ...}]}`)
#[derive(Debug, Clone)]
pub struct ManifestLister {
    source: InputSource,
}

impl ManifestLister {
    pub fn new(source: InputSource) -> Self {
        Self { source }
    }

    /// Parse manifest contents; `origin` is only used in error messages
    pub fn parse(origin: impl Into<PathBuf>, contents: &str) -> Result<Vec<String>> {
        let manifest: Manifest = serde_json::from_str(contents)
            .map_err(|e| AuditError::manifest(origin, e.to_string()))?;

        Ok(collapse_import_paths(
            manifest.deps.into_iter().map(|dep| dep.import_path),
        ))
    }
}

impl DependencyLister for ManifestLister {
    fn list_dependencies(&self) -> Result<Vec<String>> {
        let contents = self.source.read_to_string()?;
        let deps = Self::parse(self.source.label(), &contents)?;
        info!(
            "Read {} dependencies from {}",
            deps.len(),
            self.source.label().display()
        );
        Ok(deps)
    }
}

/// Lists import paths given one per line
#[derive(Debug, Clone)]
pub struct PackageListLister {
    source: InputSource,
}

impl PackageListLister {
    pub fn new(source: InputSource) -> Self {
        Self { source }
    }

    pub fn parse(contents: &str) -> Vec<String> {
        collapse_import_paths(
            contents
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from),
        )
    }
}

impl DependencyLister for PackageListLister {
    fn list_dependencies(&self) -> Result<Vec<String>> {
        let contents = self.source.read_to_string()?;
        Ok(Self::parse(&contents))
    }
}

/// Lists the non-standard packages imported, directly, transitively, or from
/// tests, by the project's own packages
#[derive(Debug, Clone)]
pub struct QueryLister<Q> {
    query: Q,
    pattern: String,
}

impl<Q: PackageQuery> QueryLister<Q> {
    pub fn new(query: Q) -> Self {
        Self {
            query,
            pattern: PROJECT_PATTERN.to_string(),
        }
    }

    /// Use a different pattern for the project's own packages
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }
}

impl<Q: PackageQuery> DependencyLister for QueryLister<Q> {
    fn list_dependencies(&self) -> Result<Vec<String>> {
        let own: Vec<PackageInfo> = self
            .query
            .query(&[self.pattern.clone()])?
            .into_iter()
            .filter(|pkg| !pkg.standard)
            .collect();
        ensure_loaded(&own)?;

        let own_paths: HashSet<&str> = own.iter().map(|pkg| pkg.import_path.as_str()).collect();
        debug!("Project has {} package(s)", own_paths.len());

        // Tests carry license obligations too, so their imports are included
        let wanted: BTreeSet<&str> = own
            .iter()
            .flat_map(|pkg| pkg.deps.iter().chain(pkg.test_only_imports()))
            .map(String::as_str)
            .filter(|path| *path != CGO_PSEUDO_PACKAGE && !own_paths.contains(path))
            .collect();
        let specs: Vec<String> = wanted.into_iter().map(String::from).collect();

        let resolved: Vec<PackageInfo> = self
            .query
            .query(&specs)?
            .into_iter()
            .filter(|pkg| !pkg.standard)
            .collect();
        ensure_loaded(&resolved)?;

        let mut paths: Vec<String> = resolved
            .into_iter()
            .map(|pkg| pkg.import_path)
            .filter(|path| !own_paths.contains(path.as_str()))
            .collect();
        paths.sort();

        let deps = collapse_import_paths(paths);
        info!("Found {} non-standard dependencies", deps.len());
        Ok(deps)
    }
}

fn ensure_loaded(packages: &[PackageInfo]) -> Result<()> {
    let failures: Vec<(String, String)> = packages
        .iter()
        .filter_map(|pkg| {
            pkg.error_message()
                .map(|err| (pkg.import_path.clone(), err.to_string()))
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(AuditError::PackageLoad { packages: failures })
    }
}

/// Proper prefixes of `path` that end at a `/` boundary
fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/').map(move |(idx, _)| &path[..idx])
}

/// Drop duplicates and any import path lying beneath another listed path,
/// keeping the first-seen order of the survivors.
///
/// `org/pkg` covers `org/pkg/sub` but not `org/pkgx`.
pub fn collapse_import_paths<I>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let paths: Vec<String> = paths.into_iter().collect();
    let all: HashSet<&str> = paths.iter().map(String::as_str).collect();
    let mut emitted: HashSet<&str> = HashSet::new();

    paths
        .iter()
        .filter(|path| !ancestors(path).any(|prefix| all.contains(prefix)))
        .filter(|path| emitted.insert(path.as_str()))
        .cloned()
        .collect()
}
