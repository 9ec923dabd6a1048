//! Configuration for license policy and audit behavior

use crate::error::{AuditError, Result};
use crate::license::{LicenseKind, DEFAULT_LICENSE_FILES};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Policy file names looked up in the project directory, in order
pub const POLICY_FILE_NAMES: &[&str] = &[
    ".license-audit.yml",
    ".license-audit.yaml",
    ".license-audit.toml",
    ".anderson.yml",
];

/// Maximum number of parent directories searched for a license
pub const DEFAULT_MAX_PARENT_HOPS: usize = 10;

/// License policy: which licenses are allowed, which are denied, and which
/// import paths are accepted regardless of their license
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub whitelist: HashSet<String>,
    #[serde(default)]
    pub blacklist: HashSet<String>,
    /// Import paths always allowed
    #[serde(default)]
    pub exceptions: HashSet<String>,
    /// Accepted for older policy files; greylisted licenses are classified
    /// like any other license that is neither allowed nor denied.
    #[serde(default)]
    pub greylist: HashSet<String>,
}

impl PolicyConfig {
    pub fn is_whitelisted(&self, license: &str) -> bool {
        self.whitelist.contains(license)
    }

    pub fn is_blacklisted(&self, license: &str) -> bool {
        self.blacklist.contains(license)
    }

    pub fn is_exception(&self, import_path: &str) -> bool {
        self.exceptions.contains(import_path)
    }

    /// License names in the policy that the matcher can never produce
    pub fn unrecognized_licenses(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .whitelist
            .iter()
            .chain(&self.blacklist)
            .chain(&self.greylist)
            .map(String::as_str)
            .filter(|name| LicenseKind::from_name(name).is_none())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Parse a policy document; TOML if `path` ends in `.toml`, YAML otherwise
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        // An empty YAML document is a policy with no entries
        if !is_toml && content.trim().is_empty() {
            return Ok(Self::default());
        }

        let policy: Self = if is_toml {
            toml::from_str(content)?
        } else {
            serde_yaml_ng::from_str(content)?
        };

        for name in policy.unrecognized_licenses() {
            warn!("Policy {} names unrecognized license '{}'", path.display(), name);
        }

        Ok(policy)
    }
}

/// Load the policy from an explicit file, or look for one in `project_dir`.
///
/// `Ok(None)` means no policy is in force. A missing explicit file is an error.
pub fn load_policy(project_dir: &Path, explicit: Option<&Path>) -> Result<Option<PolicyConfig>> {
    let path = match explicit {
        Some(path) => {
            if !path.is_file() {
                return Err(AuditError::config(format!(
                    "policy file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match discover_policy(project_dir) {
            Some(path) => path,
            None => {
                debug!("No policy file in {}", project_dir.display());
                return Ok(None);
            }
        },
    };

    debug!("Loading policy from {}", path.display());
    let content = std::fs::read_to_string(&path)?;
    PolicyConfig::parse(&path, &content).map(Some)
}

/// First policy file present in `project_dir`
pub fn discover_policy(project_dir: &Path) -> Option<PathBuf> {
    POLICY_FILE_NAMES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|path| path.is_file())
}

/// Main configuration for the audit process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// License policy; `None` reports licenses without judging them
    pub policy: Option<PolicyConfig>,
    /// License file names searched for in each directory, in order
    pub license_files: Vec<String>,
    /// Maximum number of directories searched per dependency
    pub max_parent_hops: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            policy: None,
            license_files: DEFAULT_LICENSE_FILES.iter().map(|s| s.to_string()).collect(),
            max_parent_hops: DEFAULT_MAX_PARENT_HOPS,
        }
    }
}

impl AuditConfig {
    /// Create a new builder for AuditConfig
    pub fn builder() -> AuditConfigBuilder {
        AuditConfigBuilder::default()
    }
}

/// Builder for AuditConfig
#[derive(Default)]
pub struct AuditConfigBuilder {
    policy: Option<PolicyConfig>,
    extra_license_files: Vec<String>,
    max_parent_hops: Option<usize>,
}

impl AuditConfigBuilder {
    pub fn policy(mut self, policy: Option<PolicyConfig>) -> Self {
        self.policy = policy;
        self
    }

    /// Also search for `name` after the default license file names
    pub fn license_file(mut self, name: impl Into<String>) -> Self {
        self.extra_license_files.push(name.into());
        self
    }

    pub fn max_parent_hops(mut self, hops: usize) -> Self {
        self.max_parent_hops = Some(hops);
        self
    }

    pub fn build(self) -> AuditConfig {
        let defaults = AuditConfig::default();
        let mut license_files = defaults.license_files;
        for name in self.extra_license_files {
            if !license_files.contains(&name) {
                license_files.push(name);
            }
        }

        AuditConfig {
            policy: self.policy,
            license_files,
            max_parent_hops: self.max_parent_hops.unwrap_or(defaults.max_parent_hops),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_yaml_policy() {
        let yaml = "whitelist:\n  - MIT\n  - Apache-2.0\n\
                    blacklist:\n  - GPL-3.0\n\
                    exceptions:\n  - github.com/acme/vendored\n\
                    extra_field: ignored\n";
        let policy = PolicyConfig::parse(Path::new(".license-audit.yml"), yaml).unwrap();

        assert!(policy.is_whitelisted("MIT"));
        assert!(policy.is_whitelisted("Apache-2.0"));
        assert!(policy.is_blacklisted("GPL-3.0"));
        assert!(policy.is_exception("github.com/acme/vendored"));
        assert!(policy.greylist.is_empty());
    }

    #[test]
    fn test_parse_toml_policy() {
        let toml = "whitelist = [\"MIT\"]\ngreylist = [\"MPL-2.0\"]\n";
        let policy = PolicyConfig::parse(Path::new("policy.toml"), toml).unwrap();

        assert!(policy.is_whitelisted("MIT"));
        assert!(policy.greylist.contains("MPL-2.0"));
        assert!(policy.blacklist.is_empty());
    }

    #[test]
    fn test_parse_empty_yaml() {
        let policy = PolicyConfig::parse(Path::new(".license-audit.yml"), "\n").unwrap();
        assert_eq!(policy, PolicyConfig::default());
    }

    #[test]
    fn test_malformed_policy() {
        assert!(matches!(
            PolicyConfig::parse(Path::new("p.yml"), "whitelist: [MIT"),
            Err(AuditError::YamlError(_))
        ));
        assert!(matches!(
            PolicyConfig::parse(Path::new("p.yml"), "whitelist: MIT"),
            Err(AuditError::YamlError(_))
        ));
        assert!(matches!(
            PolicyConfig::parse(Path::new("p.toml"), "whitelist = "),
            Err(AuditError::TomlError(_))
        ));
    }

    #[test]
    fn test_unrecognized_licenses() {
        let policy = PolicyConfig {
            whitelist: ["MIT", "Apache 2.0"].iter().map(|s| s.to_string()).collect(),
            blacklist: ["GPL-3.0", "AGPL"].iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        assert_eq!(policy.unrecognized_licenses(), vec!["AGPL", "Apache 2.0"]);
    }

    #[test]
    fn test_load_policy() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load_policy(dir.path(), None).unwrap(), None);

        fs::write(dir.path().join(".license-audit.yml"), "blacklist: [GPL-2.0]\n").unwrap();
        let policy = load_policy(dir.path(), None).unwrap().unwrap();
        assert!(policy.is_blacklisted("GPL-2.0"));

        let explicit = dir.path().join("custom.toml");
        assert!(matches!(
            load_policy(dir.path(), Some(explicit.as_path())),
            Err(AuditError::ConfigError(_))
        ));

        fs::write(&explicit, "whitelist = [\"MIT\"]\n").unwrap();
        let policy = load_policy(dir.path(), Some(explicit.as_path())).unwrap().unwrap();
        assert!(policy.is_whitelisted("MIT"));
        assert!(!policy.is_blacklisted("GPL-2.0"));
    }

    #[test]
    fn test_discovers_legacy_policy_name() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".anderson.yml"), "whitelist: [MIT]\n").unwrap();

        let policy = load_policy(dir.path(), None).unwrap().unwrap();
        assert!(policy.is_whitelisted("MIT"));

        fs::write(dir.path().join(".license-audit.yml"), "whitelist: [EPL-1.0]\n").unwrap();
        let policy = load_policy(dir.path(), None).unwrap().unwrap();
        assert!(policy.is_whitelisted("EPL-1.0"));
        assert!(!policy.is_whitelisted("MIT"));
    }

    #[test]
    fn test_builder() {
        let config = AuditConfig::builder()
            .license_file("UNLICENSE")
            .license_file("LICENSE")
            .max_parent_hops(3)
            .build();

        assert!(config.policy.is_none());
        assert_eq!(config.max_parent_hops, 3);
        assert_eq!(config.license_files.first().map(String::as_str), Some("LICENSE"));
        assert_eq!(config.license_files.last().map(String::as_str), Some("UNLICENSE"));
        assert_eq!(config.license_files.len(), DEFAULT_LICENSE_FILES.len() + 1);
    }
}
