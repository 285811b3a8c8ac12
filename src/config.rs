//! Resolver configuration
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`NODEWIRE_*`)
//! 2. Config file (YAML)
//! 3. Defaults
//!
//! ```yaml
//! registry_root: /root
//! missing_node: fail      # or: warn
//! resource_root: assets
//! log_filter: nodewire=debug
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BindError, Result};
use crate::tree::ROOT_NAME;

/// What to do when a node-path binding finds no node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingNodePolicy {
    /// Abort resolution with `BindingNotFound`
    #[default]
    Fail,
    /// Log a warning and leave the member untouched
    Warn,
}

impl std::str::FromStr for MissingNodePolicy {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "warn" => Ok(Self::Warn),
            other => Err(BindError::Config {
                reason: format!("unknown missing_node policy '{}' (expected fail or warn)", other),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// Absolute path under which singletons are parented
    pub registry_root: String,

    /// Policy for unresolved node-path bindings
    pub missing_node: MissingNodePolicy,

    /// Directory `res://` ids are resolved against
    pub resource_root: PathBuf,

    /// tracing-subscriber filter directive
    pub log_filter: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            registry_root: "/root".to_string(),
            missing_node: MissingNodePolicy::Fail,
            resource_root: PathBuf::from("."),
            log_filter: "nodewire=info".to_string(),
        }
    }
}

impl ResolverConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| BindError::Config {
            reason: format!("Failed to parse config: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns error if the file exists but is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| BindError::Config {
            reason: format!("Failed to read config file {}: {}", path.display(), e),
        })?;
        Self::from_yaml_str(&content)
    }

    /// Apply `NODEWIRE_*` environment overrides
    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(root) = var("NODEWIRE_REGISTRY_ROOT") {
            self.registry_root = root;
        }
        if let Some(policy) = var("NODEWIRE_MISSING_NODE") {
            self.missing_node = policy.parse()?;
        }
        if let Some(dir) = var("NODEWIRE_RESOURCE_ROOT") {
            self.resource_root = PathBuf::from(dir);
        }
        if let Some(filter) = var("NODEWIRE_LOG") {
            self.log_filter = filter;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        // Absolute lookups only succeed when the first segment names the tree root
        let root = format!("/{}", ROOT_NAME);
        let prefix = self.registry_prefix();
        let under_root = prefix == root
            || prefix
                .strip_prefix(root.as_str())
                .is_some_and(|rest| rest.starts_with('/'));
        if !under_root {
            return Err(BindError::Config {
                reason: format!(
                    "registry_root must be an absolute node path under '{}', got '{}'",
                    root, self.registry_root
                ),
            });
        }
        Ok(())
    }

    /// Registry root without a trailing slash
    pub fn registry_prefix(&self) -> &str {
        self.registry_root.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.registry_root, "/root");
        assert_eq!(config.missing_node, MissingNodePolicy::Fail);
        assert_eq!(config.registry_prefix(), "/root");
    }

    #[test]
    fn parse_partial_yaml() {
        let config = ResolverConfig::from_yaml_str("missing_node: warn\n").unwrap();
        assert_eq!(config.missing_node, MissingNodePolicy::Warn);
        assert_eq!(config.registry_root, "/root");
    }

    #[test]
    fn relative_registry_root_is_rejected() {
        let err = ResolverConfig::from_yaml_str("registry_root: autoload\n").unwrap_err();
        assert!(err.to_string().contains("NW-030"));
    }

    #[test]
    fn registry_root_outside_the_tree_is_rejected() {
        for root in ["/", "/rootless", "/Autoload", "//root"] {
            let yaml = format!("registry_root: \"{}\"\n", root);
            let err = ResolverConfig::from_yaml_str(&yaml).unwrap_err();
            assert!(err.to_string().contains("NW-030"), "{} accepted", root);
        }

        assert!(ResolverConfig::from_yaml_str("registry_root: /root/\n").is_ok());
        assert!(ResolverConfig::from_yaml_str("registry_root: /root/Autoload\n").is_ok());
    }

    #[test]
    fn env_overrides_win() {
        let config = ResolverConfig::default()
            .with_overrides(|key| match key {
                "NODEWIRE_REGISTRY_ROOT" => Some("/root/Autoload/".to_string()),
                "NODEWIRE_MISSING_NODE" => Some("WARN".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.registry_prefix(), "/root/Autoload");
        assert_eq!(config.missing_node, MissingNodePolicy::Warn);
    }

    #[test]
    fn bad_policy_is_rejected() {
        let result = ResolverConfig::default().with_overrides(|key| {
            (key == "NODEWIRE_MISSING_NODE").then(|| "ignore".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn load_missing_file_gives_defaults() {
        let config = ResolverConfig::load("/definitely/not/here.yaml").unwrap();
        assert_eq!(config, ResolverConfig::default());
    }
}
