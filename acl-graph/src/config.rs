//! Configuration for permission matching.
//!
//! The only tunable today is the pair of wildcard sentinels a stored rule
//! can use to match every action or every resource.

use serde::{Deserialize, Serialize};

use crate::error::{AclError, AclResult};

/// Default sentinel meaning "any action" / "any resource".
pub const DEFAULT_WILDCARD: &str = "*";

/// Wildcard sentinels recognized in a stored permission's fields.
///
/// Sentinels are lower-cased on construction because stored actions and
/// resources are lower-cased too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wildcards {
    /// Sentinel matching any action.
    pub all_actions: String,
    /// Sentinel matching any resource.
    pub all_resources: String,
}

impl Wildcards {
    /// Create wildcard sentinels.
    pub fn new(all_actions: impl Into<String>, all_resources: impl Into<String>) -> Self {
        Self {
            all_actions: all_actions.into().to_lowercase(),
            all_resources: all_resources.into().to_lowercase(),
        }
    }

    /// Check if `action` is the all-actions sentinel.
    pub fn is_all_actions(&self, action: &str) -> bool {
        self.all_actions == action
    }

    /// Check if `resource` is the all-resources sentinel.
    pub fn is_all_resources(&self, resource: &str) -> bool {
        self.all_resources == resource
    }

    fn normalized(self) -> Self {
        Self::new(self.all_actions, self.all_resources)
    }
}

impl Default for Wildcards {
    fn default() -> Self {
        Self::new(DEFAULT_WILDCARD, DEFAULT_WILDCARD)
    }
}

/// Access-control model configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AclConfig {
    /// Wildcard sentinels handed to every permission built through a factory.
    pub wildcards: Wildcards,
}

impl AclConfig {
    /// Create a configuration with custom wildcard sentinels.
    pub fn with_wildcards(wildcards: Wildcards) -> Self {
        Self {
            wildcards: wildcards.normalized(),
        }
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Example
    ///
    /// ```
    /// use acl_graph::AclConfig;
    ///
    /// let config = AclConfig::from_json(r#"{"wildcards": {"all_actions": "ANY"}}"#).unwrap();
    /// assert_eq!(config.wildcards.all_actions, "any");
    /// assert_eq!(config.wildcards.all_resources, "*");
    /// ```
    pub fn from_json(json: &str) -> AclResult<Self> {
        let config: AclConfig =
            serde_json::from_str(json).map_err(|e| AclError::Config(e.to_string()))?;
        Ok(Self::with_wildcards(config.wildcards))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_wildcards() {
        let config = AclConfig::default();
        assert!(config.wildcards.is_all_actions("*"));
        assert!(config.wildcards.is_all_resources("*"));
        assert!(!config.wildcards.is_all_actions("read"));
    }

    #[test]
    fn test_wildcards_are_lowercased() {
        let wildcards = Wildcards::new("ALL", "Every");
        assert_eq!(wildcards.all_actions, "all");
        assert_eq!(wildcards.all_resources, "every");
    }

    #[test]
    fn test_from_json_empty_object() {
        let config = AclConfig::from_json("{}").unwrap();
        assert_eq!(config, AclConfig::default());
    }

    #[test]
    fn test_from_json_invalid() {
        let err = AclConfig::from_json("{not json").unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }
}
