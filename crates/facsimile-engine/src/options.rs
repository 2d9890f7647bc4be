//! Clone options
//!
//! [`ClonePolicy`] holds the plain switches and can be loaded from TOML
//! (e.g. a `facsimile.toml` next to an embedding application). Variant rules
//! are code, so they live on [`CloneOptions`] alongside the policy.

use crate::error::ConfigError;
use crate::rules::VariantRule;
use facsimile_core::{Heap, ObjectId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Switches controlling how a graph is cloned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClonePolicy {
    /// Clone non-intrinsic prototypes instead of sharing them
    #[serde(alias = "clonePrototype")]
    pub clone_prototype: bool,

    /// Share callables with the clone instead of rejecting them
    #[serde(alias = "cloneCallablesByReference")]
    pub clone_callables_by_reference: bool,

    /// Reproduce non-extensible, sealed and frozen states on clones
    #[serde(alias = "preserveExtensibility")]
    pub preserve_extensibility: bool,

    /// Maximum number of objects a single clone may create
    #[serde(alias = "maxNodes", skip_serializing_if = "Option::is_none")]
    pub max_nodes: Option<usize>,
}

impl Default for ClonePolicy {
    fn default() -> Self {
        Self {
            clone_prototype: true,
            clone_callables_by_reference: true,
            preserve_extensibility: true,
            max_nodes: None,
        }
    }
}

impl ClonePolicy {
    /// Parse a policy from TOML; missing keys keep their defaults
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let policy: ClonePolicy = toml::from_str(text)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Load a policy from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject settings that can never produce a clone
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_nodes == Some(0) {
            return Err(ConfigError::ValidationError("max_nodes must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Policy plus variant rules for one clone call
#[derive(Clone, Default)]
pub struct CloneOptions {
    /// Plain switches
    pub policy: ClonePolicy,

    /// Custom rules, consulted in order before built-in classification
    pub variant_rules: Vec<Arc<dyn VariantRule>>,
}

impl CloneOptions {
    /// Default options: everything cloned, callables shared, no rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Options using `policy`
    pub fn with_policy(policy: ClonePolicy) -> Self {
        Self {
            policy,
            variant_rules: Vec::new(),
        }
    }

    /// Set whether non-intrinsic prototypes are cloned
    pub fn clone_prototype(mut self, enabled: bool) -> Self {
        self.policy.clone_prototype = enabled;
        self
    }

    /// Set whether callables are shared instead of rejected
    pub fn clone_callables_by_reference(mut self, enabled: bool) -> Self {
        self.policy.clone_callables_by_reference = enabled;
        self
    }

    /// Set whether integrity levels are reproduced
    pub fn preserve_extensibility(mut self, enabled: bool) -> Self {
        self.policy.preserve_extensibility = enabled;
        self
    }

    /// Cap the number of objects a clone may create
    pub fn max_nodes(mut self, limit: Option<usize>) -> Self {
        self.policy.max_nodes = limit;
        self
    }

    /// Append a variant rule
    pub fn with_rule(mut self, rule: impl VariantRule + 'static) -> Self {
        self.variant_rules.push(Arc::new(rule));
        self
    }

    /// First rule claiming `source`
    pub(crate) fn find_rule(&self, heap: &Heap, source: ObjectId) -> Option<Arc<dyn VariantRule>> {
        self.variant_rules
            .iter()
            .find(|rule| rule.matches(heap, source))
            .cloned()
    }
}

impl fmt::Debug for CloneOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules: Vec<&str> = self.variant_rules.iter().map(|r| r.name()).collect();
        f.debug_struct("CloneOptions")
            .field("policy", &self.policy)
            .field("variant_rules", &rules)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = ClonePolicy::default();
        assert!(policy.clone_prototype);
        assert!(policy.clone_callables_by_reference);
        assert!(policy.preserve_extensibility);
        assert_eq!(policy.max_nodes, None);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let policy = ClonePolicy::from_toml_str("clone_prototype = false\nmax_nodes = 64\n").unwrap();
        assert!(!policy.clone_prototype);
        assert!(policy.preserve_extensibility);
        assert_eq!(policy.max_nodes, Some(64));
    }

    #[test]
    fn test_camel_case_aliases() {
        let policy = ClonePolicy::from_toml_str("preserveExtensibility = false").unwrap();
        assert!(!policy.preserve_extensibility);
    }

    #[test]
    fn test_invalid_toml() {
        let err = ClonePolicy::from_toml_str("clone_prototype = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_zero_node_limit_rejected() {
        let err = ClonePolicy::from_toml_str("max_nodes = 0").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ClonePolicy::from_file("/nonexistent/facsimile.toml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_builders() {
        let options = CloneOptions::new()
            .clone_prototype(false)
            .clone_callables_by_reference(false)
            .preserve_extensibility(false)
            .max_nodes(Some(10));
        assert_eq!(
            options.policy,
            ClonePolicy {
                clone_prototype: false,
                clone_callables_by_reference: false,
                preserve_extensibility: false,
                max_nodes: Some(10),
            }
        );
        assert!(format!("{:?}", options).contains("variant_rules: []"));
    }
}
