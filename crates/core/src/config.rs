//! # Configuration
//!
//! Knobs for classification and for the recursive builders. Everything has
//! a default, so an empty JSON object is a valid configuration:
//!
//! ```rust
//! use ontoflow_core::config::{CyclePolicy, EngineConfig};
//!
//! let config = EngineConfig::from_json(r#"{ "on_cycle": "error" }"#).unwrap();
//! assert_eq!(config.on_cycle, CyclePolicy::Error);
//! assert_eq!(config.max_depth, Some(64));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{OntoError, Result};

/// Default cap on composition depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// What to do when hierarchy classification finds inconsistent types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyMode {
    /// Fail classification.
    #[default]
    Strict,
    /// Log, record the offending types, and return the hierarchy anyway.
    Warn,
}

/// What a builder does when a guard (cycle or depth) trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    /// Stop expanding: the node becomes a leaf.
    #[default]
    Truncate,
    /// Abort the whole query.
    Error,
}

/// Configuration for [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum node depth below the root. `None` disables the cap.
    pub max_depth: Option<usize>,
    /// Policy when an operation shows up again below itself.
    pub on_cycle: CyclePolicy,
    /// Policy when `max_depth` is reached.
    pub on_depth_limit: CyclePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: Some(DEFAULT_MAX_DEPTH),
            on_cycle: CyclePolicy::Truncate,
            on_depth_limit: CyclePolicy::Truncate,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| OntoError::InvalidConfig {
            reason: e.to_string(),
        })
    }

    /// Builder-style override of the depth cap.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Builder-style override of the cycle policy.
    pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.on_cycle = policy;
        self
    }

    /// Builder-style override of the depth-limit policy.
    pub fn with_depth_policy(mut self, policy: CyclePolicy) -> Self {
        self.on_depth_limit = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_depth, Some(DEFAULT_MAX_DEPTH));
        assert_eq!(config.on_cycle, CyclePolicy::Truncate);
        assert_eq!(config.on_depth_limit, CyclePolicy::Truncate);
    }

    #[test]
    fn test_empty_json_is_default() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_json_overrides() {
        let config = EngineConfig::from_json(
            r#"{ "max_depth": null, "on_cycle": "error", "on_depth_limit": "error" }"#,
        )
        .unwrap();
        assert_eq!(config.max_depth, None);
        assert_eq!(config.on_cycle, CyclePolicy::Error);
        assert_eq!(config.on_depth_limit, CyclePolicy::Error);
    }

    #[test]
    fn test_bad_json() {
        let result = EngineConfig::from_json(r#"{ "on_cycle": "explode" }"#);
        assert!(matches!(result, Err(OntoError::InvalidConfig { .. })));
    }

    #[test]
    fn test_consistency_mode_serde() {
        let mode: ConsistencyMode = serde_json::from_str("\"warn\"").unwrap();
        assert_eq!(mode, ConsistencyMode::Warn);
        assert_eq!(serde_json::to_string(&ConsistencyMode::Strict).unwrap(), "\"strict\"");
    }
}
