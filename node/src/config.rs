//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use snapshots_governance::policy::{DEFAULT_DENOMINATOR, DEFAULT_NUMERATOR, DEFAULT_WINDOW_SECS};
use snapshots_governance::MajorityPolicy;
use snapshots_types::Identity;
use snapshots_utils::LogFormat;
use std::path::PathBuf;

use crate::NodeError;

/// Configuration for a snapshot quorum node.
///
/// The owner, member lists and policy seed the initial state; once a state
/// file exists they are only changed through owner operations. Can be loaded
/// from a TOML file via [`NodeConfig::from_toml_file`] or built
/// programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Identity allowed to manage members, policy and the pause switch.
    #[serde(default)]
    pub owner: Identity,

    /// Initial validator set.
    #[serde(default)]
    pub validators: Vec<Identity>,

    /// Initial requester set.
    #[serde(default)]
    pub requesters: Vec<Identity>,

    #[serde(default = "default_numerator")]
    pub majority_numerator: u32,

    #[serde(default = "default_denominator")]
    pub majority_denominator: u32,

    /// Default voting window for new rounds, in seconds.
    #[serde(default = "default_window_secs")]
    pub voting_window_secs: u64,

    /// Where the daemon persists node state between invocations.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_numerator() -> u32 {
    DEFAULT_NUMERATOR
}

fn default_denominator() -> u32 {
    DEFAULT_DENOMINATOR
}

fn default_window_secs() -> u64 {
    DEFAULT_WINDOW_SECS
}

fn default_state_file() -> PathBuf {
    PathBuf::from("./snapshots_state.bin")
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("NodeConfig is always serializable to TOML")
    }

    /// The majority policy described by this configuration.
    pub fn policy(&self) -> Result<MajorityPolicy, NodeError> {
        MajorityPolicy::new(
            self.majority_numerator,
            self.majority_denominator,
            self.voting_window_secs,
        )
        .map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Check the settings needed to build a genesis state.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.owner.is_empty() {
            return Err(NodeError::Config("owner must be set".into()));
        }
        if let Some(empty) = self
            .validators
            .iter()
            .chain(&self.requesters)
            .find(|id| id.is_empty())
        {
            return Err(NodeError::Config(format!(
                "member list contains an empty identity {empty:?}"
            )));
        }
        self.policy().map(|_| ())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            owner: Identity::default(),
            validators: Vec::new(),
            requesters: Vec::new(),
            majority_numerator: default_numerator(),
            majority_denominator: default_denominator(),
            voting_window_secs: default_window_secs(),
            state_file: default_state_file(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = NodeConfig {
            owner: Identity::new("owner"),
            validators: vec![Identity::new("v1"), Identity::new("v2")],
            ..NodeConfig::default()
        };
        let toml_str = config.to_toml_string();
        let parsed = NodeConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = NodeConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.majority_numerator, 2);
        assert_eq!(config.majority_denominator, 3);
        assert_eq!(config.voting_window_secs, 120);
        assert_eq!(config.log_format, LogFormat::Human);
        assert!(config.validators.is_empty());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            owner = "0xowner"
            validators = ["0xv1", "0xv2", "0xv3"]
            requesters = ["0xreq"]
            voting_window_secs = 300
            log_format = "json"
        "#;
        let config = NodeConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.owner, Identity::new("0xowner"));
        assert_eq!(config.validators.len(), 3);
        assert_eq!(config.voting_window_secs, 300);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.majority_denominator, 3); // default
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_requires_owner() {
        let err = NodeConfig::default().validate().unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));
    }

    #[test]
    fn validate_rejects_bad_policy() {
        let config = NodeConfig {
            owner: Identity::new("owner"),
            majority_numerator: 4,
            majority_denominator: 3,
            ..NodeConfig::default()
        };
        assert!(matches!(config.validate(), Err(NodeError::Config(_))));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = NodeConfig::from_toml_file("/nonexistent/snapshots.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
