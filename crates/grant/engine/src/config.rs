//! Reconciler configuration
//!
//! Loaded from TOML. Every key is optional; a missing file or an empty
//! document yields the defaults below.

use crate::error::ConfigError;
use grant_types::{TenantId, UserId};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the parameter or category that opts a process out
pub const DEFAULT_EXEMPTION_MARKER: &str = "skipAutoPermissionGranting";
/// Upper bound on candidates considered per task
pub const DEFAULT_MAX_CANDIDATES: usize = 25;
/// Page size for parameter, category and history reads
pub const DEFAULT_PAGE_SIZE: usize = 500;
pub const DEFAULT_GRANT_NAME: &str = "Grant permissions to user";
pub const DEFAULT_GRANT_DESCRIPTION: &str =
    "A utility task that grants permissions to task candidates.";

/// What to do when the case history cannot be read
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerReadPolicy {
    /// Treat the history as empty and keep granting
    #[default]
    FailOpen,
    /// Abandon the event
    FailClosed,
}

/// Grant reconciler configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GranterConfig {
    pub tenant_id: TenantId,
    pub exemption_marker: String,
    pub max_candidates: usize,
    pub page_size: usize,
    /// Substitute recorded on every grant
    pub delegate_user_id: UserId,
    pub grant_name: String,
    pub grant_description: String,
    pub ledger_read_policy: LedgerReadPolicy,
    /// Serialize reconciliation of the same case within this process
    pub serialize_per_case: bool,
}

impl Default for GranterConfig {
    fn default() -> Self {
        Self {
            tenant_id: TenantId::default(),
            exemption_marker: DEFAULT_EXEMPTION_MARKER.to_string(),
            max_candidates: DEFAULT_MAX_CANDIDATES,
            page_size: DEFAULT_PAGE_SIZE,
            delegate_user_id: UserId::new(1),
            grant_name: DEFAULT_GRANT_NAME.to_string(),
            grant_description: DEFAULT_GRANT_DESCRIPTION.to_string(),
            ledger_read_policy: LedgerReadPolicy::FailOpen,
            serialize_per_case: false,
        }
    }
}

impl GranterConfig {
    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            ..Self::default()
        }
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: GranterConfig =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No granter config file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.exemption_marker.trim().is_empty() {
            return Err(ConfigError::Invalid("exemption_marker must not be empty".into()));
        }
        if self.max_candidates == 0 {
            return Err(ConfigError::Invalid("max_candidates must be at least 1".into()));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GranterConfig::default();
        assert_eq!(config.exemption_marker, "skipAutoPermissionGranting");
        assert_eq!(config.max_candidates, 25);
        assert_eq!(config.page_size, 500);
        assert_eq!(config.delegate_user_id, UserId::new(1));
        assert_eq!(config.ledger_read_policy, LedgerReadPolicy::FailOpen);
        assert!(!config.serialize_per_case);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GranterConfig::from_toml_str(
            r#"
            tenant_id = 7
            ledger_read_policy = "fail_closed"
            "#,
        )
        .unwrap();
        assert_eq!(config.tenant_id, TenantId::new(7));
        assert_eq!(config.ledger_read_policy, LedgerReadPolicy::FailClosed);
        assert_eq!(config.max_candidates, DEFAULT_MAX_CANDIDATES);
        assert_eq!(config.grant_name, DEFAULT_GRANT_NAME);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(GranterConfig::from_toml_str("").unwrap(), GranterConfig::default());
    }

    #[test]
    fn test_rejects_zero_bounds() {
        let result = GranterConfig::from_toml_str("max_candidates = 0");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = GranterConfig::from_toml_str("page_size = 0");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_blank_marker() {
        let result = GranterConfig::from_toml_str("exemption_marker = \"  \"");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let result = GranterConfig::from_toml_str("max_candidates = \"many\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let config = GranterConfig::load("/nonexistent/granter.toml").unwrap();
        assert_eq!(config, GranterConfig::default());
    }
}
