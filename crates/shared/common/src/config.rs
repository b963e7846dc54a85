//! Shared configuration structures.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use deta_base::{DEFAULT_HOST, DEFAULT_TIMEOUT_MS};

/// Default Base holding user documents
pub const DEFAULT_USER_BASE: &str = "users";

/// Default Base holding OAuth account documents
pub const DEFAULT_OAUTH_ACCOUNT_BASE: &str = "oauth_accounts";

/// What syncing a user's OAuth accounts does with stored accounts missing from the list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthSyncPolicy {
    /// Leave them in place
    #[default]
    Preserve,
    /// Delete them
    Reconcile,
}

impl FromStr for OAuthSyncPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "preserve" => Ok(OAuthSyncPolicy::Preserve),
            "reconcile" => Ok(OAuthSyncPolicy::Reconcile),
            other => Err(format!("unknown OAuth sync policy: {other}")),
        }
    }
}

impl fmt::Display for OAuthSyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OAuthSyncPolicy::Preserve => write!(f, "preserve"),
            OAuthSyncPolicy::Reconcile => write!(f, "reconcile"),
        }
    }
}

/// Deta Base connection and collection configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DetaConfig {
    #[serde(skip_serializing)]
    pub project_key: String,
    pub host: String,
    pub user_base: String,
    pub oauth_account_base: String,
    pub timeout_ms: u64,
    pub oauth_sync_policy: OAuthSyncPolicy,
}

impl fmt::Debug for DetaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetaConfig")
            .field("project_key", &"[REDACTED]")
            .field("host", &self.host)
            .field("user_base", &self.user_base)
            .field("oauth_account_base", &self.oauth_account_base)
            .field("timeout_ms", &self.timeout_ms)
            .field("oauth_sync_policy", &self.oauth_sync_policy)
            .finish()
    }
}

impl Default for DetaConfig {
    fn default() -> Self {
        Self {
            project_key: String::new(),
            host: DEFAULT_HOST.to_string(),
            user_base: DEFAULT_USER_BASE.to_string(),
            oauth_account_base: DEFAULT_OAUTH_ACCOUNT_BASE.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            oauth_sync_policy: OAuthSyncPolicy::Preserve,
        }
    }
}
