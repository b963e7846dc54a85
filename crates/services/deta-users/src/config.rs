//! Adapter configuration loaded from environment variables.

use std::env;

use common::{
    DetaConfig, OAuthSyncPolicy, DEFAULT_HOST, DEFAULT_OAUTH_ACCOUNT_BASE,
    DEFAULT_TIMEOUT_MS, DEFAULT_USER_BASE,
};

/// Load the Deta configuration from the process environment.
pub fn from_env() -> DetaConfig {
    from_lookup(|name| env::var(name).ok())
}

/// Load the Deta configuration through an arbitrary variable lookup.
///
/// A missing project key is left empty; `DetaUserDatabase::from_config` rejects it.
pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DetaConfig {
    let oauth_sync_policy = match lookup("OAUTH_SYNC_POLICY") {
        Some(raw) => raw.parse().unwrap_or_else(|err| {
            tracing::warn!("{}, using {}", err, OAuthSyncPolicy::default());
            OAuthSyncPolicy::default()
        }),
        None => OAuthSyncPolicy::default(),
    };

    DetaConfig {
        project_key: lookup("DETA_PROJECT_KEY").unwrap_or_default(),
        host: lookup("DETA_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
        user_base: lookup("DETA_USER_BASE").unwrap_or_else(|| DEFAULT_USER_BASE.to_string()),
        oauth_account_base: lookup("DETA_OAUTH_ACCOUNT_BASE")
            .unwrap_or_else(|| DEFAULT_OAUTH_ACCOUNT_BASE.to_string()),
        timeout_ms: lookup("DETA_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS),
        oauth_sync_policy,
    }
}
