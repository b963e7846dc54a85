//! OAuth (federated identity) account record.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Link between a user and an account at a third-party provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthAccount {
    pub id: Uuid,
    /// Provider name, e.g. "google"
    pub oauth_name: String,
    pub access_token: String,
    /// Token expiry as unix seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Provider-assigned account id
    pub account_id: String,
    pub account_email: String,
}

impl OAuthAccount {
    pub fn new(
        oauth_name: impl Into<String>,
        account_id: impl Into<String>,
        account_email: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            oauth_name: oauth_name.into(),
            access_token: access_token.into(),
            expires_at: None,
            refresh_token: None,
            account_id: account_id.into(),
            account_email: account_email.into(),
        }
    }
}
