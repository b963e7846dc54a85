//! User domain entity and related types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::constants::normalize_email;
use crate::oauth_account::OAuthAccount;

/// User record as the authentication layer sees it.
///
/// Fields not modelled here are kept in `extra`, so a record read from
/// the store and written back loses nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub is_verified: bool,
    /// Linked OAuth accounts. Stored in their own collection, never on the user document.
    #[serde(default)]
    pub oauth_accounts: Vec<OAuthAccount>,
    /// Caller-defined fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_true() -> bool {
    true
}

impl User {
    /// Create an active, unverified, regular user with a fresh id
    pub fn new(email: impl Into<String>, hashed_password: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            hashed_password: hashed_password.into(),
            is_active: true,
            is_superuser: false,
            is_verified: false,
            oauth_accounts: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Attach an OAuth account
    pub fn with_oauth_account(mut self, account: OAuthAccount) -> Self {
        self.oauth_accounts.push(account);
        self
    }

    /// Set a caller-defined field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Lower-case the email in place
    pub fn normalize(&mut self) {
        self.email = normalize_email(&self.email);
    }

    /// Store key for this user
    pub fn key(&self) -> String {
        self.id.to_string()
    }
}

/// User view safe to print (no password hash, no tokens)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
    /// Providers the user has linked
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub oauth_providers: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            is_verified: user.is_verified,
            oauth_providers: user
                .oauth_accounts
                .into_iter()
                .map(|account| account.oauth_name)
                .collect(),
            extra: user.extra,
        }
    }
}
