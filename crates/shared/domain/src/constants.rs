//! Domain-level constants.
//!
//! Field names shared between the domain records and their stored form.

// =============================================================================
// Store Documents
// =============================================================================

/// Key field the store adds to every document it returns
pub const FIELD_KEY: &str = "key";

/// User email field, used as the secondary lookup key
pub const FIELD_EMAIL: &str = "email";

/// Linked OAuth accounts on the in-memory user model (never stored on the user)
pub const FIELD_OAUTH_ACCOUNTS: &str = "oauth_accounts";

// =============================================================================
// OAuth Accounts
// =============================================================================

/// Owning user's id on a stored OAuth account document
pub const FIELD_USER_ID: &str = "user_id";

/// Provider name on an OAuth account document
pub const FIELD_OAUTH_NAME: &str = "oauth_name";

/// Provider-assigned account id on an OAuth account document
pub const FIELD_ACCOUNT_ID: &str = "account_id";

/// Normalize an email address for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.to_lowercase()
}
