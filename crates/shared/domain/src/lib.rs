//! Domain layer - user and OAuth account records.
//!
//! Pure data types with no store dependencies. The adapter crate turns
//! these into store documents and back.

pub mod constants;
pub mod oauth_account;
pub mod user;

pub use constants::*;
pub use oauth_account::OAuthAccount;
pub use user::{User, UserResponse};
