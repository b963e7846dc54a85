//! Repository layer for data access.

mod documents;
mod user_database;

pub use user_database::{DetaUserDatabase, UserDatabase};

#[cfg(any(test, feature = "test-utils"))]
pub use user_database::MockUserDatabase;
