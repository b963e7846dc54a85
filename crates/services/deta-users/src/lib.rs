//! Deta Base user database adapter.
//!
//! Implements the user database interface of the authentication layer
//! (`UserDatabase`) on top of two Deta Bases, one for users and one for
//! their OAuth accounts. Every operation is a direct pass-through to the
//! store; no caching, retries or transactions are added.

pub mod commands;
pub mod config;
pub mod repository;

pub use repository::{DetaUserDatabase, UserDatabase};
