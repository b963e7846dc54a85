//! Deta Base client.
//!
//! This crate provides:
//! - The `Base` trait: the key-value document operations the user adapter needs
//! - `DetaBase`: the HTTP implementation against the hosted Deta Base API
//! - `MemoryBase`: an in-process implementation with the same key and query semantics

mod base;
mod client;
mod error;
mod memory;
mod query;

pub use base::{with_key, Base, Item};
#[cfg(any(test, feature = "test-utils"))]
pub use base::MockBase;
pub use client::{Deta, DetaBase, DEFAULT_HOST, DEFAULT_TIMEOUT_MS};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryBase;
pub use query::Query;
