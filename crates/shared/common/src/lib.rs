//! Common utilities shared across the workspace.
//!
//! This crate provides:
//! - Unified error handling for the user adapter and its CLI
//! - Store configuration structures

pub mod config;
pub mod error;

pub use config::*;
pub use error::{AppError, AppResult, OptionExt};
