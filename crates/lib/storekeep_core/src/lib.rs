//! # storekeep_core
//!
//! Core domain logic for Storekeep.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod products;
pub mod store;
pub mod users;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
