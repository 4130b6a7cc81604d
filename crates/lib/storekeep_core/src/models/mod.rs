//! Domain models shared by the services and stores.

pub mod auth;
pub mod product;
