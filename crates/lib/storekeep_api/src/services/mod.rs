//! HTTP-side helpers shared by handlers.

pub mod cookies;
