//! Domain models for the panel.
//!
//! These are the core types shared across all crates.

pub mod oauth2_client;
pub mod permission;
pub mod scope;
pub mod session;
pub mod user;
