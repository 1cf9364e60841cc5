//! Panel Core — domain models, repository traits and the error type
//! shared by every panel crate.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{ErrorResponse, PanelError, PanelResult};
