//! Cloudbox API Library
//!
//! This crate provides the HTTP handlers, middleware wiring and application
//! setup for the Cloudbox upload service.

mod api_doc;
pub mod constants;
mod handlers;
pub mod setup;
mod utils;

pub mod error;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
