//! Data models for the application
//!
//! This module contains the data structures exchanged between the upload
//! pipeline, the storage layer and the HTTP transport.

mod client;
mod file;
mod upload;

// Re-export all models for convenient imports
pub use client::*;
pub use file::*;
pub use upload::*;
