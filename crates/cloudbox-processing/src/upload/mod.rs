//! Upload pipeline: validate → name → materialize directories → store → log.

pub mod pipeline;
pub mod types;

pub use pipeline::Placer;
pub use types::FileBlob;
