//! Cloudbox Processing Library
//!
//! The upload admission and placement pipeline: content sniffing,
//! validation against the upload policy, storage key derivation and the
//! [`Placer`] that ties them to the store and the audit log.

pub mod naming;
pub mod sniff;
pub mod upload;
pub mod validator;

pub use naming::{Clock, PathNamer, RandomSource, SystemClock, ThreadRandom};
pub use sniff::sniff_mime_type;
pub use upload::{FileBlob, Placer};
pub use validator::UploadValidator;
