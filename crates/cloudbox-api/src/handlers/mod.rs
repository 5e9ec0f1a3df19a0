pub mod files;
pub mod public_file;
pub mod upload;
