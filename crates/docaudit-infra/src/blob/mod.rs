//! Blob storage backends

pub mod fs;

pub use fs::FsBlobStore;
