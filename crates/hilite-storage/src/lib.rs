//! Upload collaborators for rendered highlight parts.
//!
//! This crate provides:
//! - An `Uploader` trait returning one URL per uploaded file
//! - Cloudflare R2 (S3-compatible) uploads
//! - Local directory publishing for development and tests

pub mod client;
pub mod error;
pub mod fs_utils;
pub mod uploader;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use uploader::{upload_single, LocalUploader, R2Uploader, Uploader};
