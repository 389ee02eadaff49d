//! An S3 upload provider that refracts uploaded images into a set of
//! optimised, resized variants.
//!
//! Given a file record from the host pipeline, [`UploadProvider::upload`]
//! derives one encoded variant per configured sizing (plus a WebP twin for
//! each when enabled), stores every variant and the original in the bucket
//! under deterministic keys, and records the original's public URL on the
//! record. [`UploadProvider::delete`] reconstructs the exact same key set
//! from configuration and removes it again — no listing, no manifest.

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;
pub mod files;
pub mod processor;
pub mod storage;

mod provider;

#[cfg(test)]
mod tests;

pub use crate::config::{ProviderConfig, ResizeFilter, SizingConfig};
pub use crate::error::{ProviderError, StorageOp};
pub use crate::files::{FileRecord, ImageKind};
pub use crate::provider::UploadProvider;
pub use crate::storage::StorageBackend;
