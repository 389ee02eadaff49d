use thiserror::Error;

use crate::files::ImageKind;

/// Everything that can go wrong inside one `upload` or `delete` call.
///
/// Encode and storage failures carry the offending sizing, format or
/// object key so the host can diagnose them without extra digging.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid provider config: {0}")]
    Config(String),

    #[error("failed to decode source image as {format}: {cause}")]
    Decode {
        format: ImageKind,
        cause: anyhow::Error,
    },

    #[error("failed to encode {width}x{height} {format} variant: {cause}")]
    Encode {
        width: u32,
        height: u32,
        format: ImageKind,
        cause: anyhow::Error,
    },

    #[error("storage {op} failed for key {key}: {cause}")]
    Storage {
        op: StorageOp,
        key: String,
        cause: anyhow::Error,
    },
}

/// The object-store operation a [`ProviderError::Storage`] came from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum StorageOp {
    Upload,
    Delete,
}
