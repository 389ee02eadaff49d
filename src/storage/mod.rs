pub mod memory;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;

/// The remote store the provider writes objects into.
///
/// Implementations make stored objects publicly readable under the
/// given content type and treat deleting a missing key as a no-op.
/// Neither operation retries; a single failure surfaces to the caller.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Stores `data` under `key` and returns its publicly resolvable URL.
    async fn store(&self, key: &str, content_type: &str, data: Bytes) -> anyhow::Result<String>;

    /// Removes the object under `key`, if any.
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
}
