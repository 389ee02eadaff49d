use std::sync::Arc;

use futures::future;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, StorageOp};
use crate::files::FileRecord;
use crate::processor;
use crate::storage::s3::S3Backend;
use crate::storage::StorageBackend;

/// The upload provider the host pipeline drives.
///
/// One instance owns its configuration and its storage client. Calls
/// are independent of each other; nothing is shared across them beyond
/// the immutable config.
pub struct UploadProvider {
    config: ProviderConfig,
    backend: Arc<dyn StorageBackend>,
}

impl UploadProvider {
    /// Creates a provider backed by the S3 bucket named in `config`.
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        config.validate()?;
        let backend =
            S3Backend::new(&config).map_err(|e| ProviderError::Config(e.to_string()))?;

        Ok(Self {
            config,
            backend: Arc::new(backend),
        })
    }

    /// Creates a provider on top of an explicit storage backend.
    pub fn with_backend(
        config: ProviderConfig,
        backend: Arc<dyn StorageBackend>,
    ) -> Result<Self, ProviderError> {
        config.validate()?;
        Ok(Self { config, backend })
    }

    #[inline]
    pub fn cfg(&self) -> &ProviderConfig {
        &self.config
    }

    /// Stores every configured variant plus the original, then records
    /// the original's public URL on the file record.
    ///
    /// All-or-nothing: the call only resolves once every store call has
    /// settled, and on any failure the keys already written by this
    /// call are removed again (best effort) before the first error is
    /// returned. `file.url` is only touched on full success.
    pub async fn upload(&self, file: &mut FileRecord) -> Result<(), ProviderError> {
        let variants = match file.kind() {
            Some(kind) => processor::generate_variants(&self.config, kind, &file.data)?,
            // Formats outside the supported set still get the original stored.
            None => Vec::new(),
        };

        let keys: Vec<String> = variants
            .iter()
            .map(|variant| file.variant_key(&variant.suffix))
            .collect();

        let uploads = variants.iter().zip(&keys).map(|(variant, key)| {
            let backend = self.backend.clone();
            async move {
                backend
                    .store(key, variant.content_type(), variant.buff.clone())
                    .await
                    .map(|_| ())
                    .map_err(|cause| ProviderError::Storage {
                        op: StorageOp::Upload,
                        key: key.clone(),
                        cause,
                    })
            }
        });

        let results = future::join_all(uploads).await;
        let mut stored: Vec<String> = Vec::with_capacity(keys.len());
        let mut failure = None;
        for (key, result) in keys.iter().zip(results) {
            match result {
                Ok(()) => stored.push(key.clone()),
                Err(e) => match failure {
                    None => failure = Some(e),
                    Some(_) => warn!("Additional variant upload failure: {}", e),
                },
            }
        }

        if let Some(failure) = failure {
            self.rollback(&stored).await;
            return Err(failure);
        }

        let original_key = file.original_key();
        let url = match self
            .backend
            .store(&original_key, &file.content_type, file.data.clone())
            .await
        {
            Ok(url) => url,
            Err(cause) => {
                self.rollback(&keys).await;
                return Err(ProviderError::Storage {
                    op: StorageOp::Upload,
                    key: original_key,
                    cause,
                });
            }
        };

        file.url = Some(url);
        Ok(())
    }

    /// Deletes the original plus every variant the active configuration
    /// would have produced for this file.
    ///
    /// Keys are recomputed from configuration rather than listed from
    /// the store, so the config must still match the one in effect when
    /// the file was uploaded. Deleting keys that no longer exist is
    /// fine, the store's idempotent-delete semantics apply.
    pub async fn delete(&self, file: &FileRecord) -> Result<(), ProviderError> {
        let mut keys: Vec<String> = match file.kind() {
            Some(kind) => processor::variant_plan(&self.config, kind)
                .into_iter()
                .map(|(sizing, format)| {
                    file.variant_key(&processor::suffix_for(sizing, format))
                })
                .collect(),
            None => Vec::new(),
        };
        keys.push(file.original_key());

        let deletes = keys.iter().map(|key| {
            let backend = self.backend.clone();
            async move {
                backend
                    .delete(key)
                    .await
                    .map_err(|cause| ProviderError::Storage {
                        op: StorageOp::Delete,
                        key: key.clone(),
                        cause,
                    })
            }
        });

        let mut failure = None;
        for result in future::join_all(deletes).await {
            if let Err(e) = result {
                match failure {
                    None => failure = Some(e),
                    Some(_) => warn!("Additional delete failure: {}", e),
                }
            }
        }

        match failure {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }

    /// Best-effort removal of keys written before a failed upload.
    /// Failures here are logged, not escalated.
    async fn rollback(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.backend.delete(key).await {
                warn!("Failed to roll back variant @ {}: {}", key, e);
            }
        }
    }
}
