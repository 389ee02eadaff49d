use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use rusoto_core::credential::StaticProvider;
use rusoto_core::{HttpClient, Region};
use rusoto_s3::{DeleteObjectRequest, PutObjectRequest, S3Client, S3};

use crate::config::ProviderConfig;
use crate::storage::StorageBackend;

/// A gateway onto an S3 (or S3-compatible) bucket.
///
/// Each instance owns its client and credentials; nothing is shared
/// through process-wide SDK state.
pub struct S3Backend {
    client: S3Client,
    bucket: String,
    region: String,
    endpoint: Option<String>,
}

impl S3Backend {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let region = config.region.trim().to_string();
        let endpoint = config
            .endpoint
            .as_deref()
            .map(|e| e.trim_end_matches('/').to_string());

        let client_region = match &endpoint {
            Some(endpoint) => Region::Custom {
                name: region.clone(),
                endpoint: endpoint.clone(),
            },
            None => region.parse()?,
        };

        let creds = StaticProvider::new_minimal(
            config.access_key.trim().to_string(),
            config.secret_key.trim().to_string(),
        );
        let client = S3Client::new_with(HttpClient::new()?, creds, client_region);

        Ok(Self {
            client,
            bucket: config.bucket.trim().to_string(),
            region,
            endpoint,
        })
    }

    /// The publicly resolvable URL of an object.
    ///
    /// Virtual-hosted style on AWS, path style behind a custom endpoint.
    fn object_url(&self, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint, self.bucket, key),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }
}

#[async_trait]
impl StorageBackend for S3Backend {
    async fn store(&self, key: &str, content_type: &str, data: Bytes) -> Result<String> {
        debug!("Storing object in bucket @ {}", key);
        let request = PutObjectRequest {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            body: Some(data.to_vec().into()),
            acl: Some("public-read".to_string()),
            content_type: Some(content_type.to_string()),
            ..Default::default()
        };

        self.client.put_object(request).await?;
        Ok(self.object_url(key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        debug!("Purging object in bucket @ {}", key);
        let request = DeleteObjectRequest {
            bucket: self.bucket.clone(),
            key: key.to_string(),
            ..Default::default()
        };

        self.client.delete_object(request).await?;
        Ok(())
    }
}
