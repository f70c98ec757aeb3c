use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::debug;

use esglens_common::config::ObjectStoreConfig;
use esglens_common::EsgError;

/// S3-compatible object store (MinIO in deployment). Write-once per key:
/// the ingestion worker writes, the embeddings worker reads.
#[derive(Clone)]
pub struct ObjectStore {
    client: Client,
    bucket: String,
}

impl ObjectStore {
    pub fn new(config: &ObjectStoreConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "esglens",
        );

        let scheme = if config.secure { "https" } else { "http" };
        let endpoint = if config.endpoint.contains("://") {
            config.endpoint.clone()
        } else {
            format!("{scheme}://{}", config.endpoint)
        };

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(endpoint)
            .credentials_provider(credentials)
            .region(Region::new("us-east-1"))
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        }
    }

    /// Create the bucket when it does not exist yet. Idempotent.
    pub async fn ensure_bucket(&self) -> Result<(), EsgError> {
        if self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
        {
            return Ok(());
        }

        self.client
            .create_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| EsgError::ObjectStore(format!("create bucket failed: {e}")))?;
        Ok(())
    }

    pub async fn put(&self, key: &str, body: Vec<u8>) -> Result<(), EsgError> {
        debug!(key, bytes = body.len(), "PUT object");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type("application/pdf")
            .send()
            .await
            .map_err(|e| EsgError::ObjectStore(format!("put {key} failed: {e}")))?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Vec<u8>, EsgError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| EsgError::ObjectStore(format!("get {key} failed: {e}")))?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| EsgError::ObjectStore(format!("read {key} body failed: {e}")))?;
        Ok(bytes.into_bytes().to_vec())
    }
}
