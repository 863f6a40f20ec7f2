use anyhow::{Context, Result};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;

use super::ObjectStore;

/// [`ObjectStore`] backed by an S3 bucket.
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Store {
    /// Wraps an already-configured SDK client.
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Creates a store from the ambient AWS configuration (env vars,
    /// instance profile, etc.). Credentials are never passed explicitly.
    pub async fn from_env(bucket: impl Into<String>) -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(aws_sdk_s3::Client::new(&config), bucket)
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .with_context(|| format!("S3 PutObject failed for '{}/{key}'", self.bucket))?;

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let resp = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_no_such_key()) => {
                return Ok(None);
            }
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("S3 GetObject failed for '{}/{key}'", self.bucket));
            }
        };

        let data = resp
            .body
            .collect()
            .await
            .with_context(|| format!("reading S3 object body for '{}/{key}'", self.bucket))?;

        Ok(Some(data.into_bytes()))
    }
}
