//! S3 implementation of the object store

use super::{ObjectStore, StoreError, StoreResult};
use crate::aws::{classify_sdk_error, describe_sdk_error};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use aws_smithy_runtime_api::client::result::SdkError;
use tracing::debug;

/// Object store backed by Amazon S3
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Create a store from a loaded SDK configuration
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

/// Map a `GetObject` failure, keeping a missing key distinct
fn get_object_error(
    bucket: &str,
    key: &str,
    err: SdkError<GetObjectError, HttpResponse>,
) -> StoreError {
    if err
        .as_service_error()
        .is_some_and(|service| service.is_no_such_key())
    {
        return StoreError::NotFound {
            bucket: bucket.to_string(),
            key: key.to_string(),
        };
    }
    StoreError::Remote {
        operation: "GetObject".to_string(),
        bucket: bucket.to_string(),
        key: key.to_string(),
        error_type: classify_sdk_error(&err),
        message: describe_sdk_error(&err),
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> StoreResult<Vec<u8>> {
        debug!(bucket, key, "Getting object");

        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| get_object_error(bucket, key, err))?;

        let body = output.body.collect().await.map_err(|e| StoreError::Remote {
            operation: "GetObject".to_string(),
            bucket: bucket.to_string(),
            key: key.to_string(),
            error_type: crate::sync::retry::RetryErrorType::NetworkGeneric,
            message: format!("failed to read object body: {e}"),
        })?;

        Ok(body.into_bytes().to_vec())
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> StoreResult<()> {
        debug!(bucket, key, bytes = body.len(), "Putting object");

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| StoreError::Remote {
                operation: "PutObject".to_string(),
                bucket: bucket.to_string(),
                key: key.to_string(),
                error_type: classify_sdk_error(&err),
                message: describe_sdk_error(&err),
            })?;

        Ok(())
    }
}
