//! Shared AWS SDK setup and error classification

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;
use aws_smithy_runtime_api::client::result::SdkError;
use std::time::Duration;
use tracing::debug;

use crate::sync::retry::RetryErrorType;

/// Load the ambient AWS configuration for a region.
///
/// Credentials come from the default provider chain. The SDK's own retry is
/// disabled because every call already runs under [`crate::sync::retry::with_retry`].
/// When `call_timeout` is set it bounds connecting and each attempt.
pub async fn load_sdk_config(region: &str, call_timeout: Option<Duration>) -> SdkConfig {
    debug!(region, ?call_timeout, "Loading AWS configuration");

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .retry_config(RetryConfig::disabled());

    if let Some(timeout) = call_timeout {
        loader = loader.timeout_config(
            TimeoutConfig::builder()
                .connect_timeout(timeout)
                .operation_attempt_timeout(timeout)
                .build(),
        );
    }

    loader.load().await
}

/// Classify an SDK error for retry decisions
pub fn classify_sdk_error<E>(err: &SdkError<E, HttpResponse>) -> RetryErrorType
where
    E: ProvideErrorMetadata,
{
    match err {
        SdkError::TimeoutError(_) => RetryErrorType::NetworkTimeout,
        SdkError::DispatchFailure(failure) => {
            if failure.is_timeout() {
                RetryErrorType::NetworkTimeout
            } else {
                RetryErrorType::NetworkOffline
            }
        }
        SdkError::ResponseError(_) => RetryErrorType::NetworkGeneric,
        SdkError::ServiceError(service) => {
            RetryErrorType::from_service(service.err().code(), service.raw().status().as_u16())
        }
        SdkError::ConstructionFailure(_) => RetryErrorType::InvalidResponse,
        _ => RetryErrorType::NetworkGeneric,
    }
}

/// Human readable message for an SDK error, including the service message when present
pub fn describe_sdk_error<E>(err: &SdkError<E, HttpResponse>) -> String
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (Some(code), None) => code.to_string(),
        (None, Some(message)) => message.to_string(),
        (None, None) => DisplayErrorContext(err).to_string(),
    }
}
