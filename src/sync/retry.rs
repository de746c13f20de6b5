//! Bounded retry for remote calls, plus the message formatting used when
//! logging retry attempts.
//!
//! Every call to the log directory or the object store goes through
//! [`with_retry`]. Errors classify themselves via [`RemoteError`]; only
//! retryable classes are attempted again.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::config::{
    backoff_between, DEFAULT_CALL_TIMEOUT_SECS, INITIAL_BACKOFF_MS, MAX_BACKOFF_MS, MAX_RETRIES,
};

/// Classification of remote errors for retry decisions and user messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryErrorType {
    /// Call timed out (client-side or transport timeout)
    NetworkTimeout,
    /// Connection refused, DNS failure, or other dispatch failures
    NetworkOffline,
    /// Throttled by the service
    Throttled,
    /// HTTP 5xx from the service
    ServerError(u16),
    /// The addressed resource does not exist
    NotFound,
    /// Authentication or authorization failure (401/403)
    AuthFailed(u16),
    /// Other client errors (4xx)
    ClientError(u16),
    /// Request could not be built or the response made no sense
    InvalidResponse,
    /// Generic fallback when no better classification fits
    NetworkGeneric,
}

impl RetryErrorType {
    /// User-friendly description string used inside retry log messages.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "network timeout",
            Self::NetworkOffline => "connection failed",
            Self::Throttled => "request throttled",
            Self::ServerError(code) => match code {
                500 => "internal server error",
                502 => "bad gateway",
                503 => "service unavailable",
                504 => "gateway timeout",
                _ => "server error",
            },
            Self::NotFound => "resource not found",
            Self::AuthFailed(code) => match code {
                401 => "authentication failed (401)",
                403 => "access denied (403)",
                _ => "authentication failed",
            },
            Self::ClientError(_) => "client error",
            Self::InvalidResponse => "invalid request or response",
            Self::NetworkGeneric => "network error",
        }
    }

    /// Suggested remediation presented after final failures.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "Check network reachability of the AWS endpoints or raise --call-timeout-secs",
            Self::NetworkOffline => "Verify connectivity and DNS resolution for the AWS endpoints",
            Self::Throttled => "Reduce concurrent API usage in the account or raise --max-retries",
            Self::ServerError(_) => "The AWS service may be degraded, try again later",
            Self::NotFound => "Check the bucket, instance identifier, and region",
            Self::AuthFailed(_) => "Verify the IAM permissions of the ambient AWS credentials",
            Self::ClientError(_) => "Review the request parameters",
            Self::InvalidResponse => "Report the response; the remote returned data that cannot be used",
            Self::NetworkGeneric => "Check network connectivity and try again",
        }
    }

    /// Determine whether the error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RetryErrorType::NetworkTimeout
                | RetryErrorType::NetworkOffline
                | RetryErrorType::Throttled
                | RetryErrorType::ServerError(_)
                | RetryErrorType::NetworkGeneric
        )
    }

    /// Classify a service response by its error code and HTTP status
    pub fn from_service(code: Option<&str>, status: u16) -> Self {
        if let Some(code) = code {
            match code {
                "NoSuchKey" | "NoSuchBucket" | "NotFound" | "DBInstanceNotFound"
                | "DBInstanceNotFoundFault" | "DBLogFileNotFoundFault" => {
                    return RetryErrorType::NotFound;
                }
                "Throttling" | "ThrottlingException" | "ThrottledException" | "SlowDown"
                | "RequestLimitExceeded" | "TooManyRequestsException"
                | "RequestThrottled" => return RetryErrorType::Throttled,
                "AccessDenied" | "AccessDeniedException" | "InvalidAccessKeyId"
                | "SignatureDoesNotMatch" | "ExpiredToken" | "ExpiredTokenException" => {
                    return RetryErrorType::AuthFailed(if status == 0 { 403 } else { status });
                }
                _ => {}
            }
        }

        match status {
            404 => RetryErrorType::NotFound,
            401 | 403 => RetryErrorType::AuthFailed(status),
            429 => RetryErrorType::Throttled,
            500..=599 => RetryErrorType::ServerError(status),
            400..=499 => RetryErrorType::ClientError(status),
            _ => RetryErrorType::NetworkGeneric,
        }
    }
}

impl fmt::Display for RetryErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Errors returned by remote collaborators
pub trait RemoteError: std::error::Error {
    /// Classification of this error
    fn error_type(&self) -> RetryErrorType;

    /// Build the error reported when a call exceeds its timeout
    fn timed_out(operation: &str, after: Duration) -> Self;
}

/// Retry bounds applied to every remote call
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// First backoff delay
    pub initial_backoff: Duration,
    /// Backoff ceiling
    pub max_backoff: Duration,
    /// Timeout for each attempt
    pub call_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(MAX_BACKOFF_MS),
            call_timeout: Some(Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS)),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries and never times out
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            call_timeout: None,
        }
    }

    /// Total number of attempts including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Backoff before retry number `retry_count` (0-based)
    pub fn backoff(&self, retry_count: u32) -> Duration {
        backoff_between(self.initial_backoff, self.max_backoff, retry_count)
    }
}

/// Context for formatting retry messages.
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// Current attempt number (1-based)
    pub attempt: u32,
    /// Maximum number of attempts configured
    pub max_attempts: u32,
    /// Type of error that triggered retry
    pub error_type: RetryErrorType,
    /// Backoff duration until next attempt
    pub backoff_duration: Duration,
    /// Remote operation (e.g., "DownloadDBLogFilePortion")
    pub operation: String,
    /// What the operation addressed (instance, file, or object key)
    pub target: String,
    /// Original error message for details
    pub error_message: String,
}

impl RetryContext {
    /// Format standardized retry message with attempt counters and context.
    pub fn format_retry(&self) -> String {
        format!(
            "Retrying {} (attempt {}/{}) after {} - waiting {:.1} seconds... ({})",
            self.operation,
            self.attempt + 1,
            self.max_attempts,
            self.error_type.description(),
            self.backoff_duration.as_secs_f64(),
            self.target_display()
        )
    }

    /// Format retry success message when a previous attempt eventually works.
    pub fn format_success(&self) -> String {
        format!(
            "{} succeeded on attempt {}/{} ({})",
            self.operation,
            self.attempt,
            self.max_attempts,
            self.target_display()
        )
    }

    /// Format final failure summary with actionable suggestions.
    pub fn format_failure(&self) -> String {
        let mut lines = Vec::new();
        lines.push(format!(
            "[FAILED] {} failed after {} attempt(s)",
            self.operation, self.attempt
        ));
        lines.push(format!("  Last error: {}", self.error_message));
        lines.push(format!("  Target: {}", self.target_display()));
        lines.push("  Suggestions:".to_string());
        lines.push(format!("    - {}", self.error_type.suggestion()));
        if self.error_type.is_retryable() {
            lines.push(format!(
                "    - Try increasing --max-retries (current attempts: {})",
                self.max_attempts
            ));
        }
        lines.join("\n")
    }

    fn target_display(&self) -> &str {
        if self.target.is_empty() {
            "unknown"
        } else {
            &self.target
        }
    }
}

/// Run a remote call under the retry policy.
///
/// Each attempt is bounded by `policy.call_timeout`. Non-retryable errors are
/// returned immediately; retryable ones are retried with exponential backoff
/// until attempts run out.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    target: &str,
    mut call: F,
) -> Result<T, E>
where
    E: RemoteError,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        let result = match policy.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, call()).await {
                Ok(result) => result,
                Err(_) => Err(E::timed_out(operation, limit)),
            },
            None => call().await,
        };

        let error = match result {
            Ok(value) => {
                if attempt > 1 {
                    let context = RetryContext {
                        attempt,
                        max_attempts,
                        error_type: RetryErrorType::NetworkGeneric,
                        backoff_duration: Duration::ZERO,
                        operation: operation.to_string(),
                        target: target.to_string(),
                        error_message: String::new(),
                    };
                    info!("{}", context.format_success());
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        let error_type = error.error_type();
        let backoff = policy.backoff(attempt - 1);
        let context = RetryContext {
            attempt,
            max_attempts,
            error_type,
            backoff_duration: backoff,
            operation: operation.to_string(),
            target: target.to_string(),
            error_message: error.to_string(),
        };

        if !error_type.is_retryable() {
            debug!(
                operation,
                target,
                error_type = %error_type,
                "Remote call failed with non-retryable error"
            );
            return Err(error);
        }

        if attempt >= max_attempts {
            warn!("{}", context.format_failure());
            return Err(error);
        }

        warn!("{}", context.format_retry());
        crate::metrics::record_retry(operation, attempt);
        tokio::time::sleep(backoff).await;
    }
}
