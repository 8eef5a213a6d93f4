//! Failure descriptors seen by a caller of a remote operation

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::DomainError;

/// Classification tag carried by every failure
///
/// Retry policies decide retryability from this tag alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FailureKind {
    /// The remote end refused the connection
    #[serde(rename = "connection-refused")]
    ConnectionRefused,
    /// Name resolution failed
    #[serde(rename = "unknown-host")]
    UnknownHost,
    /// Generic I/O failure
    #[serde(rename = "io")]
    Io,
    /// The call timed out (408/504 or a client-side timeout)
    #[serde(rename = "timeout")]
    Timeout,
    /// 5xx answer from the remote end
    #[serde(rename = "http-5xx")]
    ServerError,
    /// 4xx answer other than 408/429
    #[serde(rename = "http-4xx")]
    ClientError,
    /// 429 answer
    #[serde(rename = "rate-limited")]
    RateLimited,
    /// The client library flagged the failure as retryable
    #[serde(rename = "retryable")]
    Retryable,
    /// The call or the wait before it was cancelled
    #[serde(rename = "cancelled")]
    Cancelled,
    /// Anything else
    #[serde(rename = "other")]
    Other,
}

impl FailureKind {
    /// Every classification tag
    pub const ALL: [Self; 10] = [
        Self::ConnectionRefused,
        Self::UnknownHost,
        Self::Io,
        Self::Timeout,
        Self::ServerError,
        Self::ClientError,
        Self::RateLimited,
        Self::Retryable,
        Self::Cancelled,
        Self::Other,
    ];

    /// Tags retried by the stock policies
    pub const DEFAULT_RETRYABLE: [Self; 7] = [
        Self::ConnectionRefused,
        Self::UnknownHost,
        Self::Io,
        Self::Timeout,
        Self::ServerError,
        Self::RateLimited,
        Self::Retryable,
    ];

    /// Tag as written in configuration and logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConnectionRefused => "connection-refused",
            Self::UnknownHost => "unknown-host",
            Self::Io => "io",
            Self::Timeout => "timeout",
            Self::ServerError => "http-5xx",
            Self::ClientError => "http-4xx",
            Self::RateLimited => "rate-limited",
            Self::Retryable => "retryable",
            Self::Cancelled => "cancelled",
            Self::Other => "other",
        }
    }

    /// Classify an HTTP status
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            408 | 504 => Self::Timeout,
            429 => Self::RateLimited,
            500..=599 => Self::ServerError,
            400..=499 => Self::ClientError,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == tag)
            .or(match tag.as_str() {
                "feign-retryable" => Some(Self::Retryable),
                "server-error" => Some(Self::ServerError),
                "client-error" => Some(Self::ClientError),
                _ => None,
            })
            .ok_or_else(|| DomainError::UnknownFailureKind(s.to_string()))
    }
}

/// A failed invocation of a remote operation
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct Failure {
    /// Classification tag
    pub kind: FailureKind,
    /// Human readable detail
    pub message: String,
    /// HTTP status, when the failure came from an HTTP answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Advisory wait the remote end asked for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<Duration>,
}

impl Failure {
    /// Create a failure with the given tag
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            retry_after: None,
        }
    }

    /// Failure for an HTTP answer, classified by status
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(FailureKind::from_status(status), message).with_status(status)
    }

    /// Connection refused failure
    pub fn connection_refused(message: impl Into<String>) -> Self {
        Self::new(FailureKind::ConnectionRefused, message)
    }

    /// Timeout failure
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Timeout, message)
    }

    /// Cancellation failure
    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "operation cancelled")
    }

    /// Attach an HTTP status
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach an advisory retry-after value
    #[must_use]
    pub const fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    /// Check whether this failure carries the given tag
    pub fn is(&self, kind: FailureKind) -> bool {
        self.kind == kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_parse_from_config_strings() {
        assert_eq!("connection-refused".parse(), Ok(FailureKind::ConnectionRefused));
        assert_eq!("http-5xx".parse(), Ok(FailureKind::ServerError));
        assert_eq!("feign-retryable".parse(), Ok(FailureKind::Retryable));
        assert_eq!("RATE_LIMITED".parse(), Ok(FailureKind::RateLimited));
        assert!("meteor".parse::<FailureKind>().is_err());
    }

    #[test]
    fn every_tag_round_trips_through_str() {
        for kind in FailureKind::ALL {
            assert_eq!(kind.as_str().parse(), Ok(kind));
        }
    }

    #[test]
    fn serde_uses_tag_names() {
        let json = serde_json::to_string(&FailureKind::ServerError).unwrap();
        assert_eq!(json, "\"http-5xx\"");
        let kind: FailureKind = serde_json::from_str("\"unknown-host\"").unwrap();
        assert_eq!(kind, FailureKind::UnknownHost);
    }

    #[test]
    fn http_failures_are_classified_by_status() {
        assert_eq!(Failure::http(503, "down").kind, FailureKind::ServerError);
        assert_eq!(Failure::http(504, "slow").kind, FailureKind::Timeout);
        assert_eq!(Failure::http(408, "slow").kind, FailureKind::Timeout);
        assert_eq!(Failure::http(429, "busy").kind, FailureKind::RateLimited);
        assert_eq!(Failure::http(404, "gone").kind, FailureKind::ClientError);
        assert_eq!(Failure::http(503, "down").status, Some(503));
    }

    #[test]
    fn cancellation_is_not_retryable_by_default() {
        assert!(!FailureKind::DEFAULT_RETRYABLE.contains(&FailureKind::Cancelled));
        assert!(!FailureKind::DEFAULT_RETRYABLE.contains(&FailureKind::ClientError));
    }

    #[test]
    fn display_includes_tag_and_message() {
        let failure = Failure::timeout("read timed out");
        assert_eq!(failure.to_string(), "timeout: read timed out");
        assert!(failure.is(FailureKind::Timeout));
    }

    #[test]
    fn retry_after_is_attached() {
        let failure = Failure::http(503, "down").with_retry_after(Duration::from_secs(5));
        assert_eq!(failure.retry_after, Some(Duration::from_secs(5)));
    }
}
