//! Error code value object
//!
//! The failure classes the fault injector can simulate, each mapped to the
//! HTTP status an unreliable upstream would answer with.
//!
//! # Examples
//!
//! ```
//! use domain::value_objects::ErrorCode;
//!
//! let code: ErrorCode = "503".parse().expect("known code");
//! assert_eq!(code, ErrorCode::ServiceUnavailable);
//! assert_eq!(code.status(), 503);
//!
//! // Unknown codes are rejected here; the injector decides how to fall back
//! assert!("418".parse::<ErrorCode>().is_err());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::entities::FailureKind;
use crate::errors::DomainError;

/// Simulated failure class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// 503 - temporary overload or maintenance
    #[default]
    ServiceUnavailable,
    /// 500
    InternalError,
    /// 502
    BadGateway,
    /// 504
    GatewayTimeout,
    /// 429
    TooManyRequests,
    /// 408
    RequestTimeout,
}

impl ErrorCode {
    /// All simulated failure classes
    pub const ALL: [Self; 6] = [
        Self::ServiceUnavailable,
        Self::InternalError,
        Self::BadGateway,
        Self::GatewayTimeout,
        Self::TooManyRequests,
        Self::RequestTimeout,
    ];

    /// HTTP status code for this failure class
    #[must_use]
    pub const fn status(self) -> u16 {
        match self {
            Self::ServiceUnavailable => 503,
            Self::InternalError => 500,
            Self::BadGateway => 502,
            Self::GatewayTimeout => 504,
            Self::TooManyRequests => 429,
            Self::RequestTimeout => 408,
        }
    }

    /// Standard reason phrase for the status
    #[must_use]
    pub const fn reason_phrase(self) -> &'static str {
        match self {
            Self::ServiceUnavailable => "Service Unavailable",
            Self::InternalError => "Internal Server Error",
            Self::BadGateway => "Bad Gateway",
            Self::GatewayTimeout => "Gateway Timeout",
            Self::TooManyRequests => "Too Many Requests",
            Self::RequestTimeout => "Request Timeout",
        }
    }

    /// Whether this class simulates a hard timeout
    ///
    /// Timeout classes additionally wait for the configured timeout delay.
    #[must_use]
    pub const fn is_timeout(self) -> bool {
        matches!(self, Self::GatewayTimeout | Self::RequestTimeout)
    }

    /// Classification tag a caller sees when this failure reaches it
    #[must_use]
    pub const fn failure_kind(self) -> FailureKind {
        match self {
            Self::GatewayTimeout | Self::RequestTimeout => FailureKind::Timeout,
            Self::TooManyRequests => FailureKind::RateLimited,
            Self::ServiceUnavailable | Self::InternalError | Self::BadGateway => {
                FailureKind::ServerError
            },
        }
    }

    /// Look up the failure class for an HTTP status
    #[must_use]
    pub fn from_status(status: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.status() == status)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status(), self.reason_phrase())
    }
}

impl FromStr for ErrorCode {
    type Err = DomainError;

    /// Accepts the numeric status (`"503"`) or the class name
    /// (`"SERVICE_UNAVAILABLE"`, case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(status) = trimmed.parse::<u16>() {
            return Self::from_status(status)
                .ok_or_else(|| DomainError::UnknownErrorCode(trimmed.to_string()));
        }

        match trimmed.to_ascii_uppercase().replace('-', "_").as_str() {
            "SERVICE_UNAVAILABLE" => Ok(Self::ServiceUnavailable),
            "INTERNAL_ERROR" | "INTERNAL_SERVER_ERROR" => Ok(Self::InternalError),
            "BAD_GATEWAY" => Ok(Self::BadGateway),
            "GATEWAY_TIMEOUT" => Ok(Self::GatewayTimeout),
            "TOO_MANY_REQUESTS" => Ok(Self::TooManyRequests),
            "REQUEST_TIMEOUT" => Ok(Self::RequestTimeout),
            _ => Err(DomainError::UnknownErrorCode(trimmed.to_string())),
        }
    }
}
