use std::fmt::{Display, Formatter};

use serde::Serialize;
use thiserror::Error;
use time::Date;

use crate::http_client::HttpError;
use crate::ProviderId;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Parameter and configuration errors raised before any request is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid provider '{value}', expected one of krx, opendart, naver")]
    InvalidProvider { value: String },

    #[error("rate limit capacity must be at least 1")]
    ZeroCapacity,
    #[error("rate limit refill rate must be greater than zero")]
    ZeroRefillRate,

    #[error("date range is reversed: {from} is after {to}")]
    ReversedDateRange { from: Date, to: Date },

    #[error("invalid value '{value}' for {field}")]
    InvalidValue { field: &'static str, value: String },

    #[error("{field} must not be empty")]
    EmptyValue { field: &'static str },
}

/// Closed set of failure kinds surfaced by the retrieval layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NetworkFailure,
    HttpErrorResponse,
    DecodeFailure,
    BulkDocumentParseFailure,
    ProviderReportedError,
    InvalidParameter,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NetworkFailure => "network_failure",
            Self::HttpErrorResponse => "http_error_response",
            Self::DecodeFailure => "decode_failure",
            Self::BulkDocumentParseFailure => "bulk_document_parse_failure",
            Self::ProviderReportedError => "provider_reported_error",
            Self::InvalidParameter => "invalid_parameter",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error returned by every provider operation.
///
/// Nothing in this crate retries on any variant. [`KfcError::retryable`] is a
/// hint for callers that implement their own retry loop.
#[derive(Debug, Error)]
pub enum KfcError {
    #[error("{provider} network failure: {source}")]
    NetworkFailure {
        provider: ProviderId,
        #[source]
        source: HttpError,
    },

    #[error("{provider} returned HTTP status {status}")]
    HttpErrorResponse { provider: ProviderId, status: u16 },

    #[error("{provider} response could not be decoded: {message}")]
    DecodeFailure {
        provider: ProviderId,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("bulk document could not be parsed: {message}")]
    BulkDocumentParseFailure {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("{provider} reported error {code}: {message}")]
    ProviderReportedError {
        provider: ProviderId,
        code: String,
        message: String,
    },

    #[error(transparent)]
    InvalidParameter(#[from] ValidationError),
}

impl KfcError {
    pub fn decode(provider: ProviderId, message: impl Into<String>) -> Self {
        Self::DecodeFailure {
            provider,
            message: message.into(),
            source: None,
        }
    }

    pub fn decode_with<E>(provider: ProviderId, message: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::DecodeFailure {
            provider,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn bulk(message: impl Into<String>) -> Self {
        Self::BulkDocumentParseFailure {
            message: message.into(),
            source: None,
        }
    }

    pub fn bulk_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::BulkDocumentParseFailure {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn provider_reported(
        provider: ProviderId,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ProviderReportedError {
            provider,
            code: code.into(),
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NetworkFailure { .. } => ErrorKind::NetworkFailure,
            Self::HttpErrorResponse { .. } => ErrorKind::HttpErrorResponse,
            Self::DecodeFailure { .. } => ErrorKind::DecodeFailure,
            Self::BulkDocumentParseFailure { .. } => ErrorKind::BulkDocumentParseFailure,
            Self::ProviderReportedError { .. } => ErrorKind::ProviderReportedError,
            Self::InvalidParameter(_) => ErrorKind::InvalidParameter,
        }
    }

    /// Provider that produced the failure, when it is attributable to one.
    pub const fn provider(&self) -> Option<ProviderId> {
        match self {
            Self::NetworkFailure { provider, .. }
            | Self::HttpErrorResponse { provider, .. }
            | Self::DecodeFailure { provider, .. }
            | Self::ProviderReportedError { provider, .. } => Some(*provider),
            Self::BulkDocumentParseFailure { .. } => Some(ProviderId::OpenDart),
            Self::InvalidParameter(_) => None,
        }
    }

    /// Stable numeric code, grouped by category (1xxx transport, 2xxx parse,
    /// 3xxx provider, 5xxx parameter).
    pub const fn code(&self) -> u16 {
        match self {
            Self::NetworkFailure { .. } => 1001,
            Self::HttpErrorResponse { .. } => 1004,
            Self::DecodeFailure { .. } => 2001,
            Self::BulkDocumentParseFailure { .. } => 2008,
            Self::ProviderReportedError { provider, .. } => match provider {
                ProviderId::Krx => 3001,
                ProviderId::OpenDart => 3002,
                ProviderId::Naver => 3003,
            },
            Self::InvalidParameter(_) => 5002,
        }
    }

    pub fn retryable(&self) -> bool {
        match self {
            Self::NetworkFailure { source, .. } => source.retryable(),
            Self::HttpErrorResponse { status, .. } => *status == 429 || *status >= 500,
            Self::DecodeFailure { .. }
            | Self::BulkDocumentParseFailure { .. }
            | Self::ProviderReportedError { .. }
            | Self::InvalidParameter(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_reported_codes_follow_provider() {
        let krx = KfcError::provider_reported(ProviderId::Krx, "E001", "bad bld");
        let dart = KfcError::provider_reported(ProviderId::OpenDart, "020", "limit exceeded");

        assert_eq!(krx.code(), 3001);
        assert_eq!(dart.code(), 3002);
        assert_eq!(dart.kind(), ErrorKind::ProviderReportedError);
        assert_eq!(dart.to_string(), "opendart reported error 020: limit exceeded");
    }

    #[test]
    fn only_transient_http_statuses_are_retryable() {
        let unavailable = KfcError::HttpErrorResponse {
            provider: ProviderId::Krx,
            status: 503,
        };
        let forbidden = KfcError::HttpErrorResponse {
            provider: ProviderId::Krx,
            status: 403,
        };

        assert!(unavailable.retryable());
        assert!(!forbidden.retryable());
    }

    #[test]
    fn decode_failure_keeps_its_cause() {
        let cause = serde_json::from_str::<serde_json::Value>("{").expect_err("truncated json");
        let error = KfcError::decode_with(ProviderId::Naver, "invalid body", cause);

        assert!(std::error::Error::source(&error).is_some());
        assert_eq!(error.code(), 2001);
    }
}
