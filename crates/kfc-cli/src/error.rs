use kfc_core::{ErrorKind, KfcError, ValidationError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("[{}] {source}", .source.kind())]
    Provider {
        #[from]
        source: KfcError,
    },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Provider { source } => match source.kind() {
                ErrorKind::InvalidParameter => 2,
                ErrorKind::NetworkFailure | ErrorKind::HttpErrorResponse => 3,
                ErrorKind::DecodeFailure | ErrorKind::BulkDocumentParseFailure => 4,
                ErrorKind::ProviderReportedError => 5,
            },
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use kfc_core::ProviderId;

    use super::*;

    #[test]
    fn provider_errors_map_by_kind() {
        let reported = CliError::from(KfcError::provider_reported(ProviderId::OpenDart, "020", "limit"));
        let invalid = CliError::from(KfcError::from(ValidationError::EmptyValue { field: "ticker" }));
        let transport = CliError::from(KfcError::HttpErrorResponse {
            provider: ProviderId::Krx,
            status: 503,
        });

        assert_eq!(reported.exit_code(), 5);
        assert_eq!(invalid.exit_code(), 2);
        assert_eq!(transport.exit_code(), 3);
        assert!(reported.to_string().starts_with("[provider_reported_error]"));
    }
}
