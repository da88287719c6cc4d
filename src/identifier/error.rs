//! Error types for SMILES conversion.

use thiserror::Error;

/// Errors raised while converting a SMILES string to an InChIKey.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The chemistry service understood the request and refused the structure.
    ///
    /// This is the only variant that means "not a valid SMILES".
    #[error("SMILES '{smiles}' could not be converted: {reason}")]
    Rejected {
        /// The SMILES that was rejected.
        smiles: String,
        /// Reason reported by the converter.
        reason: String,
    },

    /// Network-level failure talking to the conversion service.
    #[error("network error converting SMILES '{smiles}': {source}")]
    Network {
        /// The SMILES being converted.
        smiles: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The conversion request timed out.
    #[error("timeout converting SMILES '{smiles}'")]
    Timeout {
        /// The SMILES being converted.
        smiles: String,
    },

    /// The conversion service answered with an unexpected HTTP status.
    #[error("HTTP {status} converting SMILES '{smiles}'")]
    HttpStatus {
        /// The SMILES being converted.
        smiles: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The conversion service answered, but not with a usable InChIKey.
    #[error("unexpected conversion response for SMILES '{smiles}': {reason}")]
    UnexpectedResponse {
        /// The SMILES being converted.
        smiles: String,
        /// What was wrong with the response.
        reason: String,
    },

    /// The HTTP client for the conversion service could not be built.
    #[error("failed to build conversion HTTP client: {source}")]
    Client {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl ConversionError {
    /// Creates a rejection error.
    pub fn rejected(smiles: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            smiles: smiles.into(),
            reason: reason.into(),
        }
    }

    /// Maps a reqwest error to `Timeout` or `Network`.
    pub fn from_request(smiles: impl Into<String>, source: reqwest::Error) -> Self {
        let smiles = smiles.into();
        if source.is_timeout() {
            Self::Timeout { smiles }
        } else {
            Self::Network { smiles, source }
        }
    }

    /// Creates an unexpected-response error.
    pub fn unexpected(smiles: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            smiles: smiles.into(),
            reason: reason.into(),
        }
    }

    /// Returns whether the converter refused the structure itself.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Returns the rejection reason, if this is a rejection.
    #[must_use]
    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            Self::Rejected { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
