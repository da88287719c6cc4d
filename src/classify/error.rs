//! Error types for the classify module.
//!
//! [`ClassifyError`] covers everything a single classification can run into,
//! from identifier validation to the empty answers the service sends for
//! compounds it has not classified yet.

use thiserror::Error;

use crate::batch::TableError;
use crate::compound::ParseError;
use crate::identifier::ConversionError;

use super::cache::CacheError;
use super::config::ConfigError;

/// Phrase the service and converters use for structures they refuse outright.
const MULTIPLE_RADICALS_MARKERS: [&str; 2] = ["multiple radicals", "attachment points"];

/// Errors that can occur while classifying a compound.
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The identifier does not match the InChIKey pattern.
    #[error("Invalid InChIKey: {inchikey}")]
    InvalidInchiKey {
        /// The rejected identifier.
        inchikey: String,
    },

    /// The SMILES string could not be converted to an InChIKey.
    #[error("Invalid SMILES: {smiles} ({reason})")]
    InvalidSmiles {
        /// The rejected SMILES.
        smiles: String,
        /// Converter's explanation.
        reason: String,
    },

    /// HTTP or transport failure talking to the classification service.
    #[error("Classification request for InChIKey '{inchikey}' failed: {detail}")]
    ApiRequest {
        /// InChIKey being classified.
        inchikey: String,
        /// HTTP status code, when a response arrived.
        status: Option<u16>,
        /// Human-readable failure description.
        detail: String,
        /// The underlying transport error, if any.
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The service knows the InChIKey but returned no classification.
    #[error("Empty classification for InChIKey: {inchikey}")]
    EmptyClassification {
        /// InChIKey with the empty answer.
        inchikey: String,
    },

    /// Empty classification for the InChIKey derived from a SMILES.
    #[error("Empty classification for SMILES: {smiles}")]
    EmptySmilesClassification {
        /// The SMILES the caller asked about.
        smiles: String,
        /// The empty classification of the derived InChIKey.
        #[source]
        source: Box<ClassifyError>,
    },

    /// The structure has several radicals or attachment points.
    #[error("Multiple radicals or attachment points are not supported: {identifier} ({detail})")]
    MultipleRadicalsOrAttachmentPointsNotSupported {
        /// InChIKey or SMILES that was refused.
        identifier: String,
        /// Where the refusal came from.
        detail: String,
    },

    /// The SMILES converter could not be reached or answered unexpectedly.
    #[error("SMILES conversion failed: {source}")]
    Conversion {
        /// The underlying conversion error.
        #[source]
        source: ConversionError,
    },

    /// The service answered with JSON that is not a valid classification.
    #[error("Unreadable classification for '{identifier}': {source}")]
    Parse {
        /// Identifier being classified.
        identifier: String,
        /// The underlying parse error.
        #[source]
        source: ParseError,
    },

    /// Reading or writing the result cache failed.
    #[error("Result cache failure: {source}")]
    Cache {
        /// The underlying cache error.
        #[source]
        source: CacheError,
    },

    /// A tabular input could not be read.
    #[error("Failed to read table: {source}")]
    Table {
        /// The underlying table error.
        #[source]
        source: TableError,
    },

    /// The client configuration is unusable.
    #[error("Invalid client configuration: {source}")]
    Config {
        /// The underlying configuration error.
        #[source]
        source: ConfigError,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {source}")]
    Client {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl ClassifyError {
    /// Creates an invalid-InChIKey error.
    pub fn invalid_inchikey(inchikey: impl Into<String>) -> Self {
        Self::InvalidInchiKey {
            inchikey: inchikey.into(),
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(inchikey: impl Into<String>, status: u16) -> Self {
        Self::ApiRequest {
            inchikey: inchikey.into(),
            status: Some(status),
            detail: format!("status code {status}"),
            source: None,
        }
    }

    /// Creates a transport error from a reqwest error.
    pub fn transport(inchikey: impl Into<String>, source: reqwest::Error) -> Self {
        let detail = if source.is_timeout() {
            "request timed out".to_string()
        } else if source.is_connect() {
            "connection failed".to_string()
        } else if source.is_decode() {
            "response body is not valid JSON".to_string()
        } else {
            "transport error".to_string()
        };
        Self::ApiRequest {
            inchikey: inchikey.into(),
            status: source.status().map(|status| status.as_u16()),
            detail,
            source: Some(source),
        }
    }

    /// Creates an empty-classification error.
    pub fn empty(inchikey: impl Into<String>) -> Self {
        Self::EmptyClassification {
            inchikey: inchikey.into(),
        }
    }

    /// Creates a multiple-radicals error.
    pub fn multiple_radicals(identifier: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MultipleRadicalsOrAttachmentPointsNotSupported {
            identifier: identifier.into(),
            detail: detail.into(),
        }
    }

    /// Returns true for either flavour of empty classification.
    ///
    /// This is the only error kind the batch retry pass recovers from.
    #[must_use]
    pub fn is_empty_classification(&self) -> bool {
        matches!(
            self,
            Self::EmptyClassification { .. } | Self::EmptySmilesClassification { .. }
        )
    }

    /// HTTP status code, when the error came from a service response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiRequest { status, .. } => *status,
            _ => None,
        }
    }
}

/// Returns true when `message` reports multiple radicals or attachment points.
pub(crate) fn reports_multiple_radicals(message: &str) -> bool {
    let lowered = message.to_ascii_lowercase();
    MULTIPLE_RADICALS_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_invalid_inchikey_display() {
        let error = ClassifyError::invalid_inchikey("NOT-A-KEY");
        assert_eq!(error.to_string(), "Invalid InChIKey: NOT-A-KEY");
    }

    #[test]
    fn test_http_status_display_and_status() {
        let error = ClassifyError::http_status("BSYNRYMUTXBXSQ-UHFFFAOYSA-N", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(
            msg.contains("BSYNRYMUTXBXSQ-UHFFFAOYSA-N"),
            "Expected InChIKey in: {msg}"
        );
        assert_eq!(error.status(), Some(404));
    }

    #[test]
    fn test_is_empty_classification_covers_both_variants() {
        let empty = ClassifyError::empty("BSYNRYMUTXBXSQ-UHFFFAOYSA-N");
        assert!(empty.is_empty_classification());

        let smiles = ClassifyError::EmptySmilesClassification {
            smiles: "CCO".to_string(),
            source: Box::new(ClassifyError::empty("LFQSCWFLJHTTHZ-UHFFFAOYSA-N")),
        };
        assert!(smiles.is_empty_classification());
        assert!(!ClassifyError::http_status("X", 500).is_empty_classification());
        assert!(!ClassifyError::invalid_inchikey("X").is_empty_classification());
    }

    #[test]
    fn test_empty_smiles_classification_keeps_cause() {
        let error = ClassifyError::EmptySmilesClassification {
            smiles: "CCO".to_string(),
            source: Box::new(ClassifyError::empty("LFQSCWFLJHTTHZ-UHFFFAOYSA-N")),
        };
        let cause = error.source().unwrap().to_string();
        assert!(
            cause.contains("LFQSCWFLJHTTHZ-UHFFFAOYSA-N"),
            "Expected derived key in cause: {cause}"
        );
    }

    #[test]
    fn test_reports_multiple_radicals_is_case_insensitive() {
        assert!(reports_multiple_radicals(
            "Structures with Multiple Radicals are not supported"
        ));
        assert!(reports_multiple_radicals("too many attachment points"));
        assert!(!reports_multiple_radicals("Not Found"));
    }
}
