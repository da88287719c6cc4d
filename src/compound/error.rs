//! Error types for classification record parsing.

use thiserror::Error;

/// Errors that can occur while building a [`Compound`](super::Compound) from raw JSON.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The raw document is not a JSON object (e.g. an empty array or `null`).
    #[error("classification data must be a JSON object, got {found}")]
    NotAnObject {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// The raw document has no `inchikey` key.
    #[error("InChIKey is required to build a compound, provided data has keys: [{keys}]")]
    MissingInchikey {
        /// Comma-separated keys present in the document, for diagnostics.
        keys: String,
    },

    /// The `inchikey` key is present but not a string.
    #[error("InChIKey must be a string, got {found}")]
    InchikeyNotString {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// The document does not match the classification schema.
    #[error("malformed classification for {inchikey}: {source}")]
    Malformed {
        /// InChIKey of the offending document.
        inchikey: String,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// The text is not JSON at all.
    #[error("invalid classification JSON: {source}")]
    InvalidJson {
        /// The underlying JSON syntax error.
        #[source]
        source: serde_json::Error,
    },
}

/// Names the JSON type of `value` for error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_inchikey_display_lists_keys() {
        let error = ParseError::MissingInchikey {
            keys: "smiles, kingdom".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("InChIKey is required"), "Unexpected: {msg}");
        assert!(msg.contains("smiles, kingdom"), "Expected keys in: {msg}");
    }

    #[test]
    fn test_json_kind_names() {
        assert_eq!(json_kind(&serde_json::json!(null)), "null");
        assert_eq!(json_kind(&serde_json::json!([])), "array");
        assert_eq!(json_kind(&serde_json::json!({})), "object");
        assert_eq!(json_kind(&serde_json::json!("x")), "string");
    }
}
