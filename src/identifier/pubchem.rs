//! SMILES conversion backed by the PubChem PUG REST service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::classify::RateLimiter;
use crate::user_agent;

use super::error::ConversionError;
use super::inchikey::{is_valid_inchikey, prefixed_inchikey};
use super::smiles::SmilesConverter;

/// Public PubChem endpoint.
pub const DEFAULT_PUBCHEM_BASE_URL: &str = "https://pubchem.ncbi.nlm.nih.gov";

/// PubChem asks clients to stay under five requests per second.
pub const PUBCHEM_MIN_INTERVAL: Duration = Duration::from_millis(200);

const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct PropertyResponse {
    #[serde(rename = "PropertyTable")]
    table: PropertyTable,
}

#[derive(Debug, Deserialize)]
struct PropertyTable {
    #[serde(rename = "Properties", default)]
    properties: Vec<Property>,
}

#[derive(Debug, Deserialize)]
struct Property {
    #[serde(rename = "InChIKey")]
    inchikey: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FaultResponse {
    #[serde(rename = "Fault")]
    fault: Fault,
}

#[derive(Debug, Deserialize)]
struct Fault {
    #[serde(rename = "Message", default)]
    message: String,
    #[serde(rename = "Details", default)]
    details: Vec<String>,
}

impl Fault {
    fn describe(&self) -> String {
        if self.details.is_empty() {
            self.message.clone()
        } else {
            format!("{}: {}", self.message, self.details.join("; "))
        }
    }
}

/// Converts SMILES through PubChem's property endpoint.
///
/// The SMILES travels in a form-encoded POST body, so stereo bonds (`/`, `\`)
/// and other path-hostile characters need no escaping in the URL.
pub struct PubChemConverter {
    client: Client,
    base_url: String,
    limiter: RateLimiter,
}

impl PubChemConverter {
    /// Creates a converter against the public PubChem endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Client`] when HTTP client construction fails.
    pub fn new(timeout: Duration) -> Result<Self, ConversionError> {
        Self::with_base_url(DEFAULT_PUBCHEM_BASE_URL, timeout)
    }

    /// Creates a converter against a custom endpoint (mirrors, tests).
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Client`] when HTTP client construction fails.
    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ConversionError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .timeout(timeout)
            .user_agent(user_agent::default_user_agent())
            .gzip(true)
            .build()
            .map_err(|source| ConversionError::Client { source })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limiter: RateLimiter::new(PUBCHEM_MIN_INTERVAL),
        })
    }

    /// Replaces the request limiter (e.g. `RateLimiter::disabled()` in tests).
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/rest/pug/compound/smiles/property/InChIKey/JSON",
            self.base_url
        )
    }
}

impl std::fmt::Debug for PubChemConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PubChemConverter")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SmilesConverter for PubChemConverter {
    #[instrument(skip(self), fields(converter = "pubchem"))]
    async fn to_inchikey(&self, smiles: &str) -> Result<String, ConversionError> {
        self.limiter.throttle().await;

        let body = format!("smiles={}", urlencoding::encode(smiles));
        let response = self
            .client
            .post(self.endpoint())
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|source| ConversionError::from_request(smiles, source))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| ConversionError::from_request(smiles, source))?;

        if !status.is_success() {
            let reason = serde_json::from_str::<FaultResponse>(&text)
                .map(|fault| fault.fault.describe())
                .unwrap_or_else(|_| format!("HTTP {}", status.as_u16()));
            debug!(status = status.as_u16(), reason = %reason, "PubChem refused conversion");

            // 400: unparseable structure, 404: nothing PubChem can standardize.
            return match status.as_u16() {
                400 | 404 => Err(ConversionError::rejected(smiles, reason)),
                code => Err(ConversionError::HttpStatus {
                    smiles: smiles.to_string(),
                    status: code,
                }),
            };
        }

        let parsed: PropertyResponse = serde_json::from_str(&text)
            .map_err(|error| ConversionError::unexpected(smiles, error.to_string()))?;

        let inchikey = parsed
            .table
            .properties
            .into_iter()
            .find_map(|property| property.inchikey)
            .ok_or_else(|| ConversionError::unexpected(smiles, "no InChIKey in response"))?;

        if !is_valid_inchikey(&inchikey) {
            return Err(ConversionError::unexpected(
                smiles,
                format!("malformed InChIKey '{inchikey}'"),
            ));
        }

        debug!(inchikey = %inchikey, "converted SMILES");
        Ok(prefixed_inchikey(&inchikey))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_describe_joins_details() {
        let fault: FaultResponse = serde_json::from_str(
            r#"{"Fault":{"Code":"PUGREST.BadRequest","Message":"Unable to standardize the given structure","Details":["bad ring closure"]}}"#,
        )
        .unwrap();
        assert_eq!(
            fault.fault.describe(),
            "Unable to standardize the given structure: bad ring closure"
        );
    }

    #[test]
    fn test_property_response_parses_inchikey() {
        let parsed: PropertyResponse = serde_json::from_str(
            r#"{"PropertyTable":{"Properties":[{"CID":2244,"InChIKey":"BSYNRYMUTXBXSQ-UHFFFAOYSA-N"}]}}"#,
        )
        .unwrap();
        assert_eq!(
            parsed.table.properties[0].inchikey.as_deref(),
            Some("BSYNRYMUTXBXSQ-UHFFFAOYSA-N")
        );
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let converter =
            PubChemConverter::with_base_url("http://localhost:1234/", Duration::from_secs(5))
                .unwrap();
        assert_eq!(
            converter.endpoint(),
            "http://localhost:1234/rest/pug/compound/smiles/property/InChIKey/JSON"
        );
    }
}
