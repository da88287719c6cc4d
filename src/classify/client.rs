//! Single-identifier classification requests.
//!
//! [`ClassyFireClient`] validates the identifier, consults the result cache,
//! spaces requests with its [`RateLimiter`], and interprets the service's
//! answer. Batch entry points live in [`crate::batch`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::compound::Compound;
use crate::identifier::{
    PubChemConverter, SmilesConverter, convert_smiles_to_inchikey, has_multiple_radical_sites,
    is_valid_inchikey, normalize_inchikey, radical_site_count,
};

use super::cache::{DiskCache, ResultCache};
use super::config::{ClientConfig, EmptyClassificationPolicy};
use super::error::{ClassifyError, reports_multiple_radicals};
use super::rate_limiter::RateLimiter;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Longest service message kept in an error detail.
const MAX_DETAIL_CHARS: usize = 200;

/// Client for the ClassyFire entity endpoint.
///
/// Requests are issued one at a time; the client is meant to be driven
/// sequentially, including by the lazy batches built on top of it.
///
/// # Example
///
/// ```no_run
/// use classyfire::{ClassyFireClient, ClientConfig};
///
/// # async fn example() -> Result<(), classyfire::ClassifyError> {
/// let client = ClassyFireClient::new(ClientConfig::default())?;
/// let aspirin = client.classify_inchikey("BSYNRYMUTXBXSQ-UHFFFAOYSA-N").await?;
/// println!("{}", aspirin.short_summary());
/// # Ok(())
/// # }
/// ```
pub struct ClassyFireClient {
    config: ClientConfig,
    http: Client,
    limiter: RateLimiter,
    cache: Option<Arc<dyn ResultCache>>,
    converter: Arc<dyn SmilesConverter>,
}

impl std::fmt::Debug for ClassyFireClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassyFireClient")
            .field("config", &self.config)
            .field("cached", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

impl ClassyFireClient {
    /// Creates a client from `config`.
    ///
    /// Uses a [`DiskCache`] at `config.cache_dir` (if set) and a
    /// [`PubChemConverter`] for SMILES.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::Config`] for invalid settings and
    /// [`ClassifyError::Client`] / [`ClassifyError::Conversion`] when an HTTP
    /// client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClassifyError> {
        config
            .validate()
            .map_err(|source| ClassifyError::Config { source })?;

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(config.timeout))
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .gzip(true)
            .build()
            .map_err(|source| ClassifyError::Client { source })?;

        let converter = PubChemConverter::new(config.timeout)
            .map_err(|source| ClassifyError::Conversion { source })?;

        let cache = config
            .cache_dir
            .as_ref()
            .map(|dir| Arc::new(DiskCache::new(dir)) as Arc<dyn ResultCache>);

        let limiter = RateLimiter::new(config.sleep).with_progress(config.verbose);

        info!(
            base_url = %config.base_url,
            policy = %config.policy,
            cached = cache.is_some(),
            "ClassyFire client ready"
        );

        Ok(Self {
            config,
            http,
            limiter,
            cache,
            converter: Arc::new(converter),
        })
    }

    /// Replaces the SMILES converter.
    #[must_use]
    pub fn with_converter(mut self, converter: Arc<dyn SmilesConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// Replaces the result cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Disables the result cache.
    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    /// Client settings.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Entity URL for `inchikey`.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::InvalidInchiKey`] when `inchikey` is malformed.
    pub fn build_url(&self, inchikey: &str) -> Result<String, ClassifyError> {
        let key = normalize_inchikey(inchikey);
        if !is_valid_inchikey(key) {
            return Err(ClassifyError::invalid_inchikey(inchikey));
        }
        Ok(format!("{}/entities/{key}.json", self.config.base_url))
    }

    /// Fetches the raw classification document for `inchikey`.
    ///
    /// Cached documents are returned without a request or a rate-limit wait;
    /// an empty cached document counts as a miss.
    /// Empty answers follow the configured [`EmptyClassificationPolicy`] and
    /// are never cached.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::InvalidInchiKey`], [`ClassifyError::ApiRequest`],
    /// [`ClassifyError::EmptyClassification`],
    /// [`ClassifyError::MultipleRadicalsOrAttachmentPointsNotSupported`] or
    /// [`ClassifyError::Cache`].
    #[instrument(skip(self))]
    pub async fn classify_raw(&self, inchikey: &str) -> Result<Value, ClassifyError> {
        let url = self.build_url(inchikey)?;
        let key = normalize_inchikey(inchikey);

        if let Some(cache) = &self.cache
            && let Some(cached) = cache
                .get(key)
                .await
                .map_err(|source| ClassifyError::Cache { source })?
        {
            if !is_empty_classification(&cached) {
                debug!(inchikey = key, "classification served from cache");
                return Ok(cached);
            }
            debug!(inchikey = key, "cached classification is empty, requesting again");
        }

        self.limiter.throttle().await;
        debug!(url = %url, "requesting classification");

        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| ClassifyError::transport(key, source))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ClassifyError::transport(key, source))?;

        if !status.is_success() {
            if reports_multiple_radicals(&body) {
                return Err(ClassifyError::multiple_radicals(key, excerpt(&body)));
            }
            return Err(ClassifyError::http_status(key, status.as_u16()));
        }

        let value = if body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str::<Value>(&body).map_err(|_| {
                if reports_multiple_radicals(&body) {
                    ClassifyError::multiple_radicals(key, excerpt(&body))
                } else {
                    ClassifyError::ApiRequest {
                        inchikey: key.to_string(),
                        status: Some(status.as_u16()),
                        detail: "response body is not valid JSON".to_string(),
                        source: None,
                    }
                }
            })?
        };

        if is_empty_classification(&value) {
            return self.on_empty_classification(key, value);
        }

        if value.get("inchikey").is_none() && reports_multiple_radicals(&body) {
            return Err(ClassifyError::multiple_radicals(key, excerpt(&body)));
        }

        if let Some(cache) = &self.cache {
            cache
                .put(key, &value)
                .await
                .map_err(|source| ClassifyError::Cache { source })?;
        }
        Ok(value)
    }

    fn on_empty_classification(&self, inchikey: &str, value: Value) -> Result<Value, ClassifyError> {
        match self.config.policy {
            EmptyClassificationPolicy::Raise => Err(ClassifyError::empty(inchikey)),
            EmptyClassificationPolicy::Warn => {
                warn!(inchikey, "Empty classification");
                Err(ClassifyError::empty(inchikey))
            }
            EmptyClassificationPolicy::Ignore => {
                debug!(inchikey, "empty classification ignored");
                Ok(value)
            }
            EmptyClassificationPolicy::RetryLast => {
                warn!(
                    inchikey,
                    "Empty classification, will retry at the end of the batch"
                );
                Err(ClassifyError::empty(inchikey))
            }
        }
    }

    /// Classifies one InChIKey.
    ///
    /// # Errors
    ///
    /// Everything [`classify_raw`](Self::classify_raw) returns, plus
    /// [`ClassifyError::Parse`] when the document is not a classification
    /// (including the empty document passed through under `ignore`).
    pub async fn classify_inchikey(&self, inchikey: &str) -> Result<Compound, ClassifyError> {
        let raw = self.classify_raw(inchikey).await?;
        Compound::from_value(&raw).map_err(|source| ClassifyError::Parse {
            identifier: normalize_inchikey(inchikey).to_string(),
            source,
        })
    }

    /// Classifies one SMILES string through its InChIKey.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::InvalidSmiles`] when the converter rejects the
    /// structure, [`ClassifyError::MultipleRadicalsOrAttachmentPointsNotSupported`]
    /// for structures with several open valences, and
    /// [`ClassifyError::EmptySmilesClassification`] wrapping an empty answer
    /// for the derived key. Other errors pass through from
    /// [`classify_inchikey`](Self::classify_inchikey).
    #[instrument(skip(self))]
    pub async fn classify_smiles(&self, smiles: &str) -> Result<Compound, ClassifyError> {
        if has_multiple_radical_sites(smiles) {
            return Err(ClassifyError::multiple_radicals(
                smiles,
                format!(
                    "{} radical sites or attachment points",
                    radical_site_count(smiles)
                ),
            ));
        }

        let inchikey = self.smiles_to_inchikey(smiles).await?;
        debug!(inchikey = %inchikey, "SMILES converted");

        match self.classify_inchikey(&inchikey).await {
            Err(error @ ClassifyError::EmptyClassification { .. }) => {
                Err(ClassifyError::EmptySmilesClassification {
                    smiles: smiles.to_string(),
                    source: Box::new(error),
                })
            }
            other => other,
        }
    }

    /// Converts `smiles`, mapping converter failures onto [`ClassifyError`].
    pub(crate) async fn smiles_to_inchikey(&self, smiles: &str) -> Result<String, ClassifyError> {
        match convert_smiles_to_inchikey(self.converter.as_ref(), smiles).await {
            Ok(inchikey) => Ok(inchikey),
            Err(error) => match error.rejection_reason() {
                Some(reason) if reports_multiple_radicals(reason) => {
                    Err(ClassifyError::multiple_radicals(smiles, reason))
                }
                Some(reason) => Err(ClassifyError::InvalidSmiles {
                    smiles: smiles.to_string(),
                    reason: reason.to_string(),
                }),
                None => Err(ClassifyError::Conversion { source: error }),
            },
        }
    }

    /// Waits before a deferred retry round, with a countdown when verbose.
    pub(crate) async fn wait_before_retry(&self) {
        crate::progress::wait_with_progress(
            self.config.retry_delay,
            "Waiting before retry",
            self.config.verbose,
        )
        .await;
    }
}

/// Whether the service answered with nothing: `null`, `false`, `0`, `""`, `[]` or `{}`.
#[must_use]
pub fn is_empty_classification(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_DETAIL_CHARS {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(MAX_DETAIL_CHARS).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn offline_client() -> ClassyFireClient {
        ClassyFireClient::new(
            ClientConfig::default()
                .with_base_url("http://localhost:9")
                .with_sleep(Duration::ZERO)
                .without_cache(),
        )
        .unwrap()
    }

    #[test]
    fn test_build_url_strips_prefix() {
        let client = offline_client();
        assert_eq!(
            client
                .build_url("InChIKey=BSYNRYMUTXBXSQ-UHFFFAOYSA-N")
                .unwrap(),
            "http://localhost:9/entities/BSYNRYMUTXBXSQ-UHFFFAOYSA-N.json"
        );
    }

    #[test]
    fn test_build_url_rejects_malformed_key() {
        let client = offline_client();
        let error = client.build_url("BSYNRYMUTXBXSQ").unwrap_err();
        assert!(matches!(error, ClassifyError::InvalidInchiKey { .. }));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let error = ClassyFireClient::new(ClientConfig::default().with_max_attempts(0)).unwrap_err();
        assert!(matches!(error, ClassifyError::Config { .. }), "got {error:?}");
    }

    #[test]
    fn test_is_empty_classification_falsy_values() {
        assert!(is_empty_classification(&json!(null)));
        assert!(is_empty_classification(&json!({})));
        assert!(is_empty_classification(&json!([])));
        assert!(is_empty_classification(&json!("")));
        assert!(is_empty_classification(&json!(false)));
        assert!(is_empty_classification(&json!(0)));
        assert!(!is_empty_classification(&json!({"inchikey": "X"})));
        assert!(!is_empty_classification(&json!([1])));
        assert!(!is_empty_classification(&json!(true)));
    }

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let long = "x".repeat(500);
        let short = excerpt(&long);
        assert!(short.ends_with("..."));
        assert_eq!(short.chars().count(), MAX_DETAIL_CHARS + 3);
        assert_eq!(excerpt("  short  "), "short");
    }

    #[tokio::test]
    async fn test_invalid_inchikey_fails_before_any_request() {
        let client = offline_client();
        let error = client.classify_raw("not-an-inchikey").await.unwrap_err();
        assert!(matches!(error, ClassifyError::InvalidInchiKey { .. }));
    }

    #[tokio::test]
    async fn test_multiple_radical_smiles_fails_before_conversion() {
        let client = offline_client();
        let error = client
            .classify_smiles("[C]C([C])=[C]C(=O)[C]C([C])([O])[C]1[C]Oc2oc3cccc([C])c3c(=O)c12")
            .await
            .unwrap_err();
        assert!(
            matches!(
                error,
                ClassifyError::MultipleRadicalsOrAttachmentPointsNotSupported { .. }
            ),
            "got {error:?}"
        );
    }
}
