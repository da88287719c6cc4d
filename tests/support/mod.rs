//! Shared fixtures for the integration tests: compound documents, scripted
//! service responders, a scripted SMILES converter and client builders.

#![allow(dead_code)]

pub mod socket_guard;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use classyfire::{
    ClassyFireClient, ClientConfig, ConversionError, EmptyClassificationPolicy, SmilesConverter,
};
use serde_json::{Value, json};
use wiremock::{Respond, ResponseTemplate};

pub const ASPIRIN: &str = "BSYNRYMUTXBXSQ-UHFFFAOYSA-N";
pub const ASPIRIN_SMILES: &str = "CC(=O)OC1=CC=CC=C1C(O)=O";
pub const KETAMINE: &str = "YQEZLKZALYSWHR-UHFFFAOYSA-N";
pub const KETAMINE_SMILES: &str = "CNC1(CCCCC1=O)C1=CC=CC=C1Cl";

/// Path of the entity document for `inchikey`.
pub fn entity_path(inchikey: &str) -> String {
    format!("/entities/{inchikey}.json")
}

fn node(name: &str, chemont_id: &str) -> Value {
    json!({
        "name": name,
        "description": format!("{name} node"),
        "chemont_id": chemont_id,
        "url": format!("http://classyfire.wishartlab.com/tax_nodes/{}", &chemont_id[10..]),
    })
}

/// A classification document in the service's shape.
pub fn compound_json(inchikey: &str, smiles: &str) -> Value {
    json!({
        "smiles": smiles,
        "inchikey": format!("InChIKey={inchikey}"),
        "kingdom": node("Organic compounds", "CHEMONTID:0000000"),
        "superclass": node("Benzenoids", "CHEMONTID:0002279"),
        "class": node("Benzene and substituted derivatives", "CHEMONTID:0002448"),
        "subclass": null,
        "intermediate_nodes": [],
        "direct_parent": node("Chlorobenzenes", "CHEMONTID:0000353"),
        "alternative_parents": [],
        "molecular_framework": "Aromatic homomonocyclic compounds",
        "substituents": ["Aromatic homomonocyclic compound"],
        "description": null,
        "external_descriptors": [],
        "ancestors": ["Benzenoids", "Organic compounds"],
        "predicted_chebi_terms": [],
        "predicted_lipidmaps_terms": [],
        "classification_version": "2.1",
    })
}

pub fn aspirin_json() -> Value {
    compound_json(ASPIRIN, ASPIRIN_SMILES)
}

pub fn ketamine_json() -> Value {
    compound_json(KETAMINE, KETAMINE_SMILES)
}

/// Answers with an empty document for the first `empty_count` requests, then
/// with `success_body`.
pub struct SequenceResponder {
    request_count: Arc<AtomicUsize>,
    empty_count: usize,
    success_body: Value,
}

impl SequenceResponder {
    pub fn new(empty_count: usize, success_body: Value) -> Self {
        Self {
            request_count: Arc::new(AtomicUsize::new(0)),
            empty_count,
            success_body,
        }
    }

    /// Shared request counter, readable after the responder is mounted.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.request_count)
    }
}

impl Respond for SequenceResponder {
    fn respond(&self, _request: &wiremock::Request) -> ResponseTemplate {
        let n = self.request_count.fetch_add(1, Ordering::SeqCst);
        if n < self.empty_count {
            ResponseTemplate::new(200).set_body_json(json!({}))
        } else {
            ResponseTemplate::new(200).set_body_json(self.success_body.clone())
        }
    }
}

/// Converter answering from a fixed table; unknown SMILES are rejected.
#[derive(Default)]
pub struct ScriptedConverter {
    keys: HashMap<String, String>,
    calls: AtomicUsize,
}

impl ScriptedConverter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, smiles: &str, inchikey: &str) -> Self {
        self.keys
            .insert(smiles.to_string(), format!("InChIKey={inchikey}"));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SmilesConverter for ScriptedConverter {
    async fn to_inchikey(&self, smiles: &str) -> Result<String, ConversionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.keys
            .get(smiles)
            .cloned()
            .ok_or_else(|| ConversionError::rejected(smiles, "unparseable SMILES"))
    }
}

/// Settings for a test run against `base_url`: no throttling, no cache and a
/// short retry delay.
pub fn test_config(base_url: &str) -> ClientConfig {
    ClientConfig::default()
        .with_base_url(base_url)
        .with_timeout(Duration::from_secs(5))
        .with_sleep(Duration::ZERO)
        .with_retry_delay(Duration::from_millis(10))
        .without_cache()
}

pub fn test_client(base_url: &str) -> ClassyFireClient {
    ClassyFireClient::new(test_config(base_url)).expect("Failed to build test client")
}

pub fn test_client_with_policy(
    base_url: &str,
    policy: EmptyClassificationPolicy,
) -> ClassyFireClient {
    ClassyFireClient::new(test_config(base_url).with_policy(policy))
        .expect("Failed to build test client")
}
