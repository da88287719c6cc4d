//! ClassyFire client library
//!
//! Classifies chemical compounds through the ClassyFire web service, given an
//! InChIKey or a SMILES string, and parses the answers into typed
//! [`Compound`] records.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`identifier`] - InChIKey validation and SMILES conversion
//! - [`compound`] - Classification records and their JSON form
//! - [`classify`] - Single requests: cache, rate limiting, empty-answer policy
//! - [`batch`] - Lazy batches with a deferred retry pass, table input
//! - [`progress`] - Terminal progress for waits and batches

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod classify;
pub mod compound;
pub mod identifier;
pub mod progress;

mod user_agent;

// Re-export commonly used types
pub use batch::{ClassificationBatch, Row, RowClassification, TableError};
pub use classify::{
    CacheError, ClassifyError, ClassyFireClient, ClientConfig, ConfigError, DiskCache,
    EmptyClassificationPolicy, MemoryCache, RateLimiter, ResultCache,
};
pub use compound::{ChemOntNode, Compound, ExternalDescriptor, ParseError};
pub use identifier::{
    ConversionError, PubChemConverter, SmilesConverter, is_valid_inchikey, normalize_inchikey,
};
