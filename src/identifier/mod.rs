//! Identifier validation for InChIKeys and SMILES.
//!
//! - [`is_valid_inchikey`] / [`normalize_inchikey`] - pure syntax checks
//! - [`SmilesConverter`] - seam to the external chemistry toolkit
//! - [`PubChemConverter`] - default converter backed by PubChem PUG REST

mod error;
mod inchikey;
mod pubchem;
mod smiles;

pub use error::ConversionError;
pub use inchikey::{INCHIKEY_PREFIX, is_valid_inchikey, normalize_inchikey, prefixed_inchikey};
pub use pubchem::{DEFAULT_PUBCHEM_BASE_URL, PUBCHEM_MIN_INTERVAL, PubChemConverter};
pub use smiles::{
    SmilesConverter, convert_smiles_to_inchikey, has_multiple_radical_sites, is_valid_smiles,
    radical_site_count,
};
