//! Typed classification records returned by the ClassyFire service.
//!
//! A [`Compound`] is built from one JSON document, either a fresh service
//! response or the same JSON read back from the result cache. Construction is
//! all-or-nothing: required keys are checked before anything is built.
//!
//! # Example
//!
//! ```
//! use classyfire::Compound;
//! use serde_json::json;
//!
//! let raw = json!({
//!     "smiles": "CCO",
//!     "inchikey": "InChIKey=LFQSCWFLJHTTHZ-UHFFFAOYSA-N",
//!     "kingdom": {"name": "Organic compounds", "description": "", "chemont_id": "CHEMONTID:0000000", "url": ""},
//!     "superclass": {"name": "Organic oxygen compounds", "description": "", "chemont_id": "CHEMONTID:0004603", "url": ""},
//!     "class": null,
//!     "subclass": null,
//!     "direct_parent": {"name": "Primary alcohols", "description": "", "chemont_id": "CHEMONTID:0000142", "url": ""},
//! });
//!
//! let compound = Compound::from_value(&raw).unwrap();
//! assert_eq!(compound.direct_parent.name, "Primary alcohols");
//! assert_eq!(Compound::from_value(&compound.to_value()).unwrap(), compound);
//! ```

mod error;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::identifier::prefixed_inchikey;

pub use error::ParseError;
pub(crate) use error::json_kind;

/// One node of the ChemOnt taxonomy (kingdom, superclass, class, parent, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChemOntNode {
    /// Human-readable node name, e.g. "Benzenoids".
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Textual definition of the node.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Stable ChemOnt identifier, e.g. `CHEMONTID:0002279`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub chemont_id: String,
    /// Link to the node's page on the ClassyFire site.
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
}

/// Cross-reference into an external classification database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalDescriptor {
    /// Source database, e.g. `CHEBI`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
    /// Identifier within the source database.
    #[serde(default, deserialize_with = "null_as_default")]
    pub source_id: String,
    /// Annotations attached by the source, in service order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub annotations: Vec<String>,
}

/// Classification of one chemical entity.
///
/// `inchikey` always carries the `InChIKey=` prefix, whatever form the raw
/// document used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compound {
    #[serde(default, deserialize_with = "null_as_default")]
    pub smiles: String,
    pub inchikey: String,
    pub kingdom: ChemOntNode,
    pub superclass: ChemOntNode,
    #[serde(rename = "class", default)]
    pub klass: Option<ChemOntNode>,
    #[serde(default)]
    pub subclass: Option<ChemOntNode>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub intermediate_nodes: Vec<ChemOntNode>,
    pub direct_parent: ChemOntNode,
    #[serde(default, deserialize_with = "null_as_default")]
    pub alternative_parents: Vec<ChemOntNode>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub molecular_framework: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub substituents: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub external_descriptors: Vec<ExternalDescriptor>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ancestors: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub predicted_chebi_terms: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub predicted_lipidmaps_terms: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub classification_version: String,
}

/// The service sends `null` for empty strings and lists in some records.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Compound {
    /// Builds a compound from a raw service document.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MissingInchikey`] when the document has no
    /// `inchikey` key, and other [`ParseError`] variants when it is not an
    /// object or does not match the schema.
    pub fn from_value(value: &Value) -> Result<Self, ParseError> {
        let Value::Object(object) = value else {
            return Err(ParseError::NotAnObject {
                found: json_kind(value),
            });
        };

        let Some(raw_inchikey) = object.get("inchikey") else {
            return Err(ParseError::MissingInchikey {
                keys: object.keys().map(String::as_str).collect::<Vec<_>>().join(", "),
            });
        };
        let Value::String(raw_inchikey) = raw_inchikey else {
            return Err(ParseError::InchikeyNotString {
                found: json_kind(raw_inchikey),
            });
        };

        let mut compound =
            Self::deserialize(value).map_err(|source| ParseError::Malformed {
                inchikey: raw_inchikey.clone(),
                source,
            })?;
        compound.inchikey = prefixed_inchikey(&compound.inchikey);
        Ok(compound)
    }

    /// Parses a compound from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidJson`] for malformed text, otherwise the
    /// same errors as [`from_value`](Self::from_value).
    pub fn from_json_str(raw: &str) -> Result<Self, ParseError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|source| ParseError::InvalidJson { source })?;
        Self::from_value(&value)
    }

    /// Serializes the compound back into the service's JSON layout.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::json!(self)
    }

    /// Taxonomy path from kingdom down to the direct parent, skipping absent levels.
    #[must_use]
    pub fn lineage(&self) -> Vec<&ChemOntNode> {
        let mut path = vec![&self.kingdom, &self.superclass];
        path.extend(self.klass.as_ref());
        path.extend(self.subclass.as_ref());
        path.extend(self.intermediate_nodes.iter());
        if path.last().is_none_or(|last| *last != &self.direct_parent) {
            path.push(&self.direct_parent);
        }
        path
    }

    /// One-line summary: InChIKey followed by the taxonomy path.
    #[must_use]
    pub fn short_summary(&self) -> String {
        let path = self
            .lineage()
            .iter()
            .map(|node| node.name.as_str())
            .collect::<Vec<_>>()
            .join(" > ");
        format!("{}: {path}", self.inchikey)
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_summary())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(name: &str, id: &str) -> Value {
        json!({
            "name": name,
            "description": format!("{name} description"),
            "chemont_id": id,
            "url": format!("http://classyfire.wishartlab.com/tax_nodes/{id}"),
        })
    }

    fn aspirin() -> Value {
        json!({
            "smiles": "CC(=O)OC1=CC=CC=C1C(O)=O",
            "inchikey": "InChIKey=BSYNRYMUTXBXSQ-UHFFFAOYSA-N",
            "kingdom": node("Organic compounds", "CHEMONTID:0000000"),
            "superclass": node("Benzenoids", "CHEMONTID:0002279"),
            "class": node("Benzene and substituted derivatives", "CHEMONTID:0002448"),
            "subclass": node("Benzoic acids and derivatives", "CHEMONTID:0000541"),
            "intermediate_nodes": [],
            "direct_parent": node("Acylsalicylic acids", "CHEMONTID:0004093"),
            "alternative_parents": [node("Phenol esters", "CHEMONTID:0001410")],
            "molecular_framework": "Aromatic homomonocyclic compounds",
            "substituents": ["Acylsalicylic acid", "Benzoic acid"],
            "description": "This compound belongs to the class of organic compounds known as acylsalicylic acids.",
            "external_descriptors": [
                {"source": "CHEBI", "source_id": "CHEBI:15365", "annotations": ["acetylsalicylic acid"]}
            ],
            "ancestors": ["Acylsalicylic acids", "Benzenoids"],
            "predicted_chebi_terms": ["benzoic acids (CHEBI:22723)"],
            "predicted_lipidmaps_terms": [],
            "classification_version": "2.1",
        })
    }

    #[test]
    fn test_from_value_reads_all_fields() {
        let compound = Compound::from_value(&aspirin()).unwrap();
        assert_eq!(compound.smiles, "CC(=O)OC1=CC=CC=C1C(O)=O");
        assert_eq!(compound.inchikey, "InChIKey=BSYNRYMUTXBXSQ-UHFFFAOYSA-N");
        assert_eq!(compound.superclass.name, "Benzenoids");
        assert_eq!(compound.superclass.chemont_id, "CHEMONTID:0002279");
        assert_eq!(
            compound.klass.as_ref().map(|n| n.name.as_str()),
            Some("Benzene and substituted derivatives")
        );
        assert_eq!(compound.alternative_parents.len(), 1);
        assert_eq!(compound.external_descriptors[0].source_id, "CHEBI:15365");
        assert_eq!(compound.classification_version, "2.1");
    }

    #[test]
    fn test_round_trip_preserves_compound() {
        let compound = Compound::from_value(&aspirin()).unwrap();
        let again = Compound::from_value(&compound.to_value()).unwrap();
        assert_eq!(again, compound);
    }

    #[test]
    fn test_to_value_uses_service_key_for_class() {
        let value = Compound::from_value(&aspirin()).unwrap().to_value();
        assert!(value.get("class").is_some());
        assert!(value.get("klass").is_none());
    }

    #[test]
    fn test_missing_inchikey_fails() {
        let mut raw = aspirin();
        raw.as_object_mut().unwrap().remove("inchikey");
        let error = Compound::from_value(&raw).unwrap_err();
        assert!(matches!(error, ParseError::MissingInchikey { .. }), "got {error:?}");
    }

    #[test]
    fn test_empty_document_fails_as_missing_inchikey() {
        let error = Compound::from_value(&json!({})).unwrap_err();
        assert!(matches!(error, ParseError::MissingInchikey { .. }));
    }

    #[test]
    fn test_non_object_document_fails() {
        let error = Compound::from_value(&json!([])).unwrap_err();
        assert!(matches!(error, ParseError::NotAnObject { found: "array" }));
    }

    #[test]
    fn test_missing_required_node_is_malformed() {
        let mut raw = aspirin();
        raw.as_object_mut().unwrap().remove("direct_parent");
        let error = Compound::from_value(&raw).unwrap_err();
        assert!(matches!(error, ParseError::Malformed { .. }), "got {error:?}");
    }

    #[test]
    fn test_optional_nodes_may_be_null() {
        let mut raw = aspirin();
        raw["class"] = Value::Null;
        raw["subclass"] = Value::Null;
        let compound = Compound::from_value(&raw).unwrap();
        assert!(compound.klass.is_none());
        assert!(compound.subclass.is_none());

        let value = compound.to_value();
        assert!(value["class"].is_null());
        assert_eq!(Compound::from_value(&value).unwrap(), compound);
    }

    #[test]
    fn test_null_lists_become_empty() {
        let mut raw = aspirin();
        raw["predicted_lipidmaps_terms"] = Value::Null;
        raw["intermediate_nodes"] = Value::Null;
        let compound = Compound::from_value(&raw).unwrap();
        assert!(compound.predicted_lipidmaps_terms.is_empty());
        assert!(compound.intermediate_nodes.is_empty());
    }

    #[test]
    fn test_unprefixed_inchikey_gets_canonical_prefix() {
        let mut raw = aspirin();
        raw["inchikey"] = json!("BSYNRYMUTXBXSQ-UHFFFAOYSA-N");
        let compound = Compound::from_value(&raw).unwrap();
        assert_eq!(compound.inchikey, "InChIKey=BSYNRYMUTXBXSQ-UHFFFAOYSA-N");
    }

    #[test]
    fn test_from_json_str_rejects_invalid_json() {
        let error = Compound::from_json_str("{not json").unwrap_err();
        assert!(matches!(error, ParseError::InvalidJson { .. }));
    }

    #[test]
    fn test_short_summary_walks_lineage() {
        let compound = Compound::from_value(&aspirin()).unwrap();
        assert_eq!(
            compound.short_summary(),
            "InChIKey=BSYNRYMUTXBXSQ-UHFFFAOYSA-N: Organic compounds > Benzenoids > \
             Benzene and substituted derivatives > Benzoic acids and derivatives > \
             Acylsalicylic acids"
        );
        assert_eq!(compound.to_string(), compound.short_summary());
    }

    #[test]
    fn test_lineage_does_not_repeat_direct_parent() {
        let mut raw = aspirin();
        raw["subclass"] = node("Acylsalicylic acids", "CHEMONTID:0004093");
        let compound = Compound::from_value(&raw).unwrap();
        let names: Vec<_> = compound.lineage().iter().map(|n| n.name.clone()).collect();
        assert_eq!(names.last().map(String::as_str), Some("Acylsalicylic acids"));
        assert_eq!(
            names.iter().filter(|n| *n == "Acylsalicylic acids").count(),
            1
        );
    }
}
