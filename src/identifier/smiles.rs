//! SMILES validation and conversion to InChIKeys.
//!
//! Structure parsing is not done here. A [`SmilesConverter`] delegates to an
//! external chemistry toolkit, and a SMILES counts as valid exactly when that
//! conversion succeeds.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::error::ConversionError;

/// Converts SMILES strings to InChIKeys.
///
/// Implementations return the key with its `InChIKey=` prefix and report a
/// structure they refuse as [`ConversionError::Rejected`]. Any other error
/// variant means the conversion could not be attempted.
#[async_trait]
pub trait SmilesConverter: Send + Sync {
    /// Converts one SMILES string.
    async fn to_inchikey(&self, smiles: &str) -> Result<String, ConversionError>;
}

/// Converts `smiles` to an InChIKey through `converter`.
///
/// Blank input is rejected without consulting the converter.
///
/// # Errors
///
/// Returns [`ConversionError`] when the converter rejects the structure or
/// cannot be reached.
#[instrument(skip(converter))]
pub async fn convert_smiles_to_inchikey(
    converter: &dyn SmilesConverter,
    smiles: &str,
) -> Result<String, ConversionError> {
    if smiles.trim().is_empty() {
        return Err(ConversionError::rejected(smiles, "empty SMILES"));
    }
    converter.to_inchikey(smiles).await
}

/// Lowest normal valence of the elements whose bracket form is checked for
/// open valences. Lowercase symbols are the aromatic forms.
const LOWEST_VALENCE: [(&str, u32); 16] = [
    ("B", 3),
    ("C", 4),
    ("N", 3),
    ("O", 2),
    ("P", 3),
    ("S", 2),
    ("F", 1),
    ("Cl", 1),
    ("Br", 1),
    ("I", 1),
    ("b", 3),
    ("c", 4),
    ("n", 3),
    ("o", 2),
    ("p", 3),
    ("s", 2),
];

/// Bond orders are tracked in half units so aromatic bonds count 1.5.
const SINGLE: u32 = 2;
const AROMATIC: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AtomKind {
    /// `*`, an attachment point.
    Wildcard,
    /// Neutral bracket atom with a known valence and explicit hydrogen count.
    Checked { valence: u32, hydrogens: u32 },
    /// Anything else: bare organic-subset atoms, charged or exotic atoms.
    Unchecked,
}

#[derive(Debug, Clone, Copy)]
struct ScannedAtom {
    kind: AtomKind,
    aromatic: bool,
    /// Sum of bond orders to neighbours, in half units.
    bonds: u32,
}

impl ScannedAtom {
    fn unchecked(aromatic: bool) -> Self {
        Self {
            kind: AtomKind::Unchecked,
            aromatic,
            bonds: 0,
        }
    }

    fn is_open_site(&self) -> bool {
        match self.kind {
            AtomKind::Wildcard => true,
            AtomKind::Checked { valence, hydrogens } => {
                self.bonds + hydrogens * SINGLE < valence * SINGLE
            }
            AtomKind::Unchecked => false,
        }
    }
}

/// Counts open valences written explicitly in `smiles`.
///
/// A neutral bracket atom (e.g. `[C]`, `[13C]`, `[O]`) has no implicit
/// hydrogens, so it is a radical site when its bonds in the string plus its
/// explicit hydrogens fall short of the element's lowest normal valence:
/// `[CH2]C` counts, `O=[13C](O)C` does not. Every `*` wildcard (bare or
/// bracketed, e.g. `[1*]`) is an attachment point. The scan reads bonds,
/// branches and ring closures but does not validate the structure.
#[must_use]
pub fn radical_site_count(smiles: &str) -> usize {
    scan_atoms(smiles)
        .iter()
        .filter(|atom| atom.is_open_site())
        .count()
}

fn bond_order(symbol: u8) -> Option<u32> {
    match symbol {
        b'-' | b'/' | b'\\' => Some(SINGLE),
        b'=' => Some(2 * SINGLE),
        b'#' => Some(3 * SINGLE),
        b'$' => Some(4 * SINGLE),
        b':' => Some(AROMATIC),
        _ => None,
    }
}

fn default_bond(first: &ScannedAtom, second: &ScannedAtom) -> u32 {
    if first.aromatic && second.aromatic {
        AROMATIC
    } else {
        SINGLE
    }
}

fn connect(atoms: &mut [ScannedAtom], first: usize, second: usize, explicit: Option<u32>) {
    let order = explicit.unwrap_or_else(|| default_bond(&atoms[first], &atoms[second]));
    atoms[first].bonds += order;
    atoms[second].bonds += order;
}

/// Splits the element symbol off the front of a bracket atom body.
fn split_symbol(body: &str) -> (&str, &str) {
    let bytes = body.as_bytes();
    let length = match bytes {
        [b'*', ..] => 1,
        [first, second, ..] if first.is_ascii_uppercase() && second.is_ascii_lowercase() => 2,
        [b's', b'e', ..] | [b'a', b's', ..] | [b't', b'e', ..] => 2,
        [first, ..] if first.is_ascii_alphabetic() => 1,
        _ => 0,
    };
    body.split_at(length)
}

/// Reads the atom written inside `[...]`.
fn parse_bracket_atom(body: &str) -> ScannedAtom {
    let body = body.trim_start_matches(|c: char| c.is_ascii_digit());
    let (symbol, rest) = split_symbol(body);
    let aromatic = symbol.starts_with(|c: char| c.is_ascii_lowercase());
    if symbol == "*" {
        return ScannedAtom {
            kind: AtomKind::Wildcard,
            aromatic: false,
            bonds: 0,
        };
    }

    let mut rest = rest.trim_start_matches('@');
    for class in ["TH", "AL", "SP", "TB", "OH"] {
        if let Some(stripped) = rest.strip_prefix(class) {
            rest = stripped.trim_start_matches(|c: char| c.is_ascii_digit());
            break;
        }
    }

    let mut hydrogens = 0;
    if let Some(stripped) = rest.strip_prefix('H') {
        let digits = stripped
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(stripped.len());
        hydrogens = stripped[..digits].parse().unwrap_or(1);
        rest = &stripped[digits..];
    }

    let charged = rest.starts_with(['+', '-']);
    let valence = LOWEST_VALENCE
        .iter()
        .find(|(element, _)| *element == symbol)
        .map(|(_, valence)| *valence);

    match valence {
        Some(valence) if !charged => ScannedAtom {
            kind: AtomKind::Checked { valence, hydrogens },
            aromatic,
            bonds: 0,
        },
        _ => ScannedAtom::unchecked(aromatic),
    }
}

/// Walks `smiles`, recording every atom and the bonds it takes part in.
///
/// Stops at the first unclosed bracket; atoms read so far are kept.
fn scan_atoms(smiles: &str) -> Vec<ScannedAtom> {
    let bytes = smiles.as_bytes();
    let mut atoms: Vec<ScannedAtom> = Vec::new();
    let mut previous: Option<usize> = None;
    let mut branches: Vec<Option<usize>> = Vec::new();
    let mut rings: HashMap<u32, (usize, Option<u32>)> = HashMap::new();
    let mut pending_bond: Option<u32> = None;
    let mut index = 0;

    while index < bytes.len() {
        let byte = bytes[index];
        let mut width = 1;
        let atom = match byte {
            b'(' => {
                branches.push(previous);
                None
            }
            b')' => {
                if let Some(branch_point) = branches.pop() {
                    previous = branch_point;
                }
                None
            }
            b'.' => {
                previous = None;
                pending_bond = None;
                None
            }
            b'0'..=b'9' | b'%' => {
                let ring = if byte == b'%' {
                    width = 3;
                    smiles
                        .get(index + 1..index + 3)
                        .and_then(|digits| digits.parse::<u32>().ok())
                } else {
                    Some(u32::from(byte - b'0'))
                };
                if let (Some(ring), Some(current)) = (ring, previous) {
                    if let Some((other, bond)) = rings.remove(&ring) {
                        connect(&mut atoms, current, other, pending_bond.or(bond));
                    } else {
                        rings.insert(ring, (current, pending_bond));
                    }
                }
                pending_bond = None;
                None
            }
            b'[' => {
                let Some(close) = smiles[index..].find(']') else {
                    break;
                };
                width = close + 1;
                Some(parse_bracket_atom(&smiles[index + 1..index + close]))
            }
            b'*' => Some(ScannedAtom {
                kind: AtomKind::Wildcard,
                aromatic: false,
                bonds: 0,
            }),
            b'C' if bytes.get(index + 1) == Some(&b'l') => {
                width = 2;
                Some(ScannedAtom::unchecked(false))
            }
            b'B' if bytes.get(index + 1) == Some(&b'r') => {
                width = 2;
                Some(ScannedAtom::unchecked(false))
            }
            b'B' | b'C' | b'N' | b'O' | b'P' | b'S' | b'F' | b'I' => {
                Some(ScannedAtom::unchecked(false))
            }
            b'b' | b'c' | b'n' | b'o' | b'p' | b's' => Some(ScannedAtom::unchecked(true)),
            other => {
                if let Some(order) = bond_order(other) {
                    pending_bond = Some(order);
                }
                None
            }
        };

        if let Some(atom) = atom {
            atoms.push(atom);
            let current = atoms.len() - 1;
            if let Some(neighbour) = previous {
                connect(&mut atoms, neighbour, current, pending_bond);
            }
            pending_bond = None;
            previous = Some(current);
        }
        index += width;
    }
    atoms
}

/// Whether `smiles` has more than one radical site or attachment point.
#[must_use]
pub fn has_multiple_radical_sites(smiles: &str) -> bool {
    radical_site_count(smiles) > 1
}

/// Returns whether `smiles` converts successfully.
///
/// Only a rejection maps to `Ok(false)`.
///
/// # Errors
///
/// Propagates transport and response errors from the converter, since those
/// say nothing about the SMILES itself.
pub async fn is_valid_smiles(
    converter: &dyn SmilesConverter,
    smiles: &str,
) -> Result<bool, ConversionError> {
    match convert_smiles_to_inchikey(converter, smiles).await {
        Ok(_) => Ok(true),
        Err(error) if error.is_rejection() => {
            debug!(smiles, error = %error, "SMILES rejected by converter");
            Ok(false)
        }
        Err(error) => Err(error),
    }
}
