//! InChIKey normalization and syntactic validation.

use std::sync::LazyLock;

use regex::Regex;

/// Prefix the classification service puts in front of every InChIKey it returns.
pub const INCHIKEY_PREFIX: &str = "InChIKey=";

/// 14 uppercase letters, hyphen, 10 uppercase letters, hyphen, 1 uppercase letter.
#[allow(clippy::expect_used)]
static INCHIKEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{14}-[A-Z]{10}-[A-Z]$").expect("InChIKey regex is valid") // Static pattern, safe to panic
});

/// Strips leading `InChIKey=` prefixes, leaving anything else untouched.
///
/// Idempotent: normalizing an already normalized key returns it unchanged.
///
/// # Examples
///
/// ```
/// use classyfire::identifier::normalize_inchikey;
///
/// assert_eq!(
///     normalize_inchikey("InChIKey=BSYNRYMUTXBXSQ-UHFFFAOYSA-N"),
///     "BSYNRYMUTXBXSQ-UHFFFAOYSA-N"
/// );
/// assert_eq!(
///     normalize_inchikey("BSYNRYMUTXBXSQ-UHFFFAOYSA-N"),
///     "BSYNRYMUTXBXSQ-UHFFFAOYSA-N"
/// );
/// ```
#[must_use]
pub fn normalize_inchikey(inchikey: &str) -> &str {
    inchikey.trim_start_matches(INCHIKEY_PREFIX)
}

/// Returns the key with exactly one `InChIKey=` prefix.
#[must_use]
pub fn prefixed_inchikey(inchikey: &str) -> String {
    format!("{INCHIKEY_PREFIX}{}", normalize_inchikey(inchikey))
}

/// Returns whether `inchikey` has the fixed-width InChIKey layout.
///
/// The optional `InChIKey=` prefix is ignored. Only syntax is checked; a key
/// that passes may still be unknown to the classification service.
///
/// # Examples
///
/// ```
/// use classyfire::identifier::is_valid_inchikey;
///
/// assert!(is_valid_inchikey("BSYNRYMUTXBXSQ-UHFFFAOYSA-N"));
/// assert!(is_valid_inchikey("InChIKey=OROGSEYTTFOCAN-DNJOTXNNSA-N"));
/// assert!(!is_valid_inchikey("AAABBCCDDDEEEFFF-GHIJKLMMM-NS-"));
/// ```
#[must_use]
pub fn is_valid_inchikey(inchikey: &str) -> bool {
    INCHIKEY_PATTERN.is_match(normalize_inchikey(inchikey))
}
