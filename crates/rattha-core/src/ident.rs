//! Numeric identity of a raw section id.

use crate::numerals::normalize_numerals;

/// Resolve the numeric identity of a section id.
///
/// Numerals are normalised first, then the first contiguous run of ASCII digits is
/// parsed. `None` means "no identity": the id has no digits (`intro`), or the run does
/// not fit in a `u64`. That is a normal outcome, not an error.
///
/// ```
/// use rattha_core::resolve_id;
/// assert_eq!(resolve_id("44/1"), Some(44));
/// assert_eq!(resolve_id("๑๒"), Some(12));
/// assert_eq!(resolve_id("intro"), None);
/// ```
pub fn resolve_id(raw: &str) -> Option<u64> {
    let normalized = normalize_numerals(raw);
    let bytes = normalized.as_bytes();

    let start = bytes.iter().position(|b| b.is_ascii_digit())?;
    let len = bytes[start..]
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(bytes.len() - start);

    normalized[start..start + len].parse().ok()
}
