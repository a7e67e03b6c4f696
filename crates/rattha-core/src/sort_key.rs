//! Canonical order keys for section ids.
//!
//! Derives a totally ordered key from an id string alone, so that sorting the healed
//! sequence by key recovers document order regardless of insertion history.
//!
//! # Thai constitutional numbering conventions
//!
//! - Plain numeric: มาตรา 1, 2, ..., 279
//! - Inserted section: มาตรา 44/1 between 44 and 45 (also seen OCR'd as `44.1`)
//! - Intro text before the first section: `intro`
//! - Chapter headers are synthetic: `header_N` sits just before section N,
//!   `header_after_N` just after it

use crate::numerals::normalize_numerals;
use crate::record::{HEADER_AFTER_PREFIX, HEADER_PREFIX, INTRO_ID};

/// Width of one section slot in comparison space.
const SLOT: i64 = 1000;
/// `header_N` bias: 0.1 of a slot before section N.
const HEADER_BEFORE_BIAS: i64 = -100;
/// `header_after_N` bias: half a slot after section N.
const HEADER_AFTER_BIAS: i64 = 500;
/// Inserted sections (`N/k`) must stay ahead of `header_after_N`.
const MAX_SUFFIX: i64 = 399;

/// Totally ordered position of a record in the canonical sequence.
///
/// Variant order is significant: the intro sorts first, unparseable ids last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OrderKey {
    Intro,
    Position(i64),
    Unparsed,
}

/// Compute the order key for an id.
///
/// | id               | key              |
/// |------------------|------------------|
/// | `intro`          | `Intro`          |
/// | `header_3`       | `Position(2900)` |
/// | `3`              | `Position(3000)` |
/// | `3/1`            | `Position(3001)` |
/// | `header_after_3` | `Position(3500)` |
/// | `abc`, `header_x`| `Unparsed`       |
pub fn order_key(id: &str) -> OrderKey {
    let id = normalize_numerals(id.trim());

    if id.eq_ignore_ascii_case(INTRO_ID) {
        return OrderKey::Intro;
    }
    if let Some(rest) = id.strip_prefix(HEADER_AFTER_PREFIX) {
        return slot(rest, HEADER_AFTER_BIAS);
    }
    if let Some(rest) = id.strip_prefix(HEADER_PREFIX) {
        return slot(rest, HEADER_BEFORE_BIAS);
    }

    match id.split_once(['/', '.']) {
        Some((base, suffix)) => match parse_number(suffix) {
            Some(k) => slot(base, k.min(MAX_SUFFIX)),
            None => OrderKey::Unparsed,
        },
        None => slot(&id, 0),
    }
}

fn slot(number: &str, bias: i64) -> OrderKey {
    parse_number(number)
        .and_then(|n| n.checked_mul(SLOT))
        .and_then(|base| base.checked_add(bias))
        .map_or(OrderKey::Unparsed, OrderKey::Position)
}

/// Strict parse: ASCII digits only, no sign, no surrounding text.
fn parse_number(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: assert a list of ids produces keys in strictly ascending order.
    fn assert_sorted_order(inputs: &[&str]) {
        let keys: Vec<OrderKey> = inputs.iter().map(|s| order_key(s)).collect();
        for i in 1..keys.len() {
            assert!(
                keys[i - 1] < keys[i],
                "Expected {:?} ({:?}) < {:?} ({:?})",
                inputs[i - 1],
                keys[i - 1],
                inputs[i],
                keys[i],
            );
        }
    }

    #[test]
    fn plain_numeric_sequence() {
        assert_sorted_order(&["1", "2", "3", "10", "11", "100", "279"]);
    }

    #[test]
    fn headers_bracket_their_section() {
        assert_sorted_order(&["intro", "header_3", "3", "header_after_3", "4"]);
    }

    #[test]
    fn inserted_sections() {
        assert_sorted_order(&["44", "44/1", "44/2", "header_after_44", "header_45", "45"]);
    }

    #[test]
    fn unparseable_sorts_last() {
        assert_sorted_order(&["999999", "unknown"]);
        assert_eq!(order_key("header_x"), OrderKey::Unparsed);
        assert_eq!(order_key("header_after_"), OrderKey::Unparsed);
        assert_eq!(order_key(""), OrderKey::Unparsed);
        assert_eq!(order_key("12a"), OrderKey::Unparsed);
    }

    #[test]
    fn exact_values() {
        assert_eq!(order_key("intro"), OrderKey::Intro);
        assert_eq!(order_key("header_3"), OrderKey::Position(2900));
        assert_eq!(order_key("3"), OrderKey::Position(3000));
        assert_eq!(order_key("3/1"), OrderKey::Position(3001));
        assert_eq!(order_key("3.2"), OrderKey::Position(3002));
        assert_eq!(order_key("header_after_3"), OrderKey::Position(3500));
    }

    #[test]
    fn thai_digits_normalised() {
        assert_eq!(order_key("๑๒"), order_key("12"));
        assert_eq!(order_key("header_๓"), order_key("header_3"));
    }

    #[test]
    fn intro_case_insensitive() {
        assert_eq!(order_key("INTRO"), OrderKey::Intro);
        assert_eq!(order_key("  Intro "), OrderKey::Intro);
    }

    #[test]
    fn huge_suffix_stays_before_header_after() {
        assert!(order_key("7/9999") < order_key("header_after_7"));
    }

    #[test]
    fn overflow_is_unparsed() {
        assert_eq!(order_key("99999999999999999999"), OrderKey::Unparsed);
    }
}
