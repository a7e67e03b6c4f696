//! Thai numeral normalisation.
//!
//! Scanned constitutions print section numbers and dates in Thai digits
//! (๐ ๑ ๒ ๓ ๔ ๕ ๖ ๗ ๘ ๙, U+0E50..U+0E59). Everything downstream of extraction
//! works on ASCII digits.

const THAI_ZERO: char = '\u{0E50}';
const THAI_NINE: char = '\u{0E59}';

/// Map a single Thai digit to its ASCII counterpart; other characters pass through.
pub fn normalize_digit(c: char) -> char {
    if (THAI_ZERO..=THAI_NINE).contains(&c) {
        // Offset is 0..=9 so the addition stays within ASCII digits.
        char::from(b'0' + (c as u32 - THAI_ZERO as u32) as u8)
    } else {
        c
    }
}

/// Replace every Thai digit with the matching ASCII digit.
///
/// Empty input yields an empty string. Idempotent.
pub fn normalize_numerals(text: &str) -> String {
    text.chars().map(normalize_digit).collect()
}
