//! Display-name normalization
//!
//! Two distinct transforms with deliberately different contracts:
//!
//! - [`normalize_for_comparison`] folds case and whitespace so that two
//!   spellings of the same calendar name compare equal. Its output is never
//!   stored or shown.
//! - [`sanitize_identifier`] builds a filesystem/identifier-safe token from a
//!   display name. It preserves the original case: folding an identifier and
//!   later reconstructing the name from the folded form loses information,
//!   so the two transforms must never be mixed.

use unicode_normalization::UnicodeNormalization;

/// Canonical comparison form of a calendar display name.
///
/// NFC-normalizes, trims, collapses internal whitespace runs to a single
/// space, and lowercases. The stored display form is left untouched.
#[must_use]
pub fn normalize_for_comparison(name: &str) -> String {
    let composed: String = name.nfc().collect();
    let mut out = String::with_capacity(composed.len());
    let mut pending_space = false;
    for ch in composed.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        for low in ch.to_lowercase() {
            out.push(low);
        }
    }
    out
}

/// Whether two display names denote the same calendar.
#[inline]
#[must_use]
pub fn names_equal(a: &str, b: &str) -> bool {
    normalize_for_comparison(a) == normalize_for_comparison(b)
}

/// Identifier-safe token derived from a display name.
///
/// NFC-normalizes, trims, replaces each whitespace run with a single `_`,
/// and drops characters outside the allow-list (Unicode alphanumerics and
/// `-` `_` `.`). Original case is preserved.
#[must_use]
pub fn sanitize_identifier(name: &str) -> String {
    let composed: String = name.nfc().collect();
    let mut out = String::with_capacity(composed.len());
    let mut pending_sep = false;
    for ch in composed.trim().chars() {
        if ch.is_whitespace() {
            pending_sep = true;
            continue;
        }
        if !ch.is_alphanumeric() && !matches!(ch, '-' | '_' | '.') {
            continue;
        }
        if pending_sep && !out.is_empty() {
            out.push('_');
        }
        pending_sep = false;
        out.push(ch);
    }
    out
}
