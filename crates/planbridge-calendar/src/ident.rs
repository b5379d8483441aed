//! Stable calendar identity fingerprints
//!
//! A [`NameDigest`] is a short, deterministic fingerprint of a calendar's
//! comparison-normalized display name. It is a content hash (SHA-256,
//! truncated), so it stays stable across process restarts and runtime
//! versions where a language-runtime hash would not.

use crate::name::normalize_for_comparison;
use sha2::{Digest, Sha256};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Number of bytes of the SHA-256 output the digest keeps (16 hex chars).
pub const DIGEST_BYTES: usize = 8;

/// Truncated content hash of a normalized calendar name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameDigest([u8; DIGEST_BYTES]);

impl NameDigest {
    /// Fingerprint of the given display name.
    ///
    /// Normalizes for comparison first, so all spellings of one logical
    /// name share a digest.
    #[must_use]
    pub fn of(name: &str) -> Self {
        let normalized = normalize_for_comparison(name);
        let full = Sha256::digest(normalized.as_bytes());
        let mut out = [0u8; DIGEST_BYTES];
        out.copy_from_slice(&full[..DIGEST_BYTES]);
        Self(out)
    }

    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; DIGEST_BYTES] {
        &self.0
    }
}

impl Display for NameDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Errors parsing a digest from its hex form.
#[derive(Debug, thiserror::Error)]
pub enum DigestParseError {
    #[error("invalid digest length: expected {expected} hex chars, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

impl FromStr for NameDigest {
    type Err = DigestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != DIGEST_BYTES * 2 {
            return Err(DigestParseError::InvalidLength {
                expected: DIGEST_BYTES * 2,
                actual: s.len(),
            });
        }
        let bytes = hex::decode(s)?;
        let mut out = [0u8; DIGEST_BYTES];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl serde::Serialize for NameDigest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for NameDigest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_deterministic() {
        assert_eq!(NameDigest::of("Standard"), NameDigest::of("Standard"));
    }

    #[test]
    fn digest_normalizes_before_hashing() {
        assert_eq!(
            NameDigest::of("  Night   Shift "),
            NameDigest::of("night shift")
        );
    }

    #[test]
    fn digest_differs_for_distinct_names() {
        assert_ne!(NameDigest::of("Standard"), NameDigest::of("Night Shift"));
    }

    #[test]
    fn digest_display_and_parse() {
        let d = NameDigest::of("Crew A");
        let s = d.to_string();
        assert_eq!(s.len(), 16);
        let parsed: NameDigest = s.parse().unwrap();
        assert_eq!(d, parsed);
    }

    #[test]
    fn digest_rejects_wrong_length() {
        let result: Result<NameDigest, _> = "abcd".parse();
        assert!(matches!(
            result,
            Err(DigestParseError::InvalidLength { expected: 16, actual: 4 })
        ));
    }

    #[test]
    fn digest_serde_round_trip() {
        let d = NameDigest::of("Crew A");
        let json = serde_json::to_string(&d).unwrap();
        let back: NameDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(d, back);
    }
}
