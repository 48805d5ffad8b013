//! Content fingerprints and duplicate detection
//!
//! A fingerprint is the SHA-256 of a page's extracted text after every run
//! of whitespace is collapsed to a single space. Two pages whose visible
//! text differs only in layout share a fingerprint; markup is never hashed.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// SHA-256 digest of a page's whitespace-normalized text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentFingerprint([u8; 32]);

impl ContentFingerprint {
    /// Length of the hex form
    pub const HEX_LEN: usize = 64;

    /// Fingerprints extracted page text
    pub fn of_text(text: &str) -> Self {
        let normalized = normalize_text(text);
        Self(Sha256::digest(normalized.as_bytes()).into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ContentFingerprint {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Serialize for ContentFingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentFingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Collapses every whitespace run to one space and trims the ends
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Outcome of checking a fingerprint against the seen set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupDecision {
    /// First time this content has been seen; it is now recorded
    New,
    /// The content was already processed under another URL
    Duplicate,
}

/// Every fingerprint computed so far in a session; only grows
#[derive(Debug, Clone, Default)]
pub struct SeenFingerprints {
    seen: HashSet<ContentFingerprint>,
}

impl SeenFingerprints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, fingerprint: &ContentFingerprint) -> bool {
        self.seen.contains(fingerprint)
    }

    /// Records a fingerprint, returning true if it was not present
    pub fn insert(&mut self, fingerprint: ContentFingerprint) -> bool {
        self.seen.insert(fingerprint)
    }

    /// Checks a fingerprint and records it if new
    pub fn check(&mut self, fingerprint: ContentFingerprint) -> DedupDecision {
        if self.seen.insert(fingerprint) {
            DedupDecision::New
        } else {
            DedupDecision::Duplicate
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl FromIterator<ContentFingerprint> for SeenFingerprints {
    fn from_iter<I: IntoIterator<Item = ContentFingerprint>>(iter: I) -> Self {
        Self {
            seen: iter.into_iter().collect(),
        }
    }
}
