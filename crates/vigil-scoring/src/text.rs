//! Text normalization and similarity
//!
//! Narratives are compared as sets of normalized tokens. Identical
//! normalized text short-circuits through a blake3 fingerprint.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;

lazy_static! {
    static ref TOKEN: Regex = Regex::new(r"[\p{L}\p{N}]+").unwrap();
}

/// Lowercased word tokens of at least two characters
pub fn tokens(text: &str) -> BTreeSet<String> {
    TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|t| t.chars().count() >= 2)
        .collect()
}

/// Whitespace-collapsed lowercase form used for fingerprinting
pub fn normalize(text: &str) -> String {
    TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// blake3 hex digest of the normalized text
pub fn fingerprint(text: &str) -> String {
    blake3::hash(normalize(text).as_bytes()).to_hex().to_string()
}

/// Jaccard index of two token sets; two empty sets are dissimilar
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Comparison form of a narrative, computed once per text
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    /// blake3 of the normalized text; `None` when nothing survives normalization
    pub fingerprint: Option<String>,
    pub tokens: BTreeSet<String>,
}

impl Signature {
    pub fn of(text: &str) -> Self {
        let fingerprint = if normalize(text).is_empty() {
            None
        } else {
            Some(fingerprint(text))
        };
        Self {
            fingerprint,
            tokens: tokens(text),
        }
    }

    /// Symmetric similarity in `[0, 1]`; equal fingerprints score 1.0
    pub fn similarity(&self, other: &Signature) -> f64 {
        if self.fingerprint.is_some() && self.fingerprint == other.fingerprint {
            return 1.0;
        }
        jaccard(&self.tokens, &other.tokens)
    }
}

/// Symmetric similarity in `[0, 1]` of two texts
pub fn similarity(a: &str, b: &str) -> f64 {
    Signature::of(a).similarity(&Signature::of(b))
}
