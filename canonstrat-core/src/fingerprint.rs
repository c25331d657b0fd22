//! Strategy fingerprinting — deterministic identity for validated strategies.
//!
//! The fingerprint is a BLAKE3 hash of the normalized wire form, so two
//! documents that differ only in defaults left implicit, symbol case, or
//! timezone spelling hash the same.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::CanonicalStrategy;

/// Hex-encoded BLAKE3 digest of a canonical strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrategyFingerprint(pub String);

impl StrategyFingerprint {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// First 12 hex characters, for logs and terminal output.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for StrategyFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl CanonicalStrategy {
    pub fn fingerprint(&self) -> StrategyFingerprint {
        // Going through `Value` sorts object keys.
        let canonical = serde_json::to_value(self).expect("CanonicalStrategy must serialize");
        StrategyFingerprint::from_bytes(canonical.to_string().as_bytes())
    }
}
