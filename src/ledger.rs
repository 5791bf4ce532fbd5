//! Checksum ledger for detecting changed rule lists.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Digest of the last accepted snapshot, keyed by output file identifier.
///
/// Serialized as a JSON object with sorted keys, e.g.
/// `{"QuantumultX/Netflix.list": "<sha256 hex>"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecksumLedger {
    entries: BTreeMap<String, String>,
}

/// Lowercase hex SHA-256 of a snapshot.
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

impl ChecksumLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the ledger from a file.
    ///
    /// Returns an empty ledger if the file doesn't exist. A file that exists
    /// but cannot be read or decoded is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let ledger: Self = serde_json::from_str(&content)?;
        Ok(ledger)
    }

    /// Save the ledger with 4-space indentation and sorted keys.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        fs::write(path, buf)?;
        Ok(())
    }

    /// Record a freshly fetched snapshot for an output identifier.
    ///
    /// Returns `false` and leaves the ledger untouched when the stored digest
    /// equals the snapshot's. Otherwise stores the new digest and returns
    /// `true`.
    pub fn changed(&mut self, snapshot: &[u8], identifier: &str) -> bool {
        let digest = sha256_hex(snapshot);
        if self.entries.get(identifier) == Some(&digest) {
            return false;
        }
        self.entries.insert(identifier.to_string(), digest);
        true
    }

    /// Get the stored digest for an output identifier.
    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.entries.get(identifier).map(String::as_str)
    }

    /// Number of tracked outputs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the ledger tracks nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
