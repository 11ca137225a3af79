//! Content-addressed ledger of the files this tool has written.
//!
//! The ledger is the tool's memory of "files I last wrote, and what I
//! wrote": a single JSON object mapping absolute path strings to
//! algorithm-tagged content hashes (`"sha256-<hex>"`). Only managed paths
//! appear here — it is not a cache of arbitrary file hashes.
//!
//! The file is reloaded before every mutation and rewritten atomically, so
//! external edits between calls are tolerated and no in-memory state can go
//! stale across calls.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::StateError;
use crate::fsutil;

/// Outcome of checking an observed file hash against the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// No observed file: nothing to verify, not a conflict.
    NoFile,
    /// The path is not registered in the ledger.
    Unknown,
    /// The registered hash differs from the observed hash.
    Mismatch,
    /// The registered hash equals the observed hash.
    Ok,
}

impl Verification {
    /// Human-readable drift reason, `None` for the non-conflicting outcomes.
    pub fn drift_reason(&self) -> Option<&'static str> {
        match self {
            Self::Unknown => Some("file is unknown and its contents don't match the target state"),
            Self::Mismatch => Some("file contents don't match the last known or target state"),
            Self::NoFile | Self::Ok => None,
        }
    }
}

/// Persistent path→hash mapping backing safe file reconciliation.
#[derive(Debug)]
pub struct StateLedger {
    path: PathBuf,
}

impl StateLedger {
    /// Create a ledger backed by the mapping file at `path`.
    ///
    /// The file is not touched until the first operation.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the backing file.
    pub fn file_path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StateError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(source) => {
                return Err(StateError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let value: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| StateError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        let Some(object) = value.as_object() else {
            return Err(StateError::Corrupt {
                path: self.path.clone(),
                reason: "not a JSON object".to_string(),
            });
        };

        let mut entries = BTreeMap::new();
        for (key, value) in object {
            let Some(hash) = value.as_str() else {
                return Err(StateError::Corrupt {
                    path: self.path.clone(),
                    reason: format!("non-string hash at key {key:?}"),
                });
            };
            entries.insert(key.clone(), hash.to_string());
        }
        Ok(entries)
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StateError> {
        let text = serde_json::to_string(entries).map_err(|e| StateError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        fsutil::atomic_write(&self.path, text.as_bytes()).map_err(|source| StateError::Io {
            path: self.path.clone(),
            source,
        })
    }

    /// Record (upsert) the hash for a managed path. Persists immediately.
    pub fn record(&self, path: &Path, hash: &str) -> Result<(), StateError> {
        let mut entries = self.load()?;
        entries.insert(path_key(path), hash.to_string());
        self.save(&entries)
    }

    /// Remove the entry for a path, if present. Persists immediately.
    pub fn forget(&self, path: &Path) -> Result<(), StateError> {
        let mut entries = self.load()?;
        entries.remove(&path_key(path));
        self.save(&entries)
    }

    /// Check an observed hash against the ledger's expectation for `path`.
    ///
    /// `observed` is the hash of the file currently on disk, `None` when
    /// there is no file (which cannot conflict and yields
    /// [`Verification::NoFile`]).
    pub fn verify(
        &self,
        path: &Path,
        observed: Option<&str>,
    ) -> Result<Verification, StateError> {
        let Some(observed) = observed else {
            return Ok(Verification::NoFile);
        };
        Ok(match self.load()?.get(&path_key(path)) {
            None => Verification::Unknown,
            Some(known) if known != observed => Verification::Mismatch,
            Some(_) => Verification::Ok,
        })
    }

    /// All ledger keys, ascending.
    pub fn known_paths(&self) -> Result<Vec<String>, StateError> {
        Ok(self.load()?.into_keys().collect())
    }
}

fn path_key(path: &Path) -> String {
    path.display().to_string()
}
