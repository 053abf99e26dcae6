use crate::error::{DrtPrepError, Result};
use crate::registry::ContentDigest;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// Outcome of an atomic check-and-claim on a digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// Digest unseen: the caller now owns the conversion for it.
    Fresh,
    /// Digest already recorded, or being converted by another worker right
    /// now. The output name is `None` while the winner is still in flight.
    Duplicate(Option<String>),
}

/// Persistent digest → output-filename map, the single source of truth for
/// "has this content already been converted" across runs.
///
/// One mutex guards both the recorded entries and the in-flight claim set, so
/// the check-then-record sequence is atomic with respect to other workers:
/// two workers hashing bit-identical files race on `claim`, exactly one gets
/// [`Claim::Fresh`], and the loser reports a duplicate without converting.
#[derive(Debug)]
pub struct DedupRegistry {
    state: Mutex<RegistryState>,
}

#[derive(Debug, Default)]
struct RegistryState {
    entries: BTreeMap<String, String>,
    in_flight: HashSet<String>,
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Reconstruct the registry from a snapshot file.
    ///
    /// A missing file is a first run and yields an empty registry. An
    /// unreadable or unparsable file is [`DrtPrepError::RegistryCorruption`]:
    /// dedup history is never silently discarded.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| DrtPrepError::RegistryCorruption {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let entries: BTreeMap<String, String> =
            serde_json::from_str(&content).map_err(|e| DrtPrepError::RegistryCorruption {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        Ok(Self {
            state: Mutex::new(RegistryState {
                entries,
                in_flight: HashSet::new(),
            }),
        })
    }

    /// Write the current state as human-readable JSON, atomically: the
    /// snapshot lands in a temporary file first and is renamed over the
    /// destination, so a crash mid-save never truncates the registry.
    pub fn save(&self, path: &Path) -> Result<()> {
        let entries = {
            let state = self.state.lock().expect("registry mutex poisoned");
            state.entries.clone()
        };

        let content = serde_json::to_string_pretty(&entries).map_err(|e| DrtPrepError::Config {
            message: format!("Failed to serialize registry: {}", e),
        })?;

        let parent = path.parent().ok_or_else(|| DrtPrepError::InvalidPath {
            path: path.display().to_string(),
        })?;

        let mut temp_file = NamedTempFile::new_in(parent)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.as_file().sync_all()?;
        temp_file.persist(path).map_err(|e| DrtPrepError::Io(e.error))?;

        Ok(())
    }

    pub fn contains(&self, digest: &ContentDigest) -> bool {
        let state = self.state.lock().expect("registry mutex poisoned");
        state.entries.contains_key(digest.as_str())
    }

    pub fn lookup(&self, digest: &ContentDigest) -> Option<String> {
        let state = self.state.lock().expect("registry mutex poisoned");
        state.entries.get(digest.as_str()).cloned()
    }

    /// Insert a mapping if absent. Idempotent: re-recording an existing
    /// digest leaves the original mapping untouched.
    pub fn record(&self, digest: &ContentDigest, output: &str) {
        let mut state = self.state.lock().expect("registry mutex poisoned");
        state
            .entries
            .entry(digest.as_str().to_string())
            .or_insert_with(|| output.to_string());
    }

    /// Atomic check-and-claim closing the TOCTOU gap between `contains` and
    /// `record`. Returns [`Claim::Fresh`] exactly once per digest until the
    /// claim is released or committed.
    pub fn claim(&self, digest: &ContentDigest) -> Claim {
        let mut state = self.state.lock().expect("registry mutex poisoned");

        if let Some(output) = state.entries.get(digest.as_str()) {
            return Claim::Duplicate(Some(output.clone()));
        }
        if !state.in_flight.insert(digest.as_str().to_string()) {
            return Claim::Duplicate(None);
        }
        Claim::Fresh
    }

    /// Promote an in-flight claim to a recorded entry after the output CSV
    /// has been written.
    pub fn commit(&self, digest: &ContentDigest, output: &str) {
        let mut state = self.state.lock().expect("registry mutex poisoned");
        state.in_flight.remove(digest.as_str());
        state
            .entries
            .entry(digest.as_str().to_string())
            .or_insert_with(|| output.to_string());
    }

    /// Drop an in-flight claim after a failed conversion, leaving the
    /// registry untouched so the file can be retried in a later run.
    pub fn release(&self, digest: &ContentDigest) {
        let mut state = self.state.lock().expect("registry mutex poisoned");
        state.in_flight.remove(digest.as_str());
    }

    pub fn len(&self) -> usize {
        let state = self.state.lock().expect("registry mutex poisoned");
        state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DedupRegistry {
    fn default() -> Self {
        Self::new()
    }
}
