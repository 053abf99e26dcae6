use crate::error::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Hex-encoded SHA-256 fingerprint of a file's byte content. Identical bytes
/// always yield the identical digest, regardless of filename or path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDigest(String);

impl ContentDigest {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Streams file bytes through SHA-256 in fixed-size blocks, never holding the
/// whole file in memory.
pub struct ContentHasher {
    block_size: usize,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self {
            block_size: 64 * 1024,
        }
    }

    pub fn with_block_size(mut self, size: usize) -> Self {
        self.block_size = size.max(512);
        self
    }

    pub fn hash_file(&self, path: &Path) -> Result<ContentDigest> {
        let mut file = File::open(path)?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; self.block_size];

        loop {
            let bytes_read = file.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(ContentDigest(format!("{:x}", hasher.finalize())))
    }

    pub fn hash_bytes(&self, content: &[u8]) -> ContentDigest {
        ContentDigest(format!("{:x}", Sha256::digest(content)))
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}
