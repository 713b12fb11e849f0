//! Content hashing.
//!
//! Stable digests used for file ownership tracking and integrity checks.

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{Result, WfmError};

/// Hash raw bytes into a `sha256:<hex>` digest string.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    format!("sha256:{}", hex::encode(digest))
}

/// Hash a file's contents.
pub fn hash_file(path: &Path) -> Result<String> {
    let data = fs::read(path)
        .map_err(|err| WfmError::Config(format!("read {}: {err}", path.display())))?;
    Ok(hash_bytes(&data))
}
