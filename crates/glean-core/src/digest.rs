//! # Content Digests
//!
//! SHA-256 hex digests used to key on-disk schema cache entries. A locator
//! such as `https://example.com/a/b.json?x=1` contains characters that are
//! not portable in file names; its digest always is.

use sha2::{Digest, Sha256};

/// Compute the lowercase hex SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
