//! SHA-256 checksums of migration SQL, used to detect edits to migrations
//! that have already been applied

use sha2::{Digest, Sha256};

pub fn compute_checksum(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
