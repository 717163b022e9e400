//! Content fingerprints for uploaded bytes

/// BLAKE3 digest of `bytes` as 64 lowercase hex characters
pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
