use sha2::{Digest, Sha256};

pub(crate) fn sha256_hex_bytes(bytes: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(bytes)))
}

/// Digest (`sha256:...`) of raw file bytes.
pub fn file_digest(bytes: &[u8]) -> String {
    sha256_hex_bytes(bytes)
}
