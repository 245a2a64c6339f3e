use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Entropy for verification tokens and session ids.
pub const TOKEN_BYTES: usize = 32;

/// `len` random bytes from the OS generator, hex encoded.
pub fn random_hex(len: usize) -> String {
    let mut buf = vec![0u8; len];
    OsRng.fill_bytes(&mut buf);
    buf.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn generate_token() -> String {
    random_hex(TOKEN_BYTES)
}

pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}
