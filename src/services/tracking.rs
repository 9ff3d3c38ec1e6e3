//! Public tracking codes for loans and requests

use rand::Rng;

/// Unambiguous characters (no 0/O, 1/I/L)
const ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

pub const TRACKING_CODE_LEN: usize = 8;

/// Attempts before giving up on finding an unused code
pub const MAX_ATTEMPTS: usize = 5;

/// Generate a random tracking code
pub fn generate() -> String {
    let mut rng = rand::thread_rng();
    (0..TRACKING_CODE_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Canonical form of a user-typed code
pub fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}
