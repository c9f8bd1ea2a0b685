use sha2::{Digest, Sha256};

/// Stable 64-bit fingerprint of a dictionary term.
///
/// Computed from the concept code and the full token sequence only, so rank,
/// instance counts and lookup-case flags never change it. The value is the
/// first eight bytes of SHA256(`{code}_{tokens joined by ' '}`), big-endian.
pub fn compute_term_hash<S: AsRef<str>>(concept_code: i64, tokens: &[S]) -> i64 {
    let mut hasher = Sha256::new();
    hasher.update(concept_code.to_string().as_bytes());
    hasher.update(b"_");
    for (i, token) in tokens.iter().enumerate() {
        if i > 0 {
            hasher.update(b" ");
        }
        hasher.update(token.as_ref().as_bytes());
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(bytes)
}
