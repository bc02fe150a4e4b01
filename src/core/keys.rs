use sha2::{Digest, Sha256};

/// Derive a deterministic cache key from rendered call arguments. Parts
/// are joined with `:` and digested, so the key is stable across
/// processes and safe to embed in store key names. Argument order is
/// significant; callers rendering named arguments should sort them first.
pub fn derive_key<P: AsRef<str>>(parts: &[P]) -> String {
    let joined = parts
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join(":");
    hex::encode(Sha256::digest(joined.as_bytes()))
}
