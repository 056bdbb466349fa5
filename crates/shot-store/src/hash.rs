use blake3::Hasher;

/// Content id for a blob: `<prefix>_<hex>`, with the digest truncated so
/// file names stay short. 32 hex chars keeps collisions out of reach for
/// any realistic screenshot volume.
pub fn content_id(prefix: &str, bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    let hex = hasher.finalize().to_hex();
    format!("{}_{}", prefix, &hex.as_str()[..32])
}
