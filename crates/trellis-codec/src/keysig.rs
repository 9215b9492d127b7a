use sha2::{Digest, Sha256};

/// Digest of the set of panel keys: order-independent, hex encoded.
pub fn keysig<'a, I>(panel_keys: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut keys: Vec<&str> = panel_keys.into_iter().collect();
    keys.sort_unstable();
    let mut hasher = Sha256::new();
    for key in keys {
        hasher.update(key.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}
