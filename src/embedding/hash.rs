//! Deterministic hash-based embeddings.
//!
//! An offline stand-in for a real embedding model: the same text, salt and
//! dimension always produce the same vector, so benchmarks are reproducible
//! without network access.

use super::l2_normalize;
use sha2::{Digest, Sha256};

/// Embed `text` into a unit vector of length `dim`.
///
/// The seed digest is `SHA-256(salt + "::" + text)`. It is expanded by hashing
/// `seed ‖ counter` (counter as little-endian u32, starting at 0) and reading
/// each block as little-endian u32 words, each mapped to `(n / 2^32) * 2 - 1`.
pub fn local_hash_embed(text: &str, dim: usize, salt: &str) -> Vec<f64> {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b"::");
    hasher.update(text.as_bytes());
    let seed = hasher.finalize();

    let mut out: Vec<f64> = Vec::with_capacity(dim);
    let mut counter: u32 = 0;
    while out.len() < dim {
        let block = Sha256::new()
            .chain_update(seed)
            .chain_update(counter.to_le_bytes())
            .finalize();

        for word in block.chunks_exact(4) {
            if out.len() >= dim {
                break;
            }
            let n = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
            out.push((n as f64 / 4_294_967_296.0) * 2.0 - 1.0);
        }
        counter = counter.wrapping_add(1);
    }

    l2_normalize(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f64]) -> f64 {
        v.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    #[test]
    fn test_deterministic() {
        let a = local_hash_embed("hello world", 16, "A");
        let b = local_hash_embed("hello world", 16, "A");
        assert_eq!(a, b);
    }

    #[test]
    fn test_salt_and_text_change_output() {
        let base = local_hash_embed("hello world", 16, "A");
        assert_ne!(base, local_hash_embed("hello world", 16, "B"));
        assert_ne!(base, local_hash_embed("bye world", 16, "A"));
    }

    #[test]
    fn test_length_and_unit_norm() {
        // 100 spans several hash blocks (8 words per block).
        for dim in [1, 7, 8, 9, 32, 100] {
            let v = local_hash_embed("some text", dim, "");
            assert_eq!(v.len(), dim);
            assert!((norm(&v) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_prefix_stability() {
        // Components are produced in order, so a longer vector extends a
        // shorter one before normalization.
        let short = local_hash_embed("text", 8, "s");
        let long = local_hash_embed("text", 16, "s");
        let ratio = long[0] / short[0];
        for i in 0..8 {
            assert!((long[i] - short[i] * ratio).abs() < 1e-12);
        }
    }

    #[test]
    fn test_known_vector() {
        let v = local_hash_embed("hello world", 4, "A");
        assert!((v[2] - 0.827_430_018_20).abs() < 1e-10);
    }

    #[test]
    fn test_zero_dim() {
        assert!(local_hash_embed("text", 0, "").is_empty());
    }
}
