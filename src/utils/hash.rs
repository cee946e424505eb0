//! Content hashing using FxHash.
//!
//! Uses `rustc_hash::FxHasher` for:
//! - Fast, deterministic hashing (no per-process random seed)
//! - A 64-bit output, rendered as 16 lowercase hex digits
//!
//! # Usage
//!
//! ```ignore
//! use crate::utils::hash;
//!
//! let h = hash::compute(b"some content"); // -> u64
//! let hex = hash::to_hex(h); // -> "a1b2c3d4e5f67890"
//! ```

use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Width of a full hash in hex digits.
pub const HEX_WIDTH: usize = 16;

/// Compute 64-bit hash from byte data.
///
/// The whole buffer is fed in a single `write` so the result depends only on
/// the bytes, never on how they were chunked while reading.
#[inline]
pub fn compute<T: AsRef<[u8]> + ?Sized>(data: &T) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(data.as_ref());
    hasher.finish()
}

/// Render a hash as fixed-width lowercase hex.
#[inline]
pub fn to_hex(hash: u64) -> String {
    format!("{hash:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_is_deterministic() {
        let a = compute("test content for hashing");
        let b = compute(b"test content for hashing".as_slice());
        assert_eq!(a, b);
    }

    #[test]
    fn test_hex_is_fixed_width() {
        assert_eq!(to_hex(0), "0000000000000000");
        assert_eq!(to_hex(u64::MAX).len(), HEX_WIDTH);
        assert_eq!(to_hex(compute("")).len(), HEX_WIDTH);
    }
}
