//! Content fingerprints and the fingerprinted naming rule.
//!
//! ```text
//! css/site.css  +  a1b2c3d4e5f67890  ─(len 8)─▶  css/site-a1b2c3d4.css
//! ```

use std::fmt;

use crate::utils::hash;

/// Hex digits kept in file names unless configured otherwise.
pub const DEFAULT_HASH_LENGTH: usize = 8;

/// Shortest allowed truncation.
pub const MIN_HASH_LENGTH: usize = 4;

/// Longest allowed truncation (the full 64-bit hash).
pub const MAX_HASH_LENGTH: usize = hash::HEX_WIDTH;

/// 64-bit hash of a file's bytes as read from disk, before any transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn of(content: &[u8]) -> Self {
        Self(hash::compute(content))
    }

    /// Full 16-digit hex form.
    pub fn to_hex(self) -> String {
        hash::to_hex(self.0)
    }

    /// The first `len` hex digits, clamped to `1..=16`.
    pub fn truncated(self, len: usize) -> String {
        let mut hex = self.to_hex();
        hex.truncate(len.clamp(1, MAX_HASH_LENGTH));
        hex
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Insert `-<hash>` before the extension of the last path segment.
///
/// `rel` uses `/` separators. The extension follows `Path::extension`: a
/// leading dot does not start one, so `.htaccess` becomes `.htaccess-<hash>`.
pub fn fingerprinted_path(rel: &str, hash: &str) -> String {
    let (dir, base) = match rel.rfind('/') {
        Some(i) => rel.split_at(i + 1),
        None => ("", rel),
    };
    let (stem, ext) = match base.rfind('.') {
        Some(i) if i > 0 => base.split_at(i),
        _ => (base, ""),
    };
    format!("{dir}{stem}-{hash}{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;

    /// xorshift64*, seeded, so failures reproduce.
    struct Rng(u64);

    impl Rng {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 >> 12;
            self.0 ^= self.0 << 25;
            self.0 ^= self.0 >> 27;
            self.0.wrapping_mul(0x2545_f491_4f6c_dd1d)
        }

        fn bytes(&mut self, len: usize) -> Vec<u8> {
            (0..len).map(|_| self.next() as u8).collect()
        }
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = Fingerprint::of(b"function test() { return 'test'; }");
        let b = Fingerprint::of(b"function test() { return 'test'; }");
        assert_eq!(a, b);
        assert_eq!(a.to_hex(), b.to_hex());
        assert_eq!(a.to_hex().len(), 16);
        assert!(a.to_hex().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_distinct_content_distinct_fingerprints() {
        let mut rng = Rng(0x9e37_79b9_7f4a_7c15);
        let mut seen = std::collections::HashMap::new();
        for _ in 0..20_000 {
            let len = (rng.next() % 512) as usize;
            let buf = rng.bytes(len);
            let fp = Fingerprint::of(&buf);
            if let Some(prev) = seen.insert(fp, buf.clone()) {
                assert_eq!(prev, buf, "collision between distinct buffers");
            }
        }
    }

    #[test]
    fn test_single_byte_change_changes_fingerprint() {
        let mut buf = b"body { color: red; }".to_vec();
        let before = Fingerprint::of(&buf);
        buf[15] = b'R';
        assert_ne!(before, Fingerprint::of(&buf));
    }

    #[test]
    fn test_truncated() {
        let fp = Fingerprint::of(b"x");
        assert_eq!(fp.truncated(8).len(), 8);
        assert!(fp.to_hex().starts_with(&fp.truncated(8)));
        assert_eq!(fp.truncated(99), fp.to_hex());
        assert_eq!(fp.truncated(0).len(), 1);
        assert_eq!(fp.to_string(), fp.to_hex());
    }

    #[test]
    fn test_fingerprinted_path() {
        assert_eq!(fingerprinted_path("app.js", "a1b2c3d4"), "app-a1b2c3d4.js");
        assert_eq!(
            fingerprinted_path("subdir/util.js", "a1b2c3d4"),
            "subdir/util-a1b2c3d4.js"
        );
        assert_eq!(
            fingerprinted_path("vendor/lib.min.js", "0f"),
            "vendor/lib.min-0f.js"
        );
        assert_eq!(fingerprinted_path("a.b/README", "0f"), "a.b/README-0f");
        assert_eq!(fingerprinted_path(".htaccess", "0f"), ".htaccess-0f");
        assert_eq!(
            fingerprinted_path("app.js", "a1b2c3d4e5f67890"),
            "app-a1b2c3d4e5f67890.js"
        );
    }
}
