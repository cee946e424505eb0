//! The asset manifest: original relative path → fingerprinted relative path.
//!
//! # Format
//!
//! ```json
//! {
//!   "assets": {
//!     "app.js": "app-a1b2c3d4.js",
//!     "css/site.css": "css/site-0f1e2d3c.css"
//!   }
//! }
//! ```
//!
//! Keys are kept sorted so the same build always encodes to the same bytes.
//! Unknown top-level keys are ignored when decoding; a missing or non-object
//! `assets` is an error.

use std::collections::BTreeMap;
use std::io::Read;

use serde::{Deserialize, Serialize};

/// Default manifest file name inside the output directory.
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    assets: BTreeMap<String, String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a mapping, returning the previous value for `original` if any.
    pub fn insert(
        &mut self,
        original: impl Into<String>,
        fingerprinted: impl Into<String>,
    ) -> Option<String> {
        self.assets.insert(original.into(), fingerprinted.into())
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.assets.get(original).map(String::as_str)
    }

    pub fn contains(&self, original: &str) -> bool {
        self.assets.contains_key(original)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.assets.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Pretty JSON (two-space indent) with a trailing newline.
    pub fn to_json_pretty(&self) -> serde_json::Result<Vec<u8>> {
        let mut out = serde_json::to_vec_pretty(self)?;
        out.push(b'\n');
        Ok(out)
    }

    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn from_reader(reader: impl Read) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            assets: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
