//! `[build]` section configuration.
//!
//! ```toml
//! [build]
//! source = "web/assets"
//! output = "public/dist"
//! hash_length = 8
//! minify = true
//! ignore = [".DS_Store"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::asset::DEFAULT_HASH_LENGTH;
use crate::manifest::MANIFEST_FILE;

/// Build settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Source directory containing assets.
    pub source: PathBuf,

    /// Directory the fingerprinted assets and manifest are written to.
    /// Wiped and recreated on every run.
    pub output: PathBuf,

    /// Hex digits of the content hash kept in file names.
    pub hash_length: usize,

    /// Minify `.js` files. Other files are always copied unchanged.
    pub minify: bool,

    /// Allow the minifier to fold constants and drop dead code.
    pub compress: bool,

    /// Process files on a thread pool.
    pub parallel: bool,

    /// Manifest file name inside `output`.
    pub manifest: String,

    /// File names skipped during the walk.
    pub ignore: Vec<String>,

    /// Log every processed asset.
    pub verbose: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: "src".into(),
            output: "src".into(),
            hash_length: DEFAULT_HASH_LENGTH,
            minify: true,
            compress: false,
            parallel: true,
            manifest: MANIFEST_FILE.to_string(),
            ignore: Vec::new(),
            verbose: false,
        }
    }
}
