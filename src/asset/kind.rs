//! Asset kind definitions.

use std::path::Path;

/// How an asset's content is treated before it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// JavaScript, passed through the minifier.
    Script,
    /// Everything else (CSS included), copied byte-for-byte.
    Passthrough,
}

impl AssetKind {
    /// Classify by extension. Only a lowercase `.js` extension is a script.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("js") => Self::Script,
            _ => Self::Passthrough,
        }
    }
}
