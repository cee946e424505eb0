//! Asset fingerprinting: hashing, naming, minification and the build pipeline.

mod fingerprint;
mod fs;
mod kind;
mod minify;
mod pipeline;

// Types
pub use fingerprint::{
    DEFAULT_HASH_LENGTH, Fingerprint, MAX_HASH_LENGTH, MIN_HASH_LENGTH, fingerprinted_path,
};
pub use kind::AssetKind;

// Capabilities
pub use fs::{AssetFs, DiskFs, MemoryFs, OUTPUT_FILE_MODE, lexical_normalize};
pub use minify::{MinifyError, Minifier, OxcMinifier, Passthrough, minify_js};

// Pipeline
pub use pipeline::{BuildSummary, FileRecord, Pipeline, PipelineOptions, run};
