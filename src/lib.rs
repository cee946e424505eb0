//! assetid - fingerprint static assets by content hash.
//!
//! Two halves, connected only by the manifest file on disk:
//!
//! - [`Pipeline`] walks a source tree, hashes every file, minifies
//!   JavaScript, writes `<name>-<hash>.<ext>` files into a freshly cleaned
//!   output directory and records each mapping in `manifest.json`.
//! - [`Resolver`] loads that manifest at serve time and maps `app.js` to
//!   `/dist/app-a1b2c3d4.js`, falling back to `/dist/app.js` for unknown
//!   assets.

pub mod asset;
pub mod cli;
pub mod config;
pub mod error;
pub mod logger;
pub mod manifest;
pub mod resolver;
pub mod utils;

pub use asset::{AssetFs, BuildSummary, DiskFs, MemoryFs, Minifier, Pipeline, PipelineOptions};
pub use error::{PipelineError, ResolveError};
pub use manifest::Manifest;
pub use resolver::{DirProvider, FileProvider, Resolver};
