//! Error types for the build pipeline and the runtime resolver.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::asset::MinifyError;

/// Errors that abort a pipeline run.
///
/// Every variant carries the path it failed on; there is no partial-success
/// mode, so the first error ends the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot read source `{path}`")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("source path `{0}` is not valid UTF-8 and cannot be a manifest key")]
    NonUtf8Path(PathBuf),

    #[error("cannot write output `{path}`")]
    OutputUnwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to minify `{path}`")]
    TransformFailure {
        path: PathBuf,
        #[source]
        source: MinifyError,
    },

    #[error("failed to encode manifest")]
    ManifestEncodeFailure(#[source] serde_json::Error),

    #[error(
        "output `{output_dir}` equals or contains source `{source_dir}`; cleaning it would delete the sources"
    )]
    UnsafeLayout {
        source_dir: PathBuf,
        output_dir: PathBuf,
    },
}

impl PipelineError {
    pub(crate) fn source_unreadable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::SourceUnreadable {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn output_unwritable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::OutputUnwritable {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised while loading a manifest into a [`Resolver`](crate::Resolver).
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("manifest `{path}` not found")]
    ManifestMissing {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("manifest `{path}` is malformed")]
    ManifestMalformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
