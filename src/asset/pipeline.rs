//! Fingerprinting pipeline: source tree in, fingerprinted tree + manifest out.
//!
//! # Flow
//!
//! ```text
//! list source ─▶ clean output ─▶ per file: read → hash → minify? → write
//!                                                    │
//!                                   manifest.insert ◀┘ (calling thread)
//!                                                    │
//!                                   write manifest.json
//! ```
//!
//! The source tree is listed before the output directory is cleaned, so a
//! missing source aborts the run without touching a previous build.
//! Any error ends the run; files already written stay where they are.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use rayon::prelude::*;

use super::fingerprint::{DEFAULT_HASH_LENGTH, Fingerprint, fingerprinted_path};
use super::fs::{AssetFs, DiskFs};
use super::kind::AssetKind;
use super::minify::{Minifier, OxcMinifier};
use crate::error::PipelineError;
use crate::manifest::{MANIFEST_FILE, Manifest};
use crate::{debug, log};

/// Tunables for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Hex digits of the fingerprint kept in file names.
    pub hash_length: usize,
    /// Process files on the rayon pool.
    pub parallel: bool,
    /// Manifest file name, relative to the output root.
    pub manifest_name: String,
    /// Basenames skipped during the walk.
    pub ignore: Vec<String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            hash_length: DEFAULT_HASH_LENGTH,
            parallel: true,
            manifest_name: MANIFEST_FILE.to_string(),
            ignore: Vec::new(),
        }
    }
}

/// One source file on its way to the output tree.
///
/// Lives only between reading the source and writing the output.
#[derive(Debug)]
pub struct FileRecord {
    /// Manifest key: path relative to the source root, `/`-separated.
    pub rel_path: String,
    pub source: PathBuf,
    /// Hash of the bytes as read, before any transform.
    pub fingerprint: Fingerprint,
    pub kind: AssetKind,
    /// Manifest value: `rel_path` with `-<hash>` before the extension.
    pub fingerprinted: String,
    /// Bytes to write.
    pub content: Vec<u8>,
    /// Size of the source before the transform.
    pub source_len: usize,
}

/// Outcome of writing one [`FileRecord`].
#[derive(Debug, Clone)]
struct Emitted {
    rel_path: String,
    fingerprinted: String,
    minified: bool,
    bytes_in: u64,
    bytes_out: u64,
}

/// What a completed run produced.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub manifest: Manifest,
    pub manifest_path: PathBuf,
    /// Files written, manifest excluded.
    pub files: usize,
    /// Scripts passed through the minifier.
    pub minified: usize,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

/// Fingerprints a source tree into an output tree.
pub struct Pipeline<F> {
    fs: F,
    minifier: Box<dyn Minifier>,
    options: PipelineOptions,
}

impl<F: AssetFs> Pipeline<F> {
    /// Pipeline over `fs` with the oxc minifier and default options.
    pub fn new(fs: F) -> Self {
        Self {
            fs,
            minifier: Box::new(OxcMinifier::new()),
            options: PipelineOptions::default(),
        }
    }

    pub fn with_minifier(mut self, minifier: impl Minifier + 'static) -> Self {
        self.minifier = Box::new(minifier);
        self
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Rebuild `output` from `source` and write the manifest.
    pub fn run(&self, source: &Path, output: &Path) -> Result<BuildSummary, PipelineError> {
        let excluded = self.check_layout(source, output)?;
        let files = self.collect_sources(source, excluded.as_deref())?;

        // Clean slate: nothing from a previous build may survive
        self.fs
            .remove_dir_all(output)
            .map_err(|e| PipelineError::output_unwritable(output, e))?;
        self.fs
            .create_dir_all(output)
            .map_err(|e| PipelineError::output_unwritable(output, e))?;

        let emitted: Vec<Emitted> = if self.options.parallel {
            files
                .par_iter()
                .map(|path| self.process(source, output, path))
                .collect::<Result<_, _>>()?
        } else {
            files
                .iter()
                .map(|path| self.process(source, output, path))
                .collect::<Result<_, _>>()?
        };

        let mut summary = BuildSummary {
            manifest: Manifest::new(),
            manifest_path: output.join(&self.options.manifest_name),
            files: 0,
            minified: 0,
            bytes_in: 0,
            bytes_out: 0,
        };
        let mut targets = HashSet::with_capacity(emitted.len());
        for entry in emitted {
            if !targets.insert(entry.fingerprinted.clone()) {
                log!("warning"; "fingerprint collision on `{}`, output overwritten", entry.fingerprinted);
            }
            summary.files += 1;
            summary.minified += usize::from(entry.minified);
            summary.bytes_in += entry.bytes_in;
            summary.bytes_out += entry.bytes_out;
            summary.manifest.insert(entry.rel_path, entry.fingerprinted);
        }

        let encoded = summary
            .manifest
            .to_json_pretty()
            .map_err(PipelineError::ManifestEncodeFailure)?;
        self.fs
            .write(&summary.manifest_path, &encoded)
            .map_err(|e| PipelineError::output_unwritable(&summary.manifest_path, e))?;

        Ok(summary)
    }

    /// Refuse layouts where cleaning `output` would delete `source`.
    ///
    /// Returns the subtree of `source` to skip when `output` lies inside it.
    fn check_layout(&self, source: &Path, output: &Path) -> Result<Option<PathBuf>, PipelineError> {
        let source_norm = self.fs.normalize(source);
        let output_norm = self.fs.normalize(output);

        if source_norm.starts_with(&output_norm) {
            return Err(PipelineError::UnsafeLayout {
                source_dir: source.to_path_buf(),
                output_dir: output.to_path_buf(),
            });
        }

        Ok(output_norm
            .strip_prefix(&source_norm)
            .ok()
            .map(|inner| source.join(inner)))
    }

    /// Every file to process, sorted, minus ignored names and `excluded`.
    fn collect_sources(
        &self,
        source: &Path,
        excluded: Option<&Path>,
    ) -> Result<Vec<PathBuf>, PipelineError> {
        let mut files = self
            .fs
            .list_files(source)
            .map_err(|e| PipelineError::source_unreadable(source, e))?;

        files.retain(|path| {
            if excluded.is_some_and(|dir| path.starts_with(dir)) {
                return false;
            }
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            !self.options.ignore.iter().any(|ignored| ignored == name)
        });
        files.sort();
        Ok(files)
    }

    /// Read, hash and transform one file.
    pub fn prepare(&self, source_root: &Path, path: &Path) -> Result<FileRecord, PipelineError> {
        let rel = path.strip_prefix(source_root).map_err(|_| {
            PipelineError::source_unreadable(
                path,
                std::io::Error::other("path is outside the source root"),
            )
        })?;
        let rel_path = manifest_key(rel).ok_or_else(|| PipelineError::NonUtf8Path(path.into()))?;

        let bytes = self
            .fs
            .read(path)
            .map_err(|e| PipelineError::source_unreadable(path, e))?;
        let fingerprint = Fingerprint::of(&bytes);
        let fingerprinted =
            fingerprinted_path(&rel_path, &fingerprint.truncated(self.options.hash_length));

        let kind = AssetKind::from_path(rel);
        let source_len = bytes.len();
        let content = match kind {
            AssetKind::Script => {
                self.minifier
                    .minify(&bytes)
                    .map_err(|source| PipelineError::TransformFailure {
                        path: path.to_path_buf(),
                        source,
                    })?
            }
            AssetKind::Passthrough => bytes,
        };

        Ok(FileRecord {
            rel_path,
            source: path.to_path_buf(),
            fingerprint,
            kind,
            fingerprinted,
            content,
            source_len,
        })
    }

    fn process(
        &self,
        source_root: &Path,
        output_root: &Path,
        path: &Path,
    ) -> Result<Emitted, PipelineError> {
        let record = self.prepare(source_root, path)?;
        let dest = output_root.join(&record.fingerprinted);
        self.fs
            .write(&dest, &record.content)
            .map_err(|e| PipelineError::output_unwritable(&dest, e))?;

        debug!("assets"; "{} -> {}", record.rel_path, record.fingerprinted);

        Ok(Emitted {
            bytes_in: record.source_len as u64,
            bytes_out: record.content.len() as u64,
            minified: record.kind == AssetKind::Script,
            rel_path: record.rel_path,
            fingerprinted: record.fingerprinted,
        })
    }
}

/// Build assets from `source` into `output` on the real filesystem with
/// default options.
pub fn run(source: &Path, output: &Path) -> Result<BuildSummary, PipelineError> {
    Pipeline::new(DiskFs).run(source, output)
}

/// `/`-joined UTF-8 form of a relative path, `None` if any segment is not
/// UTF-8 or the path is not purely relative.
fn manifest_key(rel: &Path) -> Option<String> {
    let mut key = String::new();
    for component in rel.components() {
        match component {
            Component::Normal(segment) => {
                if !key.is_empty() {
                    key.push('/');
                }
                key.push_str(segment.to_str()?);
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    (!key.is_empty()).then_some(key)
}
