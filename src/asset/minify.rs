//! JavaScript minification.
//!
//! The pipeline only sees the [`Minifier`] trait, a pure `bytes -> bytes`
//! transform. [`OxcMinifier`] is the production implementation; any
//! `Fn(&[u8]) -> Result<Vec<u8>, MinifyError>` also works.

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::minifier::{CompressOptions, Minifier as OxcCompressor, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use thiserror::Error;

/// Why a script could not be minified.
#[derive(Debug, Error)]
pub enum MinifyError {
    #[error("not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    #[error("parse error: {message}")]
    Parse { message: String },
}

/// A pure transform from script source to smaller, equivalent source.
///
/// Must be deterministic and `Sync`: parallel builds share one instance.
pub trait Minifier: Sync {
    fn minify(&self, source: &[u8]) -> Result<Vec<u8>, MinifyError>;
}

impl<F> Minifier for F
where
    F: Fn(&[u8]) -> Result<Vec<u8>, MinifyError> + Sync,
{
    fn minify(&self, source: &[u8]) -> Result<Vec<u8>, MinifyError> {
        self(source)
    }
}

/// Leaves scripts untouched (`minify = false`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Minifier for Passthrough {
    fn minify(&self, source: &[u8]) -> Result<Vec<u8>, MinifyError> {
        Ok(source.to_vec())
    }
}

/// Minifier backed by oxc.
///
/// Always strips comments and whitespace. Identifiers are never mangled, so
/// globals and cross-file references keep working. `compress` additionally
/// enables oxc's constant folding and dead-code removal.
#[derive(Debug, Clone, Copy, Default)]
pub struct OxcMinifier {
    compress: bool,
}

impl OxcMinifier {
    pub const fn new() -> Self {
        Self { compress: false }
    }

    pub const fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

impl Minifier for OxcMinifier {
    fn minify(&self, source: &[u8]) -> Result<Vec<u8>, MinifyError> {
        let text = std::str::from_utf8(source)?;
        let code = minify_js(text, self.compress)?;
        // Codegen terminates every statement, so already-minified input can grow.
        if code.len() > source.len() {
            return Ok(source.to_vec());
        }
        Ok(code.into_bytes())
    }
}

/// Minify JavaScript source code.
pub fn minify_js(source: &str, compress: bool) -> Result<String, MinifyError> {
    let allocator = Allocator::default();
    let source_type = SourceType::mjs();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if ret.panicked || !ret.errors.is_empty() {
        let message = ret
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(MinifyError::Parse { message });
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: None,
        compress: compress.then(CompressOptions::smallest),
    };
    let ret = OxcCompressor::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"
        // greeting helper
        function greet(name) {
            /* build the message */
            return "hello, " + name;
        }

        console.log(greet("world"));
    "#;

    #[test]
    fn test_minify_strips_comments_and_whitespace() {
        let out = OxcMinifier::new().minify(SCRIPT.as_bytes()).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.len() < SCRIPT.len());
        assert!(!out.contains("greeting helper"));
        assert!(!out.contains("build the message"));
        assert!(out.contains("greet"));
    }

    #[test]
    fn test_minify_is_deterministic() {
        let a = OxcMinifier::new().minify(SCRIPT.as_bytes()).unwrap();
        let b = OxcMinifier::new().minify(SCRIPT.as_bytes()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_minify_never_grows_input() {
        for src in ["x=1", "a()", "var a=1,b=2;console.log(a+b)"] {
            let out = OxcMinifier::new().minify(src.as_bytes()).unwrap();
            assert!(out.len() <= src.len(), "{src:?} grew to {out:?}");
        }
        // Unchanged when nothing can be saved.
        assert_eq!(OxcMinifier::new().minify(b"x=1").unwrap(), b"x=1");
    }

    #[test]
    fn test_minify_rejects_invalid_script() {
        let err = OxcMinifier::new().minify(b"function (").unwrap_err();
        assert!(matches!(err, MinifyError::Parse { .. }));
    }

    #[test]
    fn test_minify_rejects_invalid_utf8() {
        let err = OxcMinifier::new().minify(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, MinifyError::InvalidUtf8(_)));
    }

    #[test]
    fn test_closure_minifier() {
        let upper = |src: &[u8]| -> Result<Vec<u8>, MinifyError> { Ok(src.to_ascii_uppercase()) };
        assert_eq!(upper.minify(b"abc").unwrap(), b"ABC");
        assert_eq!(Passthrough.minify(b"a  b").unwrap(), b"a  b");
    }
}
