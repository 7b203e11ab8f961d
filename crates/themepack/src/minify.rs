//! Minification backends
//!
//! The bundler only sees the [`Minifier`] trait and hands it one finished
//! bundle at a time. [`OxcMinifier`] parses, compresses, mangles and prints
//! JavaScript with the oxc toolchain.

use anyhow::{Result, anyhow, bail};
use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_minifier::{Minifier as OxcEngine, MinifierOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::types::ContentType;

pub trait Minifier {
    /// Minify a complete buffer of the given content type
    fn minify(&self, content_type: ContentType, input: &[u8]) -> Result<Vec<u8>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OxcMinifier;

impl OxcMinifier {
    pub fn new() -> Self {
        Self
    }

    fn minify_javascript(source: &str) -> Result<String> {
        let allocator = Allocator::default();
        // Bundles are plain concatenated scripts, not ES modules
        let parsed = Parser::new(&allocator, source, SourceType::cjs()).parse();

        if parsed.panicked || !parsed.errors.is_empty() {
            let messages: Vec<String> = parsed.errors.iter().map(ToString::to_string).collect();
            bail!("JavaScript parse failed: {}", messages.join("; "));
        }

        let mut program = parsed.program;
        let minified = OxcEngine::new(MinifierOptions::default()).minify(&allocator, &mut program);

        let printed = Codegen::new()
            .with_options(CodegenOptions::minify())
            .with_scoping(minified.scoping)
            .build(&program);

        Ok(printed.code)
    }
}

impl Minifier for OxcMinifier {
    fn minify(&self, content_type: ContentType, input: &[u8]) -> Result<Vec<u8>> {
        match content_type {
            ContentType::JavaScript => {
                let source = std::str::from_utf8(input)
                    .map_err(|err| anyhow!("{content_type} input is not valid UTF-8: {err}"))?;
                Ok(Self::minify_javascript(source)?.into_bytes())
            }
        }
    }
}
