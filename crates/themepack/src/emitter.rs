//! Per-entry-point bundle emission
//!
//! Every `.js` file directly inside the source directory is an entry point.
//! Files in subdirectories are only reached through require directives.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::{
    error::{BundleError, Result},
    minify::Minifier,
    overrides::OverrideStore,
    reporter::{BundleEvent, Reporter},
    resolver::{BundleSession, ScriptResolver},
    types::{ContentType, MODULE_EXTENSION, ModulePath},
};

/// First line of every generated bundle
pub const BUNDLE_BANNER: &str = "\n\n// Bundled by themepack // ----\n";

/// Inputs of one script bundling run
#[derive(Debug, Clone)]
pub struct ScriptBundleOptions {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Override tree; absent or missing means no overrides
    pub overrides: Option<PathBuf>,
}

pub struct BundleEmitter<'a> {
    resolver: ScriptResolver<'a>,
    destination: PathBuf,
    minifier: Option<&'a dyn Minifier>,
    reporter: &'a dyn Reporter,
}

impl std::fmt::Debug for BundleEmitter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundleEmitter")
            .field("resolver", &self.resolver)
            .field("destination", &self.destination)
            .field("minify", &self.minifier.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> BundleEmitter<'a> {
    pub fn new(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        overrides: &'a OverrideStore,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            resolver: ScriptResolver::new(source, overrides, reporter),
            destination: destination.into(),
            minifier: None,
            reporter,
        }
    }

    /// Route every bundle through `minifier` before writing
    #[must_use]
    pub fn with_minifier(mut self, minifier: &'a dyn Minifier) -> Self {
        self.minifier = Some(minifier);
        self
    }

    /// `.js` files directly in the source directory, sorted by name
    pub fn entry_points(&self) -> Result<Vec<ModulePath>> {
        let source = self.resolver.source_root();
        let entries = fs::read_dir(source).map_err(|err| BundleError::io(source, err))?;

        let mut entry_points = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| BundleError::io(source, err))?;
            let path = entry.path();
            let name = entry.file_name();
            if !name.as_encoded_bytes().ends_with(MODULE_EXTENSION.as_bytes()) || !path.is_file() {
                continue;
            }
            let Some(name) = name.to_str() else {
                return Err(BundleError::io(
                    &path,
                    io::Error::new(io::ErrorKind::InvalidData, "entry point name is not valid UTF-8"),
                ));
            };
            if let Some(module) = ModulePath::parse(name) {
                entry_points.push(module);
            }
        }

        entry_points.sort();
        Ok(entry_points)
    }

    /// Produce the bytes of one bundle without writing them
    pub fn build(&self, entry: &ModulePath) -> Result<Vec<u8>> {
        self.reporter.report(BundleEvent::BundleStarted {
            entry: entry.clone(),
        });

        let mut session = BundleSession::with_banner(BUNDLE_BANNER);
        self.resolver.resolve(entry, &mut session)?;
        let output = session.into_output();

        let Some(minifier) = self.minifier else {
            return Ok(output);
        };
        let minified = minifier
            .minify(ContentType::JavaScript, &output)
            .map_err(|err| BundleError::Minify {
                entry: entry.to_string(),
                reason: format!("{err:#}"),
            })?;
        self.reporter.report(BundleEvent::Minified {
            entry: entry.clone(),
            before: output.len(),
            after: minified.len(),
        });
        Ok(minified)
    }

    /// Bundle `entry` and write it to the destination under its own name
    pub fn emit_bundle(&self, entry: &ModulePath) -> Result<PathBuf> {
        let output = self.build(entry)?;
        let target = self.destination.join(entry.file_name());
        fs::write(&target, &output).map_err(|err| BundleError::io(&target, err))?;

        self.reporter.report(BundleEvent::BundleWritten {
            path: target.clone(),
            bytes: output.len(),
        });
        Ok(target)
    }

    /// Emit every entry point, stopping at the first failure
    pub fn bundle_all(&self) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.destination)
            .map_err(|err| BundleError::io(&self.destination, err))?;

        self.entry_points()?
            .iter()
            .map(|entry| self.emit_bundle(entry))
            .collect()
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

/// Load overrides, then bundle every entry point of `options.source`
pub fn bundle_scripts(
    options: &ScriptBundleOptions,
    minifier: Option<&dyn Minifier>,
    reporter: &dyn Reporter,
) -> Result<Vec<PathBuf>> {
    let overrides = match &options.overrides {
        Some(root) => OverrideStore::load_if_present(root, reporter)?,
        None => OverrideStore::empty(),
    };

    let mut emitter = BundleEmitter::new(&options.source, &options.destination, &overrides, reporter);
    if let Some(minifier) = minifier {
        emitter = emitter.with_minifier(minifier);
    }
    emitter.bundle_all()
}
