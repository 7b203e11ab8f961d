//! Site-local files that shadow vendored scripts
//!
//! The store is loaded once per bundler and only read afterwards. A key's
//! presence makes the override the sole source for that module path.

use std::{fs, io, path::Path};

use rustc_hash::FxHashMap;
use walkdir::WalkDir;

use crate::{
    error::{BundleError, Result},
    reporter::{BundleEvent, Reporter},
    types::ModulePath,
};

#[derive(Debug, Default)]
pub struct OverrideStore {
    files: FxHashMap<ModulePath, Vec<u8>>,
}

impl OverrideStore {
    /// A store without overrides
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every regular file below `root`, keyed by its relative path.
    ///
    /// Fails if `root` is not a directory, cannot be walked, or any file
    /// cannot be read, including when `root` does not exist.
    pub fn load(root: &Path, reporter: &dyn Reporter) -> Result<Self> {
        let metadata = fs::metadata(root).map_err(|err| BundleError::io(root, err))?;
        if !metadata.is_dir() {
            return Err(BundleError::io(
                root,
                io::Error::new(io::ErrorKind::InvalidInput, "overrides root is not a directory"),
            ));
        }

        reporter.report(BundleEvent::OverridesScanned {
            root: root.to_path_buf(),
        });

        let mut files = FxHashMap::default();
        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = entry.map_err(|err| {
                let path = err.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
                BundleError::io(path, io::Error::from(err))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(module) = ModulePath::from_file_under(root, entry.path()) else {
                continue;
            };
            let content = fs::read(entry.path()).map_err(|err| BundleError::io(entry.path(), err))?;

            reporter.report(BundleEvent::OverrideLoaded {
                path: module.clone(),
            });
            files.insert(module, content);
        }

        Ok(Self { files })
    }

    /// Like [`OverrideStore::load`], but an absent `root` means no overrides.
    ///
    /// Only absence is forgiven: a root that exists but is not a readable
    /// directory is still an error.
    pub fn load_if_present(root: &Path, reporter: &dyn Reporter) -> Result<Self> {
        match fs::symlink_metadata(root) {
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                reporter.report(BundleEvent::OverridesAbsent {
                    root: root.to_path_buf(),
                });
                Ok(Self::empty())
            }
            Err(err) => Err(BundleError::io(root, err)),
            Ok(_) => Self::load(root, reporter),
        }
    }

    pub fn lookup(&self, path: &ModulePath) -> Option<&[u8]> {
        self.files.get(path).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Overridden module paths, sorted
    pub fn paths(&self) -> Vec<&ModulePath> {
        let mut paths: Vec<_> = self.files.keys().collect();
        paths.sort();
        paths
    }
}

impl FromIterator<(ModulePath, Vec<u8>)> for OverrideStore {
    fn from_iter<I: IntoIterator<Item = (ModulePath, Vec<u8>)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}
