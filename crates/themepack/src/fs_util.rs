//! Filesystem helpers used while staging the target tree

use std::{fs, io, path::Path};

use anyhow::{Context, Result};
use walkdir::WalkDir;

pub trait TreeCopier {
    /// Copy the directory tree `src` into `dst`, creating `dst` as needed
    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<()>;
}

/// Recursive copy built on walkdir
#[derive(Debug, Default, Clone, Copy)]
pub struct WalkdirCopier;

impl TreeCopier for WalkdirCopier {
    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<()> {
        for entry in WalkDir::new(src).follow_links(true) {
            let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
            let relative = entry.path().strip_prefix(src)?;
            let target = dst.join(relative);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)
                    .with_context(|| format!("Failed to create {}", target.display()))?;
                continue;
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target).with_context(|| {
                format!("Failed to copy {} to {}", entry.path().display(), target.display())
            })?;
        }
        Ok(())
    }
}

/// Remove `dir` if present and recreate it empty
pub fn reset_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to remove {}", dir.display()));
        }
    }
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))
}
