//! Access to the vendored theme sources
//!
//! The theme is either an existing local clone or a fresh `git clone` into a
//! temporary directory. Stylesheets are edited during the run, so they
//! always live in a temporary working copy and a local clone is never
//! modified.

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context, Result, bail};
use log::info;
use tempfile::TempDir;

use crate::fs_util::TreeCopier;

pub trait VendorFetcher {
    /// Fetch `repo` (at `branch` when given) into the not yet existing `dest`
    fn fetch(&self, repo: &str, branch: Option<&str>, dest: &Path) -> Result<()>;
}

/// Clones with the `git` executable
#[derive(Debug, Clone)]
pub struct GitFetcher {
    binary: PathBuf,
}

impl Default for GitFetcher {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("git"),
        }
    }
}

impl VendorFetcher for GitFetcher {
    fn fetch(&self, repo: &str, branch: Option<&str>, dest: &Path) -> Result<()> {
        info!("Clone {repo} into {} ...", dest.display());

        let mut command = Command::new(&self.binary);
        command.arg("clone");
        if let Some(branch) = branch {
            command.args(["-b", branch]);
        }
        let output = command
            .arg(repo)
            .arg(dest)
            .output()
            .with_context(|| format!("Failed to run {}", self.binary.display()))?;

        if !output.status.success() {
            bail!(
                "git clone of {repo} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

/// Where the vendored theme comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VendorSource {
    /// An existing checkout on disk
    Local(PathBuf),
    /// A repository to clone for this run
    Remote { repo: String, branch: Option<String> },
}

/// Vendored theme sources available for the duration of a run
#[derive(Debug)]
pub struct VendorCheckout {
    root: PathBuf,
    stylesheets: PathBuf,
    // Removed on drop
    _workdir: TempDir,
}

impl VendorCheckout {
    pub fn acquire(
        source: &VendorSource,
        fetcher: &dyn VendorFetcher,
        copier: &dyn TreeCopier,
    ) -> Result<Self> {
        let workdir = tempfile::Builder::new()
            .prefix("themepack")
            .tempdir()
            .context("Failed to create tmpdir")?;

        match source {
            VendorSource::Local(root) => {
                info!("Use existing theme clone in {}", root.display());
                let stylesheets = workdir.path().join("source").join("stylesheets");
                copier
                    .copy_tree(&root.join("source").join("stylesheets"), &stylesheets)
                    .context("Failed to copy stylesheets")?;

                Ok(Self {
                    root: root.clone(),
                    stylesheets,
                    _workdir: workdir,
                })
            }
            VendorSource::Remote { repo, branch } => {
                info!("Fetch theme from {repo}");
                let root = workdir.path().join("theme");
                fetcher
                    .fetch(repo, branch.as_deref(), &root)
                    .context("Failed to clone theme")?;

                Ok(Self {
                    stylesheets: root.join("source").join("stylesheets"),
                    root,
                    _workdir: workdir,
                })
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `source/<name>` inside the vendored theme
    pub fn source_dir(&self, name: &str) -> PathBuf {
        self.root.join("source").join(name)
    }

    pub fn javascripts(&self) -> PathBuf {
        self.source_dir("javascripts")
    }

    /// Writable stylesheet directory for this run
    pub fn stylesheets(&self) -> &Path {
        &self.stylesheets
    }
}
