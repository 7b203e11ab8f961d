//! Errors raised by the script bundling core
//!
//! Every variant is fatal: the bundler performs no local recovery, so callers
//! abort the run on the first error instead of writing a partial asset set.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::types::ModulePath;

/// Who asked for a module, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequiredBy {
    EntryPoint,
    Module(ModulePath),
}

impl std::fmt::Display for RequiredBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EntryPoint => f.write_str("entry point"),
            Self::Module(path) => write!(f, "`{path}`"),
        }
    }
}

#[derive(Debug, Error)]
pub enum BundleError {
    /// Neither the override store nor the source tree has the module
    #[error("module `{path}` required by {required_by} was not found in overrides or source tree")]
    NotFound {
        path: ModulePath,
        required_by: RequiredBy,
    },

    /// A require directive points above the source root
    #[error("require `{name}` in {required_by} resolves outside the source root")]
    OutsideRoot { name: String, required_by: RequiredBy },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The minifier backend rejected a bundle
    #[error("failed to minify bundle `{entry}`: {reason}")]
    Minify { entry: String, reason: String },
}

impl BundleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = BundleError> = std::result::Result<T, E>;
