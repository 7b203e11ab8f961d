//! Shared type definitions for the themepack crate
//!
//! Module identity lives here because the override store, the resolver and
//! the emitter all key on it.

use std::{
    fmt,
    path::{Component, Path, PathBuf},
};

use cow_utils::CowUtils;

/// File extension appended to every required module name
pub const MODULE_EXTENSION: &str = ".js";

/// Identity of a script module: its path relative to the source root
///
/// Always `/`-separated and lexically normalized, so `lib/./a.js`,
/// `lib\a.js` and `app/../lib/a.js` are the same module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModulePath(String);

impl ModulePath {
    /// Normalize a `/` or `\` separated relative path.
    ///
    /// Returns `None` when the path climbs above the root or is empty.
    pub fn parse(raw: &str) -> Option<Self> {
        let unified = raw.cow_replace('\\', "/");
        let mut segments: Vec<&str> = Vec::new();

        for segment in unified.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop()?;
                }
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            return None;
        }
        Some(Self(segments.join("/")))
    }

    /// Build the identity of a file found under `root`
    pub fn from_file_under(root: &Path, file: &Path) -> Option<Self> {
        let relative = file.strip_prefix(root).ok()?;
        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Self::parse(&parts.join("/"))
    }

    /// Path of the module required as `name` from this module.
    ///
    /// Names resolve against the directory of the requiring file, and the
    /// module extension is appended before normalization.
    pub fn join_require(&self, name: &str) -> Option<Self> {
        let dir = self.parent_dir();
        if dir.is_empty() {
            Self::parse(&format!("{name}{MODULE_EXTENSION}"))
        } else {
            Self::parse(&format!("{dir}/{name}{MODULE_EXTENSION}"))
        }
    }

    /// Directory part of the path, empty for modules at the source root
    pub fn parent_dir(&self) -> &str {
        self.0.rsplit_once('/').map_or("", |(dir, _)| dir)
    }

    /// Final path segment, the output name of an entry point
    pub fn file_name(&self) -> &str {
        self.0.rsplit_once('/').map_or(&self.0, |(_, name)| name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Location of this module on disk below `root`
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        self.0.split('/').fold(root.to_path_buf(), |acc, part| acc.join(part))
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content type handed to a minifier backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    JavaScript,
}

impl ContentType {
    pub fn mime(self) -> &'static str {
        match self {
            Self::JavaScript => "text/javascript",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}
