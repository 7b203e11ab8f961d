//! Dependency-ordered resolution of script modules
//!
//! Modules form an implicit directed graph: nodes are [`ModulePath`]s, edges
//! are `//= require` directives. The resolver walks it depth-first with an
//! explicit stack and appends each module's bytes only after all of its
//! dependencies, so a dependency always precedes its dependents in the
//! output.
//!
//! A module is marked as visited before its own requires are followed. A
//! require that reaches a module still being visited is skipped, which breaks
//! cycles: every member is emitted once, in the position where the walk first
//! finishes it. Which member of a cycle comes first is not specified beyond
//! that.

use std::{borrow::Cow, fs, io, path::PathBuf};

use indexmap::IndexMap;

use crate::{
    directives::extract_requires,
    error::{BundleError, RequiredBy, Result},
    overrides::OverrideStore,
    reporter::{BundleEvent, ContentOrigin, Reporter},
    types::ModulePath,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Visiting,
    Done,
}

/// State of one bundle under construction
///
/// Owns the traversal state and the output buffer. A session is created per
/// entry point and consumed by [`BundleSession::into_output`], so nothing
/// carries over between bundles.
#[derive(Debug, Default)]
pub struct BundleSession {
    state: IndexMap<ModulePath, VisitState>,
    emitted: Vec<ModulePath>,
    output: Vec<u8>,
}

impl BundleSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the buffer with a banner line
    pub fn with_banner(banner: &str) -> Self {
        Self {
            output: banner.as_bytes().to_vec(),
            ..Self::default()
        }
    }

    pub fn is_seen(&self, path: &ModulePath) -> bool {
        self.state.contains_key(path)
    }

    /// Modules in the order their content was appended
    pub fn emitted(&self) -> &[ModulePath] {
        &self.emitted
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn into_output(self) -> Vec<u8> {
        self.output
    }

    /// Returns the previous state, marking the module as visiting if unseen
    fn enter(&mut self, path: &ModulePath) -> Option<VisitState> {
        if let Some(state) = self.state.get(path) {
            return Some(*state);
        }
        self.state.insert(path.clone(), VisitState::Visiting);
        None
    }

    fn append(&mut self, path: ModulePath, content: &[u8]) {
        self.output.extend_from_slice(content);
        self.state.insert(path.clone(), VisitState::Done);
        self.emitted.push(path);
    }
}

enum Step<'a> {
    Visit {
        path: ModulePath,
        required_by: RequiredBy,
    },
    Emit {
        path: ModulePath,
        content: Cow<'a, [u8]>,
        origin: ContentOrigin,
    },
}

/// Resolves modules below one source root, consulting overrides first
pub struct ScriptResolver<'a> {
    source_root: PathBuf,
    overrides: &'a OverrideStore,
    reporter: &'a dyn Reporter,
}

impl std::fmt::Debug for ScriptResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptResolver")
            .field("source_root", &self.source_root)
            .field("overrides", &self.overrides.len())
            .finish_non_exhaustive()
    }
}

impl<'a> ScriptResolver<'a> {
    pub fn new(
        source_root: impl Into<PathBuf>,
        overrides: &'a OverrideStore,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            overrides,
            reporter,
        }
    }

    pub fn source_root(&self) -> &std::path::Path {
        &self.source_root
    }

    /// Append `entry` and everything it transitively requires to `session`.
    ///
    /// Modules already seen by this session are skipped silently. Fails on
    /// the first module that cannot be found or read.
    pub fn resolve(&self, entry: &ModulePath, session: &mut BundleSession) -> Result<()> {
        let mut stack = vec![Step::Visit {
            path: entry.clone(),
            required_by: RequiredBy::EntryPoint,
        }];

        while let Some(step) = stack.pop() {
            match step {
                Step::Visit { path, required_by } => {
                    match session.enter(&path) {
                        Some(VisitState::Visiting) => {
                            if let RequiredBy::Module(requirer) = required_by {
                                self.reporter.report(BundleEvent::CycleBroken {
                                    path,
                                    required_by: requirer,
                                });
                            }
                            continue;
                        }
                        Some(VisitState::Done) => continue,
                        None => {}
                    }

                    let (content, origin) = self.load(&path, &required_by)?;
                    let requires = self.required_paths(&path, &content)?;

                    let requirer = RequiredBy::Module(path.clone());
                    // Reversed so the first require is popped first
                    let dependencies: Vec<_> = requires
                        .into_iter()
                        .rev()
                        .map(|dependency| Step::Visit {
                            path: dependency,
                            required_by: requirer.clone(),
                        })
                        .collect();

                    stack.push(Step::Emit {
                        path,
                        content,
                        origin,
                    });
                    stack.extend(dependencies);
                }
                Step::Emit {
                    path,
                    content,
                    origin,
                } => {
                    session.append(path.clone(), &content);
                    self.reporter.report(BundleEvent::ModuleEmitted { path, origin });
                }
            }
        }

        Ok(())
    }

    /// Bytes of a module: the override if one exists, the source file otherwise
    fn load(
        &self,
        path: &ModulePath,
        required_by: &RequiredBy,
    ) -> Result<(Cow<'a, [u8]>, ContentOrigin)> {
        let overrides: &'a OverrideStore = self.overrides;
        if let Some(content) = overrides.lookup(path) {
            return Ok((Cow::Borrowed(content), ContentOrigin::Override));
        }

        let file = path.to_fs_path(&self.source_root);
        match fs::read(&file) {
            Ok(content) => Ok((Cow::Owned(content), ContentOrigin::Source)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(BundleError::NotFound {
                path: path.clone(),
                required_by: required_by.clone(),
            }),
            Err(err) => Err(BundleError::io(file, err)),
        }
    }

    /// Module paths required by `content`, resolved against `path`'s directory
    fn required_paths(&self, path: &ModulePath, content: &[u8]) -> Result<Vec<ModulePath>> {
        extract_requires(content)
            .into_iter()
            .map(|name| {
                path.join_require(&name).ok_or_else(|| BundleError::OutsideRoot {
                    name,
                    required_by: RequiredBy::Module(path.clone()),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests;
