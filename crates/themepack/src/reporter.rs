//! Progress reporting for the bundling core
//!
//! Components receive a `&dyn Reporter` instead of logging through ambient
//! state, so a resolver or emitter can be driven by a test that records what
//! happened. [`LogReporter`] is what the binary uses.

use std::{cell::RefCell, path::PathBuf};

use log::{debug, info};

use crate::types::ModulePath;

/// Where a module's bytes came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentOrigin {
    Override,
    Source,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleEvent {
    OverridesScanned { root: PathBuf },
    /// The overrides directory does not exist, so nothing is shadowed
    OverridesAbsent { root: PathBuf },
    OverrideLoaded { path: ModulePath },
    BundleStarted { entry: ModulePath },
    ModuleEmitted { path: ModulePath, origin: ContentOrigin },
    /// A require pointed at a module that is still being visited
    CycleBroken { path: ModulePath, required_by: ModulePath },
    Minified { entry: ModulePath, before: usize, after: usize },
    BundleWritten { path: PathBuf, bytes: usize },
}

pub trait Reporter {
    fn report(&self, event: BundleEvent);
}

/// Forwards events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, event: BundleEvent) {
        match event {
            BundleEvent::OverridesScanned { root } => {
                info!("Looking for overrides in {}", root.display());
            }
            BundleEvent::OverridesAbsent { root } => {
                debug!("No overrides directory at {}", root.display());
            }
            BundleEvent::OverrideLoaded { path } => debug!("Adding override: {path}"),
            BundleEvent::BundleStarted { entry } => info!("New bundle from {entry}"),
            BundleEvent::ModuleEmitted { path, origin } => match origin {
                ContentOrigin::Override => debug!("Emit {path} (override)"),
                ContentOrigin::Source => debug!("Emit {path}"),
            },
            BundleEvent::CycleBroken { path, required_by } => {
                debug!("Skipping {path} required by {required_by}: already being bundled");
            }
            BundleEvent::Minified {
                entry,
                before,
                after,
            } => info!("Minified {entry}: {before} -> {after} bytes"),
            BundleEvent::BundleWritten { path, bytes } => {
                info!("Wrote {} ({bytes} bytes)", path.display());
            }
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: RefCell<Vec<BundleEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BundleEvent> {
        self.events.borrow().clone()
    }

    /// Modules in emission order, across all bundles
    pub fn emitted(&self) -> Vec<(String, ContentOrigin)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                BundleEvent::ModuleEmitted { path, origin } => Some((path.to_string(), *origin)),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: BundleEvent) {
        self.events.borrow_mut().push(event);
    }
}
