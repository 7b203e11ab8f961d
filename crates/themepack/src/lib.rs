//! Bundles a vendored documentation theme's scripts and stylesheets together
//! with site-local overrides into a static asset tree.

pub mod config;
pub mod directives;
pub mod dirs;
pub mod emitter;
pub mod error;
pub mod fs_util;
pub mod minify;
pub mod orchestrator;
pub mod overrides;
pub mod reporter;
pub mod resolver;
pub mod styles;
pub mod types;
pub mod vendor;
