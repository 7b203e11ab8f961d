//! The full asset pipeline
//!
//! Steps run in a fixed order and the first failure aborts the run:
//! reset the target, acquire the theme, stage static directories, merge
//! stylesheets, bundle scripts, compile stylesheets.

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;

use crate::{
    config::Config,
    emitter::{ScriptBundleOptions, bundle_scripts},
    fs_util::{TreeCopier, reset_dir},
    minify::Minifier,
    reporter::Reporter,
    styles::{self, OutputStyle, StyleCompiler},
    vendor::{VendorCheckout, VendorFetcher},
};

/// External services the pipeline delegates to
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub fetcher: &'a dyn VendorFetcher,
    pub copier: &'a dyn TreeCopier,
    pub styles: &'a dyn StyleCompiler,
    pub minifier: &'a dyn Minifier,
    pub reporter: &'a dyn Reporter,
}

impl std::fmt::Debug for Collaborators<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Files produced by a run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineSummary {
    pub static_dirs: Vec<PathBuf>,
    pub scripts: Vec<PathBuf>,
    pub stylesheets: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct Pipeline<'a> {
    config: &'a Config,
    collaborators: Collaborators<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, collaborators: Collaborators<'a>) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    pub fn run(&self) -> Result<PipelineSummary> {
        let config = self.config;
        let mut summary = PipelineSummary::default();

        reset_dir(&config.target)?;

        let checkout = VendorCheckout::acquire(
            &config.vendor(),
            self.collaborators.fetcher,
            self.collaborators.copier,
        )?;

        for dir in &config.static_dirs {
            info!("Copy {dir}");
            let target = config.target.join(dir);
            self.collaborators
                .copier
                .copy_tree(&checkout.source_dir(dir), &target)
                .with_context(|| format!("Failed to move theme sources: {dir}"))?;
            summary.static_dirs.push(target);
        }

        info!("Merge stylesheets in {}", checkout.stylesheets().display());
        styles::merge_partials(&config.stylesheet_partials, checkout.stylesheets())
            .context("Failed to edit theme sources")?;
        styles::insert_imports(checkout.stylesheets(), &config.styles)
            .context("Failed to edit theme sources")?;

        let scripts = ScriptBundleOptions {
            source: checkout.javascripts(),
            destination: config.target.join("javascripts"),
            overrides: Some(config.javascript_overrides.clone()),
        };
        let minifier = config.minify.then_some(self.collaborators.minifier);
        summary.scripts = bundle_scripts(&scripts, minifier, self.collaborators.reporter)
            .context("Failed to bundle JS")?;

        summary.stylesheets = styles::compile_all(
            checkout.stylesheets(),
            &config.target.join("stylesheets"),
            self.collaborators.styles,
            OutputStyle::for_minify(config.minify),
        )
        .context("Failed to compile SASS stylesheets")?;

        info!("Done");
        Ok(summary)
    }
}
