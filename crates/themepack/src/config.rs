//! Configuration for a themepack run
//!
//! Layers, lowest precedence first: built-in defaults, the user config file,
//! the project `themepack.toml` (or an explicit `--config` file), then
//! command-line flags applied by the binary. TOML tables are merged key by
//! key, so a project file can override a single `[styles]` key.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;
use toml::{Table, Value};

use crate::{dirs, vendor::VendorSource};

pub const CONFIG_FILE_NAME: &str = "themepack.toml";

const DEFAULT_VENDOR_REPO: &str = "https://github.com/lord/slate.git";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    /// Minify script bundles and compress compiled stylesheets
    pub minify: bool,
    /// Existing theme checkout; cloned from `vendor_repo` when unset
    pub vendor_source: Option<PathBuf>,
    pub vendor_repo: String,
    pub vendor_branch: Option<String>,
    /// Output root, reset at the start of every run
    pub target: PathBuf,
    /// Scripts shadowing theme scripts at the same relative path
    pub javascript_overrides: PathBuf,
    /// Custom stylesheet partials merged into the theme's stylesheets
    pub stylesheet_partials: PathBuf,
    /// Theme `source/` directories copied verbatim into the target
    pub static_dirs: Vec<String>,
    pub sass_binary: PathBuf,
    pub styles: StylesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            minify: true,
            vendor_source: None,
            vendor_repo: DEFAULT_VENDOR_REPO.to_owned(),
            vendor_branch: None,
            target: PathBuf::from("static/slate"),
            javascript_overrides: PathBuf::from("assets/javascripts"),
            stylesheet_partials: PathBuf::from("assets/stylesheets"),
            static_dirs: vec!["images".to_owned(), "fonts".to_owned()],
            sass_binary: PathBuf::from("sass"),
            styles: StylesConfig::default(),
        }
    }
}

/// How site partials are hooked into the theme's entry stylesheet
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct StylesConfig {
    /// Entry stylesheet inside the theme's stylesheet directory
    pub entry: String,
    /// Text after which the imports are inserted
    pub anchor: String,
    /// Partial names to `@import`
    pub imports: Vec<String>,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            entry: "screen.css.scss".to_owned(),
            anchor: "@import 'icon-font';".to_owned(),
            imports: vec!["docuapi".to_owned()],
        }
    }
}

impl Config {
    /// Load the user config and then the project config.
    ///
    /// `explicit` replaces the project `themepack.toml` lookup and must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut layers = Vec::new();

        if let Some(user) = dirs::user_config_file().filter(|path| path.is_file()) {
            layers.push(user);
        }
        match explicit {
            Some(path) => layers.push(path.to_path_buf()),
            None => {
                let project = PathBuf::from(CONFIG_FILE_NAME);
                if project.is_file() {
                    layers.push(project);
                }
            }
        }

        Self::load_layers(&layers)
    }

    /// Merge the given files in order on top of the defaults
    pub fn load_layers(layers: &[PathBuf]) -> Result<Self> {
        let mut merged = Table::new();
        for layer in layers {
            debug!("Loading configuration from {}", layer.display());
            let text = fs::read_to_string(layer)
                .with_context(|| format!("Failed to read config file {}", layer.display()))?;
            let table: Table = toml::from_str(&text)
                .with_context(|| format!("Failed to parse config file {}", layer.display()))?;
            merge_tables(&mut merged, table);
        }

        Value::Table(merged)
            .try_into::<Self>()
            .context("Invalid themepack configuration")
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid themepack configuration")
    }

    pub fn vendor(&self) -> VendorSource {
        match &self.vendor_source {
            Some(path) => VendorSource::Local(path.clone()),
            None => VendorSource::Remote {
                repo: self.vendor_repo.clone(),
                branch: self.vendor_branch.clone(),
            },
        }
    }
}

fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(nested)) => merge_tables(existing, nested),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
