use std::{path::PathBuf, process::ExitCode};

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};
use log::{LevelFilter, error, info};
use themepack::{
    config::Config,
    emitter::{ScriptBundleOptions, bundle_scripts},
    fs_util::WalkdirCopier,
    minify::{Minifier, OxcMinifier},
    orchestrator::{Collaborators, Pipeline},
    reporter::LogReporter,
    styles::SassCommand,
    vendor::GitFetcher,
};

#[derive(Debug, Parser)]
#[command(name = "themepack", version, about)]
struct Cli {
    /// Configuration file to use instead of ./themepack.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to an existing theme checkout; cloned when not set
    #[arg(long, visible_alias = "slate")]
    theme: Option<PathBuf>,

    /// Minify scripts and compress stylesheets
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    minify: Option<bool>,

    /// Disable minification
    #[arg(long, conflicts_with = "minify")]
    no_minify: bool,

    /// Output directory, reset on every run
    #[arg(long)]
    target: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Only bundle the scripts of one source directory
    BundleJs(BundleJsArgs),
}

#[derive(Debug, Args)]
struct BundleJsArgs {
    /// Directory whose top-level .js files are entry points
    #[arg(long)]
    source: PathBuf,

    /// Directory receiving one bundle per entry point
    #[arg(long)]
    dest: PathBuf,

    /// Directory of files shadowing sources at the same relative path
    #[arg(long)]
    overrides: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(theme) = cli.theme {
        config.vendor_source = Some(theme);
    }
    if let Some(minify) = cli.minify {
        config.minify = minify;
    }
    if cli.no_minify {
        config.minify = false;
    }
    if let Some(target) = cli.target {
        config.target = target;
    }

    let reporter = LogReporter;
    let minifier = OxcMinifier::new();

    match cli.command {
        Some(Command::BundleJs(args)) => {
            let options = ScriptBundleOptions {
                source: args.source,
                destination: args.dest,
                overrides: args.overrides,
            };
            let backend: &dyn Minifier = &minifier;
            let minifier = config.minify.then_some(backend);
            let written = bundle_scripts(&options, minifier, &reporter)?;
            info!("Wrote {} bundle(s)", written.len());
        }
        None => {
            let collaborators = Collaborators {
                fetcher: &GitFetcher::default(),
                copier: &WalkdirCopier,
                styles: &SassCommand::new(&config.sass_binary),
                minifier: &minifier,
                reporter: &reporter,
            };
            Pipeline::new(&config, collaborators).run()?;
        }
    }
    Ok(())
}
