//! `bundle-deps`: copy every shared library a binary needs into one directory.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use bundle_deps::{bundle, BundleOptions, LddLister, Platform, DEFAULT_LISTER};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Finds all the library dependencies of an executable or shared library
/// and copies them to a specified directory.
#[derive(Parser, Debug)]
#[command(name = "bundle-deps", version, about, long_about = None)]
struct Cli {
    /// Executable, shared library, or plugin to bundle
    target_binary: PathBuf,

    /// Existing directory the dependencies are copied into
    output_directory: PathBuf,

    /// Directories to look for dependencies in, highest priority first
    search_directories: Vec<PathBuf>,

    /// Write the dependency graph as JSON to this path
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Write a side-by-side assembly manifest to this path
    #[arg(long, value_name = "PATH")]
    manifest: Option<PathBuf>,

    /// Program that prints `ldd`-style output for a binary
    #[arg(long, value_name = "PROGRAM", env = "BUNDLE_DEPS_LISTER", default_value = DEFAULT_LISTER)]
    lister: String,

    /// Platform rules to apply (system libraries, plugin handling); defaults to the host
    #[arg(long, value_enum)]
    platform: Option<Platform>,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only print warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let platform = cli.platform.unwrap_or_else(Platform::host);
    let mut options = BundleOptions::new(&cli.target_binary, &cli.output_directory, platform)
        .with_search_dirs(cli.search_directories);
    options.json = cli.json;
    options.manifest = cli.manifest;

    let lister = LddLister::new(cli.lister);
    let report = bundle(&options, &lister)
        .with_context(|| format!("failed to bundle {}", cli.target_binary.display()))?;

    tracing::info!(
        "staged {} dependencies of {} into {}",
        report.staged.len(),
        report.root_key,
        cli.output_directory.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
        // --help and --version
        Err(e) => e.exit(),
    };

    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
