//! End-to-end run: validate, discover, stage, report.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::analyze::{DependencyLister, DependencyScanner};
use crate::error::{Error, Result};
use crate::graph::{build_graph, transitive_closure, DependencyGraph};
use crate::paths::SearchPath;
use crate::platform::prepare_target;
use crate::skip::{Platform, SkipSet};
use crate::{copy, report};

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct BundleOptions {
    pub target: PathBuf,
    pub output_dir: PathBuf,
    pub search_dirs: Vec<PathBuf>,
    /// Where to write the dependency graph as JSON.
    pub json: Option<PathBuf>,
    /// Where to write the assembly manifest.
    pub manifest: Option<PathBuf>,
    pub platform: Platform,
    pub skip: SkipSet,
}

impl BundleOptions {
    /// Options for `platform` with its default skip set and no reports.
    pub fn new(target: impl Into<PathBuf>, output_dir: impl Into<PathBuf>, platform: Platform) -> Self {
        Self {
            target: target.into(),
            output_dir: output_dir.into(),
            search_dirs: Vec::new(),
            json: None,
            manifest: None,
            platform,
            skip: SkipSet::for_platform(platform),
        }
    }

    #[must_use]
    pub fn with_search_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct BundleReport {
    pub root_key: String,
    pub graph: DependencyGraph,
    pub closure: BTreeSet<String>,
    pub staged: Vec<PathBuf>,
}

fn validate(options: &BundleOptions) -> Result<String> {
    let target = &options.target;
    if !target.exists() {
        return Err(Error::TargetMissing(target.clone()));
    }
    if !target.is_file() {
        return Err(Error::TargetNotFile(target.clone()));
    }
    if !options.output_dir.is_dir() {
        return Err(Error::OutputDirInvalid(options.output_dir.clone()));
    }

    root_key_for(target).ok_or_else(|| Error::TargetNotFile(target.clone()))
}

/// Find the dependency closure of `options.target` and stage it.
///
/// Nothing is written to the output directory, nor to either report, until
/// the whole graph has been built without error. Libraries that already live
/// in the output directory are left in place.
///
/// # Errors
///
/// Returns an error if:
/// - the target is missing or not a file, or the output directory is not a directory
/// - the graph cannot be built (see [`build_graph`])
/// - staging or writing a report fails
pub fn bundle(options: &BundleOptions, lister: &dyn DependencyLister) -> Result<BundleReport> {
    let root_key = validate(options)?;

    let work_dir = tempfile::tempdir().map_err(|e| Error::io(std::env::temp_dir(), e))?;
    tracing::info!("created temporary directory {}", work_dir.path().display());

    let listed_target = prepare_target(&options.target, options.platform, work_dir.path())?;

    let scanner = DependencyScanner::new(lister, options.skip.clone(), options.platform);
    let mut search = SearchPath::new(options.search_dirs.iter().cloned());
    let graph = build_graph(&scanner, &root_key, &listed_target, &mut search)?;

    // build_graph always records the root
    let closure = transitive_closure(&graph, &root_key).unwrap_or_default();

    let staged = copy::stage_files(&graph, &closure, &options.output_dir)?;

    if let Some(path) = &options.json {
        report::write_graph_json(&graph, path)?;
    }
    if let Some(path) = &options.manifest {
        report::write_manifest(&root_key, &closure, path)?;
    }

    Ok(BundleReport {
        root_key,
        graph,
        closure,
        staged,
    })
}

/// Root key the graph for `target` is stored under.
#[must_use]
pub fn root_key_for(target: &Path) -> Option<String> {
    target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}
