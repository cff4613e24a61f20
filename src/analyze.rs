//! Per-binary dependency listing.
//!
//! The external lister (`ldd` by default) is the only non-portable piece.
//! It sits behind [`DependencyLister`] so a different tool, or canned output
//! in tests, can stand in for it without touching the graph logic.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};
use crate::parse::parse_ldd_output;
use crate::paths::{absolute_path, SearchPath};
use crate::platform::fix_location;
use crate::skip::{Platform, SkipSet};

/// Default external lister.
pub const DEFAULT_LISTER: &str = "ldd";

/// Something that can produce an `ldd`-style listing for a binary.
pub trait DependencyLister {
    /// Return the raw listing text for the binary at `binary_path`.
    fn list_raw_dependencies(&self, binary_path: &Path) -> Result<String>;
}

/// Runs an external program with the binary path as its only argument.
#[derive(Debug, Clone)]
pub struct LddLister {
    program: String,
}

impl LddLister {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for LddLister {
    fn default() -> Self {
        Self::new(DEFAULT_LISTER)
    }
}

impl DependencyLister for LddLister {
    /// Blocks until the lister exits. There is no timeout.
    fn list_raw_dependencies(&self, binary_path: &Path) -> Result<String> {
        let fail = |message: String| Error::Lister {
            program: self.program.clone(),
            binary: binary_path.to_path_buf(),
            message,
        };

        let output = Command::new(&self.program)
            .arg(binary_path)
            .output()
            .map_err(|e| fail(format!("could not run: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // Static executables have nothing to list
            if stderr.contains("not a dynamic executable") {
                return Ok(String::new());
            }
            return Err(fail(format!("{}: {}", output.status, stderr.trim())));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// A dependency name together with the file it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResolvedDependency {
    pub name: String,
    pub location: PathBuf,
}

/// Lister plus the filtering rules applied to everything it reports.
pub struct DependencyScanner<'a> {
    lister: &'a dyn DependencyLister,
    skip: SkipSet,
    platform: Platform,
}

impl<'a> DependencyScanner<'a> {
    pub fn new(lister: &'a dyn DependencyLister, skip: SkipSet, platform: Platform) -> Self {
        Self {
            lister,
            skip,
            platform,
        }
    }

    /// List the direct dependencies of one binary and resolve each of them.
    ///
    /// The binary's own directory is searched after `search`, and only for
    /// the duration of this call. Self references and anything matching the
    /// skip set are dropped. Every remaining dependency must be found in the
    /// search directories; a path the lister found on its own is not trusted.
    /// Resolved locations are absolute.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the lister fails, or prints a line that is not understood
    /// - a dependency is `not found` and no search directory has it ([`Error::NotFound`])
    /// - the lister found a dependency outside the search directories ([`Error::OutsideSearchPath`])
    pub fn list_dependencies(
        &self,
        binary_key: &str,
        binary_location: &Path,
        search: &mut SearchPath,
    ) -> Result<BTreeSet<ResolvedDependency>> {
        let raw = self.lister.list_raw_dependencies(binary_location)?;
        let entries = parse_ldd_output(binary_location, &raw)?;

        let own_dir = binary_location.parent().unwrap_or_else(|| Path::new("."));
        let search = search.push_scoped(own_dir);

        let mut resolved = BTreeSet::new();
        for entry in entries {
            if entry.name == binary_key {
                continue;
            }
            if self.skip.matches(&entry.location) {
                tracing::debug!("skipping system library {} ({})", entry.name, entry.location);
                continue;
            }

            match search.find(&entry.name) {
                Some(found) => {
                    let location = absolute_path(&fix_location(&found, self.platform))?;
                    tracing::debug!("{} -> {}", entry.name, location.display());
                    resolved.insert(ResolvedDependency {
                        name: entry.name,
                        location,
                    });
                }
                None if entry.is_not_found() => {
                    return Err(Error::NotFound {
                        binary: binary_location.to_path_buf(),
                        dependency: entry.name,
                    });
                }
                None => {
                    return Err(Error::OutsideSearchPath {
                        dependency: entry.name,
                        reported: entry.location,
                    });
                }
            }
        }

        Ok(resolved)
    }
}
