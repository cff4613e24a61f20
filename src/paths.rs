//! Library lookup in an ordered list of search directories.

use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Find a library by file name in `search_dirs`.
///
/// Directories are tried in order and are not searched recursively. The
/// first directory holding a regular file (or a symlink to one) named
/// exactly `lib_name` wins.
///
/// Returns `None` if the library is not found in any search path.
#[must_use = "found library path should be used"]
pub fn find_library<P: AsRef<Path>>(lib_name: &str, search_dirs: &[P]) -> Option<PathBuf> {
    search_dirs
        .iter()
        .map(|dir| dir.as_ref().join(lib_name))
        .find(|p| p.is_file())
}

/// `path` made absolute against the current directory.
///
/// Symlinks are left alone, so the result still names the file the caller
/// gave; only the lexical form changes.
///
/// # Errors
///
/// Returns an error if `path` is relative and the current directory cannot
/// be read.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| Error::io(path, e))
}

/// Whether two paths name the same underlying file.
///
/// Symlinks are followed. On Unix the device and inode numbers are compared;
/// elsewhere the canonicalized paths are.
pub fn same_file(a: &Path, b: &Path) -> Result<bool> {
    if a == b {
        return Ok(true);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;

        let meta_a = fs::metadata(a).map_err(|e| Error::io(a, e))?;
        let meta_b = fs::metadata(b).map_err(|e| Error::io(b, e))?;
        Ok(meta_a.dev() == meta_b.dev() && meta_a.ino() == meta_b.ino())
    }

    #[cfg(not(unix))]
    {
        let canon_a = fs::canonicalize(a).map_err(|e| Error::io(a, e))?;
        let canon_b = fs::canonicalize(b).map_err(|e| Error::io(b, e))?;
        Ok(canon_a == canon_b)
    }
}

/// The caller's ordered search directories.
///
/// Extended only through [`SearchPath::push_scoped`], so whatever a single
/// binary adds is gone again before the next binary is looked at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    #[must_use = "found library path should be used"]
    pub fn find(&self, lib_name: &str) -> Option<PathBuf> {
        find_library(lib_name, &self.dirs)
    }

    /// Append `dir` as the lowest-priority entry until the guard drops.
    pub fn push_scoped(&mut self, dir: impl Into<PathBuf>) -> ScopedSearchPath<'_> {
        self.dirs.push(dir.into());
        ScopedSearchPath { path: self }
    }
}

/// Guard returned by [`SearchPath::push_scoped`]; pops the pushed directory on drop.
#[derive(Debug)]
pub struct ScopedSearchPath<'a> {
    path: &'a mut SearchPath,
}

impl Deref for ScopedSearchPath<'_> {
    type Target = SearchPath;

    fn deref(&self) -> &SearchPath {
        self.path
    }
}

impl Drop for ScopedSearchPath<'_> {
    fn drop(&mut self) {
        self.path.dirs.pop();
    }
}
