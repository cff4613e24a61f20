//! Staging of resolved libraries into the output directory.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::paths::same_file;

/// Copy every member of `closure` into `dest_dir` under its key name.
///
/// Files are copied in sorted order. Symlinked libraries are copied as the
/// file they point to, and an existing file of the same name is overwritten.
/// A library that already lives in `dest_dir` (the output directory is also
/// a search directory) is left as it is.
///
/// Returns the destination paths, in copy order.
///
/// # Errors
///
/// Returns an error if:
/// - `dest_dir` is not an existing directory
/// - a closure member has no recorded location in `graph`
/// - a copy fails
pub fn stage_files(
    graph: &DependencyGraph,
    closure: &BTreeSet<String>,
    dest_dir: &Path,
) -> Result<Vec<PathBuf>> {
    if !dest_dir.is_dir() {
        return Err(Error::OutputDirInvalid(dest_dir.to_path_buf()));
    }

    let mut staged = Vec::with_capacity(closure.len());
    for name in closure {
        let src = graph.location(name).ok_or_else(|| {
            Error::io(
                name,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no recorded location"),
            )
        })?;
        tracing::info!("{name} : {}", src.display());

        let dest = dest_dir.join(name);
        if dest.exists() && same_file(src, &dest)? {
            // Copying a file onto itself would truncate it
            tracing::info!("{name} is already in {}", dest_dir.display());
        } else {
            fs::copy(src, &dest).map_err(|e| Error::io(src, e))?;
        }
        staged.push(dest);
    }

    Ok(staged)
}
