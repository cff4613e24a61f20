//! Platform-specific shims around the lister.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};
use crate::skip::Platform;

/// Return the path the lister should be run against for `target`.
///
/// On Windows an OpenFX plugin (`.ofx`) is a DLL under another extension,
/// and the lister only recognises it as `.dll`. A copy named `<stem>.dll` is
/// placed in `work_dir`; every other target is analysed in place.
pub fn prepare_target(target: &Path, platform: Platform, work_dir: &Path) -> Result<PathBuf> {
    let is_plugin = target
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ofx"));

    if platform != Platform::Windows || !is_plugin {
        return Ok(target.to_path_buf());
    }

    let stem = target
        .file_stem()
        .ok_or_else(|| Error::TargetNotFile(target.to_path_buf()))?;
    let mut renamed = stem.to_os_string();
    renamed.push(".dll");
    let staged = work_dir.join(renamed);

    fs::copy(target, &staged).map_err(|e| Error::io(target, e))?;
    tracing::debug!("analysing {} as {}", target.display(), staged.display());
    Ok(staged)
}

/// Convert an MSYS-style location (`/c/build/lib.dll`) to a mixed Windows
/// path (`C:/build/lib.dll`) using `cygpath -m`.
///
/// Only applies on Windows. If `cygpath` cannot be run the location is
/// returned unchanged.
#[must_use]
pub fn fix_location(location: &Path, platform: Platform) -> PathBuf {
    if platform != Platform::Windows || !location.to_string_lossy().starts_with('/') {
        return location.to_path_buf();
    }

    match Command::new("cygpath").arg("-m").arg(location).output() {
        Ok(output) if output.status.success() => {
            let converted = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if converted.is_empty() {
                location.to_path_buf()
            } else {
                PathBuf::from(converted)
            }
        }
        Ok(output) => {
            tracing::debug!(
                "cygpath failed on {}: {}",
                location.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            location.to_path_buf()
        }
        Err(e) => {
            tracing::debug!("cygpath not available: {e}");
            location.to_path_buf()
        }
    }
}
