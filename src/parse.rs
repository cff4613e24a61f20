//! Parsing of `ldd`-style dependency listings.

use std::path::Path;

use crate::error::{Error, Result};

/// Raw location the lister prints for a library it could not locate.
pub const NOT_FOUND: &str = "not found";

/// Fragments marking lines that carry no dependency: the vDSO, the dynamic
/// loader itself, and static binaries.
const BENIGN_MARKERS: &[&str] = &["linux-vdso.so.1", "ld-linux-x86-64.so", "statically linked"];

/// One `name => location` line of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LddEntry {
    pub name: String,
    /// Location exactly as the lister reported it, `not found` included.
    pub location: String,
}

impl LddEntry {
    /// Whether the lister gave up on this dependency.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.location == NOT_FOUND
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LddLine {
    Entry(LddEntry),
    Skip,
}

/// Classify a single listing line.
///
/// Returns `None` for a line in neither known shape; the caller turns that
/// into a fatal error since an unread line may be a dependency we would miss.
///
/// ```text
///     libfoo.so.1 => /opt/foo/lib/libfoo.so.1 (0x00007f...)
///     libbar.so.2 => not found
///     linux-vdso.so.1 (0x00007ffd...)
/// ```
#[must_use]
pub fn parse_ldd_line(line: &str) -> Option<LddLine> {
    let line = line.trim();
    if line.is_empty() {
        return Some(LddLine::Skip);
    }

    if let Some(entry) = parse_entry(line) {
        return Some(LddLine::Entry(entry));
    }

    if BENIGN_MARKERS.iter().any(|m| line.contains(m)) {
        return Some(LddLine::Skip);
    }

    None
}

fn parse_entry(line: &str) -> Option<LddEntry> {
    let (name, rest) = line.split_once(" => ")?;
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }

    // Trailing " (0x...)" load address, when present.
    let location = match rest.find(" (") {
        Some(idx) => &rest[..idx],
        None => rest,
    };
    if location.is_empty() || location.contains('(') {
        return None;
    }

    Some(LddEntry {
        name: name.to_string(),
        location: location.to_string(),
    })
}

/// Parse a whole listing produced for `binary`.
///
/// Either every line is understood or the listing is rejected.
pub fn parse_ldd_output(binary: &Path, output: &str) -> Result<Vec<LddEntry>> {
    let mut entries = Vec::new();

    for line in output.lines() {
        match parse_ldd_line(line) {
            Some(LddLine::Entry(entry)) => entries.push(entry),
            Some(LddLine::Skip) => {}
            None => {
                return Err(Error::UnexpectedLine {
                    binary: binary.to_path_buf(),
                    line: line.trim().to_string(),
                })
            }
        }
    }

    Ok(entries)
}
