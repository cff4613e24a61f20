//! JSON graph dump and Windows side-by-side assembly manifest.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::graph::DependencyGraph;

/// Serialize `graph` as `{"binary_deps": .., "binary_locations": ..}` with
/// sorted keys and two-space indentation.
pub fn graph_to_json(graph: &DependencyGraph) -> Result<String> {
    Ok(serde_json::to_string_pretty(graph)?)
}

pub fn write_graph_json(graph: &DependencyGraph, path: &Path) -> Result<()> {
    let json = graph_to_json(graph)?;
    fs::write(path, json).map_err(|e| Error::io(path, e))
}

/// Read back a graph written by [`write_graph_json`].
pub fn read_graph_json(path: &Path) -> Result<DependencyGraph> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ok(serde_json::from_str(&text)?)
}

/// Build a manifest naming `binary_name` and one `<file>` per closure member.
///
/// Can be embedded with
/// `mt -nologo -manifest IO.ofx.manifest -outputresource:"IO.ofx;2"`.
#[must_use]
pub fn render_manifest(binary_name: &str, closure: &BTreeSet<String>) -> String {
    let mut manifest = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <assembly xmlns=\"urn:schemas-microsoft-com:asm.v1\" manifestVersion=\"1.0\">\n",
    );
    manifest.push_str(&format!(
        "  <assemblyIdentity name=\"{}\" version=\"1.0.0.0\" type=\"win32\" processorArchitecture=\"amd64\"/>\n",
        escape_attr(binary_name)
    ));
    for name in closure {
        manifest.push_str(&format!("  <file name=\"{}\"></file>\n", escape_attr(name)));
    }
    manifest.push_str("</assembly>");
    manifest
}

pub fn write_manifest(binary_name: &str, closure: &BTreeSet<String>, path: &Path) -> Result<()> {
    fs::write(path, render_manifest(binary_name, closure)).map_err(|e| Error::io(path, e))
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
