//! Shared-library closure discovery and staging.
//!
//! Runs an `ldd`-style lister over a binary, then over every library it
//! needs, resolving each library in an ordered list of search directories.
//! The resulting closure is copied next to the binary's bundle, optionally
//! with a JSON dump of the graph and a Windows assembly manifest.
//!
//! Any unparseable listing, unresolved library, or library that resolves to
//! two different files aborts the run before anything is written.

mod analyze;
mod bundle;
mod copy;
mod error;
mod graph;
mod parse;
mod paths;
mod platform;
mod report;
mod skip;

pub use analyze::{DependencyLister, DependencyScanner, LddLister, ResolvedDependency, DEFAULT_LISTER};
pub use bundle::{bundle, root_key_for, BundleOptions, BundleReport};
pub use copy::stage_files;
pub use error::{Error, Result};
pub use graph::{build_graph, build_graph_in_order, transitive_closure, DependencyGraph, VisitOrder};
pub use parse::{parse_ldd_line, parse_ldd_output, LddEntry, LddLine, NOT_FOUND};
pub use paths::{absolute_path, find_library, same_file, ScopedSearchPath, SearchPath};
pub use platform::{fix_location, prepare_target};
pub use report::{graph_to_json, read_graph_json, render_manifest, write_graph_json, write_manifest};
pub use skip::{Platform, SkipSet};
