//! Dependency graph construction and transitive closure.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analyze::DependencyScanner;
use crate::error::{Error, Result};
use crate::paths::{absolute_path, same_file, SearchPath};

/// Direct dependencies and resolved location of every binary reachable from a root.
///
/// Binaries are keyed by base file name. Every key of `deps` has an entry in
/// `locations`, and once a key has a location it never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    #[serde(rename = "binary_deps")]
    pub deps: BTreeMap<String, BTreeSet<String>>,
    #[serde(rename = "binary_locations")]
    pub locations: BTreeMap<String, PathBuf>,
}

impl DependencyGraph {
    #[must_use]
    pub fn location(&self, key: &str) -> Option<&Path> {
        self.locations.get(key).map(PathBuf::as_path)
    }

    /// Record `location` for `name`, or check it against the one already
    /// recorded. Returns the location that stays on record.
    fn record_location(&mut self, name: &str, location: PathBuf) -> Result<PathBuf> {
        match self.locations.entry(name.to_string()) {
            Entry::Vacant(slot) => Ok(slot.insert(location).clone()),
            Entry::Occupied(slot) => {
                if same_file(slot.get(), &location)? {
                    Ok(slot.get().clone())
                } else {
                    Err(Error::Conflict {
                        dependency: name.to_string(),
                        first: slot.get().clone(),
                        second: location,
                    })
                }
            }
        }
    }
}

/// Order in which discovered binaries are handed to the lister.
///
/// When no conflict is found the graph does not depend on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VisitOrder {
    /// Most recently discovered binary first.
    #[default]
    DepthFirst,
    /// Earliest discovered binary first.
    BreadthFirst,
}

/// Discover every binary reachable from `root_key`, resolving each one once.
///
/// `root_location` is the file handed to the lister for the root. It is
/// recorded as an absolute path, like every resolved location.
///
/// # Errors
///
/// Fails on the first listing, resolution, or conflict error; no partial
/// graph is returned. See [`DependencyScanner::list_dependencies`] for the
/// per-binary failures. [`Error::Conflict`] is returned when one name
/// resolves to two different files.
pub fn build_graph(
    scanner: &DependencyScanner<'_>,
    root_key: &str,
    root_location: &Path,
    search: &mut SearchPath,
) -> Result<DependencyGraph> {
    build_graph_in_order(scanner, root_key, root_location, search, VisitOrder::default())
}

/// [`build_graph`] with an explicit [`VisitOrder`].
///
/// # Errors
///
/// Same as [`build_graph`].
pub fn build_graph_in_order(
    scanner: &DependencyScanner<'_>,
    root_key: &str,
    root_location: &Path,
    search: &mut SearchPath,
    order: VisitOrder,
) -> Result<DependencyGraph> {
    let root_location = absolute_path(root_location)?;
    let mut graph = DependencyGraph::default();
    graph
        .locations
        .insert(root_key.to_string(), root_location.clone());

    let mut visited: HashSet<String> = HashSet::new();
    let mut pending = VecDeque::from([(root_key.to_string(), root_location)]);

    loop {
        let next = match order {
            VisitOrder::DepthFirst => pending.pop_back(),
            VisitOrder::BreadthFirst => pending.pop_front(),
        };
        let Some((key, location)) = next else { break };
        if !visited.insert(key.clone()) {
            continue;
        }

        tracing::info!("finding dependencies for {key}");
        let resolved = scanner.list_dependencies(&key, &location, search)?;

        let mut direct = BTreeSet::new();
        for dep in resolved {
            let recorded = graph.record_location(&dep.name, dep.location)?;
            if !visited.contains(&dep.name) {
                pending.push_back((dep.name.clone(), recorded));
            }
            direct.insert(dep.name);
        }
        graph.deps.insert(key, direct);
    }

    Ok(graph)
}

/// Every binary reachable from `root_key`, not counting the root itself.
///
/// Returns `None` if `root_key` was never processed into `graph`.
#[must_use]
pub fn transitive_closure(graph: &DependencyGraph, root_key: &str) -> Option<BTreeSet<String>> {
    let mut closure = BTreeSet::new();
    let mut to_visit: Vec<&str> = graph.deps.get(root_key)?.iter().map(String::as_str).collect();

    while let Some(key) = to_visit.pop() {
        if !closure.insert(key.to_string()) {
            continue;
        }
        if let Some(next) = graph.deps.get(key) {
            to_visit.extend(next.iter().map(String::as_str));
        }
    }

    closure.remove(root_key);
    Some(closure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::tests::FakeLister;
    use crate::skip::{Platform, SkipSet};
    use std::fs;
    use tempfile::TempDir;

    fn graph_from(edges: &[(&str, &[&str])]) -> DependencyGraph {
        let mut graph = DependencyGraph::default();
        for (from, to) in edges {
            graph.deps.insert(
                (*from).to_string(),
                to.iter().map(|s| (*s).to_string()).collect(),
            );
            graph
                .locations
                .insert((*from).to_string(), PathBuf::from(format!("/x/{from}")));
        }
        graph
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_closure_of_leaf_is_empty() {
        let graph = graph_from(&[("app", &[])]);
        assert_eq!(transitive_closure(&graph, "app"), Some(BTreeSet::new()));
    }

    #[test]
    fn test_closure_follows_edges_transitively() {
        let graph = graph_from(&[
            ("app", &["libA.so", "libB.so"]),
            ("libA.so", &["libC.so"]),
            ("libB.so", &[]),
            ("libC.so", &[]),
        ]);
        assert_eq!(
            transitive_closure(&graph, "app"),
            Some(set(&["libA.so", "libB.so", "libC.so"]))
        );
        assert_eq!(transitive_closure(&graph, "libA.so"), Some(set(&["libC.so"])));
    }

    #[test]
    fn test_closure_terminates_on_cycles_and_excludes_root() {
        let graph = graph_from(&[
            ("app", &["libA.so"]),
            ("libA.so", &["libB.so"]),
            ("libB.so", &["libA.so", "app"]),
        ]);
        assert_eq!(
            transitive_closure(&graph, "app"),
            Some(set(&["libA.so", "libB.so"]))
        );
    }

    #[test]
    fn test_closure_of_unknown_root_is_none() {
        let graph = graph_from(&[("app", &[])]);
        assert_eq!(transitive_closure(&graph, "other"), None);
    }

    struct Tree {
        _temp: TempDir,
        app: PathBuf,
        libs: PathBuf,
    }

    fn tree(files: &[&str]) -> Tree {
        let temp = TempDir::new().unwrap();
        let app = temp.path().join("bin/app");
        let libs = temp.path().join("libs");
        fs::create_dir_all(app.parent().unwrap()).unwrap();
        fs::create_dir_all(&libs).unwrap();
        fs::write(&app, b"app").unwrap();
        for name in files {
            fs::write(libs.join(name), name.as_bytes()).unwrap();
        }
        Tree {
            _temp: temp,
            app,
            libs,
        }
    }

    #[test]
    fn test_builds_graph_for_scenario() {
        let t = tree(&["libA.so", "libB.so", "libC.so"]);
        let lister = FakeLister::default()
            .with(
                "app",
                "\tlibA.so => /x/libA.so (0x1)\n\tlibB.so => /x/libB.so (0x2)\n",
            )
            .with("libA.so", "\tlibC.so => /x/libC.so (0x3)\n")
            .with("libB.so", "\tstatically linked\n");
        let scanner = DependencyScanner::new(&lister, SkipSet::linux(), Platform::Linux);
        let mut search = SearchPath::new([&t.libs]);

        let graph = build_graph(&scanner, "app", &t.app, &mut search).unwrap();

        assert_eq!(graph.deps["app"], set(&["libA.so", "libB.so"]));
        assert_eq!(graph.deps["libA.so"], set(&["libC.so"]));
        assert!(graph.deps["libB.so"].is_empty());
        assert!(graph.deps["libC.so"].is_empty());
        assert_eq!(graph.location("libC.so"), Some(t.libs.join("libC.so").as_path()));
        assert_eq!(graph.location("app"), Some(t.app.as_path()));
        for key in graph.deps.keys() {
            assert!(graph.locations.contains_key(key), "{key} has no location");
        }
        assert_eq!(
            transitive_closure(&graph, "app"),
            Some(set(&["libA.so", "libB.so", "libC.so"]))
        );
    }

    #[test]
    fn test_mutual_dependencies_terminate() {
        let t = tree(&["libA.so", "libB.so"]);
        let lister = FakeLister::default()
            .with("app", "libA.so => /x/libA.so\n")
            .with("libA.so", "libB.so => /x/libB.so\n")
            .with("libB.so", "libA.so => /x/libA.so\n");
        let scanner = DependencyScanner::new(&lister, SkipSet::empty(), Platform::Linux);
        let mut search = SearchPath::new([&t.libs]);

        let graph = build_graph(&scanner, "app", &t.app, &mut search).unwrap();
        assert_eq!(graph.deps.len(), 3);
        assert_eq!(graph.deps["libB.so"], set(&["libA.so"]));
    }

    #[test]
    fn test_same_name_in_two_places_is_a_conflict() {
        // The root is d2/libY.so, but libZ.so pulls libY.so back in from d1.
        let temp = TempDir::new().unwrap();
        let d1 = temp.path().join("d1");
        let d2 = temp.path().join("d2");
        fs::create_dir_all(&d1).unwrap();
        fs::create_dir_all(&d2).unwrap();
        fs::write(d1.join("libY.so"), b"first").unwrap();
        fs::write(d2.join("libY.so"), b"second").unwrap();
        fs::write(d1.join("libZ.so"), b"z").unwrap();

        let lister = FakeLister::default()
            .with("libY.so", "libZ.so => /x/libZ.so\n")
            .with("libZ.so", "libY.so => /x/libY.so\n");
        let scanner = DependencyScanner::new(&lister, SkipSet::empty(), Platform::Linux);
        let mut search = SearchPath::new([&d1, &d2]);
        let before = search.clone();

        let err = build_graph(&scanner, "libY.so", &d2.join("libY.so"), &mut search).unwrap_err();

        match err {
            Error::Conflict {
                dependency,
                first,
                second,
            } => {
                assert_eq!(dependency, "libY.so");
                assert_eq!(first, d2.join("libY.so"));
                assert_eq!(second, d1.join("libY.so"));
            }
            other => panic!("expected Conflict, got {other:?}"),
        }
        assert_eq!(search, before);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_duplicate_is_not_a_conflict() {
        let t = tree(&["libY.so", "libZ.so"]);
        let root = t.app.parent().unwrap().join("libY.so");
        std::os::unix::fs::symlink(t.libs.join("libY.so"), &root).unwrap();

        let lister = FakeLister::default()
            .with("libY.so", "libZ.so => /x/libZ.so\n")
            .with("libZ.so", "libY.so => /x/libY.so\n");
        let scanner = DependencyScanner::new(&lister, SkipSet::empty(), Platform::Linux);
        let mut search = SearchPath::new([&t.libs]);

        let graph = build_graph(&scanner, "libY.so", &root, &mut search).unwrap();
        assert_eq!(graph.deps["libZ.so"], set(&["libY.so"]));
        assert_eq!(graph.location("libY.so"), Some(root.as_path()));
        assert_eq!(transitive_closure(&graph, "libY.so"), Some(set(&["libZ.so"])));
    }

    #[test]
    fn test_skipped_system_library_leaves_no_trace() {
        let t = tree(&["libA.so"]);
        let lister = FakeLister::default()
            .with(
                "app",
                "\tlibA.so => /x/libA.so (0x1)\n\
                 \tlibc.so.6 => /lib/x86_64-linux-gnu/libc.so.6 (0x2)\n",
            )
            .with("libA.so", "\tlibc.so.6 => /lib/x86_64-linux-gnu/libc.so.6 (0x3)\n");
        let scanner = DependencyScanner::new(&lister, SkipSet::linux(), Platform::Linux);
        let mut search = SearchPath::new([&t.libs]);

        let graph = build_graph(&scanner, "app", &t.app, &mut search).unwrap();

        assert_eq!(graph.deps["app"], set(&["libA.so"]));
        assert!(graph.deps["libA.so"].is_empty());
        assert!(!graph.deps.contains_key("libc.so.6"));
        assert!(!graph.locations.contains_key("libc.so.6"));
    }

    #[test]
    fn test_relative_inputs_give_absolute_locations() {
        let temp = TempDir::new_in(".").unwrap();
        assert!(temp.path().is_relative());
        let app = temp.path().join("bin/app");
        let lib = temp.path().join("lib");
        fs::create_dir_all(app.parent().unwrap()).unwrap();
        fs::create_dir_all(&lib).unwrap();
        fs::write(&app, b"app").unwrap();
        fs::write(lib.join("libA.so"), b"a").unwrap();
        fs::write(app.parent().unwrap().join("libB.so"), b"b").unwrap();

        // libB.so sits next to the binary and is only found through its directory
        let lister =
            FakeLister::default().with("app", "libA.so => /x/libA.so\nlibB.so => not found\n");
        let scanner = DependencyScanner::new(&lister, SkipSet::empty(), Platform::Linux);
        let mut search = SearchPath::new([&lib]);

        let graph = build_graph(&scanner, "app", &app, &mut search).unwrap();

        assert_eq!(graph.locations.len(), 3);
        for (key, location) in &graph.locations {
            assert!(location.is_absolute(), "{key} at {}", location.display());
        }
        assert!(same_file(graph.location("libA.so").unwrap(), &lib.join("libA.so")).unwrap());
    }

    #[test]
    fn test_visit_order_does_not_change_the_graph() {
        let t = tree(&["libA.so", "libB.so", "libC.so", "libD.so"]);
        // app -> A, B; A -> C; B -> C, D; C -> A (cycle); D -> B (cycle)
        let lister = FakeLister::default()
            .with("app", "libA.so => /x/libA.so\nlibB.so => /x/libB.so\n")
            .with("libA.so", "libC.so => /x/libC.so\n")
            .with("libB.so", "libC.so => /x/libC.so\nlibD.so => /x/libD.so\n")
            .with("libC.so", "libA.so => /x/libA.so\n")
            .with("libD.so", "libB.so => /x/libB.so\n");
        let scanner = DependencyScanner::new(&lister, SkipSet::empty(), Platform::Linux);

        let graphs: Vec<_> = [VisitOrder::DepthFirst, VisitOrder::BreadthFirst]
            .into_iter()
            .map(|order| {
                let mut search = SearchPath::new([&t.libs]);
                build_graph_in_order(&scanner, "app", &t.app, &mut search, order).unwrap()
            })
            .collect();

        assert_eq!(graphs[0].deps, graphs[1].deps);
        assert_eq!(graphs[0].locations, graphs[1].locations);
        assert_eq!(
            transitive_closure(&graphs[0], "app"),
            Some(set(&["libA.so", "libB.so", "libC.so", "libD.so"]))
        );
        assert_eq!(
            transitive_closure(&graphs[0], "app"),
            transitive_closure(&graphs[1], "app")
        );
    }

    #[test]
    fn test_serialized_graph_gives_same_closure() {
        let graph = graph_from(&[
            ("app", &["libA.so", "libB.so"]),
            ("libA.so", &["libC.so"]),
            ("libB.so", &[]),
            ("libC.so", &[]),
        ]);
        let json = serde_json::to_string(&graph).unwrap();
        let restored: DependencyGraph = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, graph);
        assert_eq!(
            transitive_closure(&restored, "app"),
            transitive_closure(&graph, "app")
        );
    }
}
