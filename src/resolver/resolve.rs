//! Transitive shared-library resolution.
//!
//! The dependency graph is never materialized. Starting from the imports of
//! the entry binaries, names are pulled from a work queue, located on the
//! search path, and the located library's own imports are queued in turn.
//! A name enters the queue at most once, which is what makes import cycles
//! (legal between native libraries) terminate.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};

use super::errors::ResolveError;
use crate::core::{NameMatching, SearchPath};
use crate::inspect::DependencyInspector;

/// What to do with imports that no search directory provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Report them in [`Resolution::unresolved`] and log a warning
    #[default]
    Warn,
    /// Fail the resolution, listing every unresolved name
    Error,
}

impl fmt::Display for UnresolvedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedPolicy::Warn => write!(f, "warn"),
            UnresolvedPolicy::Error => write!(f, "error"),
        }
    }
}

impl FromStr for UnresolvedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "warn" => Ok(UnresolvedPolicy::Warn),
            "error" => Ok(UnresolvedPolicy::Error),
            _ => Err(format!(
                "invalid unresolved policy '{}'; expected 'warn' or 'error'",
                s
            )),
        }
    }
}

/// Options for a resolution run.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// How dependency names are compared with file names
    pub matching: NameMatching,

    /// Handling of names missing from every search directory
    pub unresolved: UnresolvedPolicy,

    /// Names provided by the target system; never searched for
    pub system_libraries: Vec<Pattern>,
}

impl ResolveOptions {
    /// Create options with host name matching and the warn policy.
    pub fn new() -> Self {
        ResolveOptions::default()
    }

    /// Set how names are compared.
    pub fn with_matching(mut self, matching: NameMatching) -> Self {
        self.matching = matching;
        self
    }

    /// Set the unresolved-dependency policy.
    pub fn with_unresolved(mut self, policy: UnresolvedPolicy) -> Self {
        self.unresolved = policy;
        self
    }

    /// Set the system library globs, e.g. `KERNEL32.dll` or `libc.so.*`.
    pub fn with_system_libraries<S: AsRef<str>>(
        mut self,
        patterns: &[S],
    ) -> Result<Self, ResolveError> {
        self.system_libraries = patterns
            .iter()
            .map(|p| {
                Pattern::new(p.as_ref()).map_err(|e| ResolveError::InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    message: e.msg.to_string(),
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(self)
    }

    fn is_system_library(&self, name: &str) -> bool {
        let opts = MatchOptions {
            case_sensitive: self.matching == NameMatching::Exact,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        self.system_libraries
            .iter()
            .any(|p| p.matches_with(name, opts))
    }
}

/// Outcome of a resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Every reachable library, by declared name, with its location
    pub resolved: BTreeMap<String, PathBuf>,

    /// Names not found in any search directory
    pub unresolved: BTreeSet<String>,

    /// Names matching a system library pattern
    pub skipped: BTreeSet<String>,
}

impl Resolution {
    /// Whether every import was either resolved or expected from the system.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Resolve the transitive shared-library closure of `entry_binaries`.
///
/// Each directory of `search_path` is tried in order and the first file
/// matching a name wins. Entry binaries are inspected but only appear in the
/// result if some binary imports them by name. Every distinct binary is
/// inspected at most once.
pub fn resolve<I>(
    entry_binaries: &[PathBuf],
    search_path: &SearchPath,
    opts: &ResolveOptions,
    inspector: &I,
) -> Result<Resolution, ResolveError>
where
    I: DependencyInspector + ?Sized,
{
    let mut resolution = Resolution::default();
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut inspected: HashSet<PathBuf> = HashSet::new();

    for entry in entry_binaries {
        if let Some(imports) = inspect_once(entry, &mut inspected, inspector)? {
            enqueue(imports, opts.matching, &mut visited, &mut queue);
        }
    }

    while let Some(name) = queue.pop_front() {
        if opts.is_system_library(&name) {
            tracing::debug!("{} is a system library, skipping", name);
            resolution.skipped.insert(name);
            continue;
        }

        match search_path.find(&name, opts.matching) {
            Some(path) => {
                tracing::debug!("resolved {} -> {}", name, path.display());
                if let Some(imports) = inspect_once(&path, &mut inspected, inspector)? {
                    enqueue(imports, opts.matching, &mut visited, &mut queue);
                }
                resolution.resolved.insert(name, path);
            }
            None => {
                tracing::warn!("could not resolve dependency: {}", name);
                resolution.unresolved.insert(name);
            }
        }
    }

    if opts.unresolved == UnresolvedPolicy::Error && !resolution.unresolved.is_empty() {
        return Err(ResolveError::Unresolved {
            names: resolution.unresolved.into_iter().collect(),
            search_path: search_path.dirs().to_vec(),
        });
    }

    Ok(resolution)
}

/// Inspect `path` unless it was already inspected.
fn inspect_once<I>(
    path: &Path,
    inspected: &mut HashSet<PathBuf>,
    inspector: &I,
) -> Result<Option<BTreeSet<String>>, ResolveError>
where
    I: DependencyInspector + ?Sized,
{
    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    if !inspected.insert(key) {
        return Ok(None);
    }
    Ok(Some(inspector.declared_dependencies(path)?))
}

fn enqueue(
    names: BTreeSet<String>,
    matching: NameMatching,
    visited: &mut HashSet<String>,
    queue: &mut VecDeque<String>,
) {
    for name in names {
        if visited.insert(matching.key(&name)) {
            queue.push_back(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspect::InspectError;
    use crate::test_support::{FakeInspector, LibraryTree};

    fn names(resolution: &Resolution) -> Vec<&str> {
        resolution.resolved.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_transitive_closure_across_search_dirs() {
        let tree = LibraryTree::new();
        let app = tree.file("build/app.exe");
        let first = tree.dir("first");
        let second = tree.dir("second");
        let foo = tree.file("second/libfoo.so");
        let bar = tree.file("first/libbar.so");

        let inspector = FakeInspector::new()
            .with_binary(&app, ["libfoo.so"])
            .with_binary(&foo, ["libbar.so"])
            .with_binary(&bar, Vec::<String>::new());

        let search = SearchPath::new([first, second]);
        let resolution = resolve(&[app], &search, &ResolveOptions::new(), &inspector).unwrap();

        assert_eq!(resolution.resolved.len(), 2);
        assert_eq!(resolution.resolved["libfoo.so"], foo);
        assert_eq!(resolution.resolved["libbar.so"], bar);
        assert!(resolution.is_complete());
    }

    #[test]
    fn test_search_order_prefers_earlier_dir() {
        let tree = LibraryTree::new();
        let app = tree.file("app.exe");
        let early = tree.file("early/libz.so");
        tree.file("late/libz.so");

        let inspector = FakeInspector::new()
            .with_binary(&app, ["libz.so"])
            .with_binary(&early, Vec::<String>::new());

        let search = SearchPath::new([tree.path("early"), tree.path("late")]);
        let resolution = resolve(&[app], &search, &ResolveOptions::new(), &inspector).unwrap();

        assert_eq!(resolution.resolved["libz.so"], early);
    }

    #[test]
    fn test_cycle_terminates_and_visits_once() {
        let tree = LibraryTree::new();
        let app = tree.file("app.exe");
        let a = tree.file("lib/liba.so");
        let b = tree.file("lib/libb.so");

        let inspector = FakeInspector::new()
            .with_binary(&app, ["liba.so"])
            .with_binary(&a, ["libb.so"])
            .with_binary(&b, ["liba.so", "libb.so"]);

        let search = SearchPath::new([tree.path("lib")]);
        let resolution = resolve(&[app.clone()], &search, &ResolveOptions::new(), &inspector).unwrap();

        assert_eq!(names(&resolution), vec!["liba.so", "libb.so"]);
        assert_eq!(inspector.call_count(&app), 1);
        assert_eq!(inspector.call_count(&a), 1);
        assert_eq!(inspector.call_count(&b), 1);
    }

    #[test]
    fn test_unresolved_is_reported_not_resolved() {
        let tree = LibraryTree::new();
        let app = tree.file("app.exe");
        let foo = tree.file("lib/libfoo.so");

        let inspector = FakeInspector::new()
            .with_binary(&app, ["libfoo.so", "libmissing.so"])
            .with_binary(&foo, ["libalsomissing.so"]);

        let search = SearchPath::new([tree.path("lib")]);
        let resolution = resolve(&[app], &search, &ResolveOptions::new(), &inspector).unwrap();

        assert_eq!(names(&resolution), vec!["libfoo.so"]);
        assert_eq!(
            resolution.unresolved.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["libalsomissing.so", "libmissing.so"]
        );
        assert!(!resolution.is_complete());
    }

    #[test]
    fn test_names_escaping_search_dirs_are_unresolved() {
        let tree = LibraryTree::new();
        let app = tree.file("app.exe");
        tree.file("outside/libevil.so");
        tree.dir("lib");

        let inspector = FakeInspector::new().with_binary(&app, ["../outside/libevil.so"]);
        let search = SearchPath::new([tree.path("lib")]);

        for matching in [NameMatching::Exact, NameMatching::IgnoreAsciiCase] {
            let opts = ResolveOptions::new().with_matching(matching);
            let resolution = resolve(&[app.clone()], &search, &opts, &inspector).unwrap();

            assert!(resolution.resolved.is_empty());
            assert!(resolution.unresolved.contains("../outside/libevil.so"));
        }
    }

    #[test]
    fn test_unresolved_error_policy_lists_all_names() {
        let tree = LibraryTree::new();
        let app = tree.file("app.exe");

        let inspector = FakeInspector::new().with_binary(&app, ["liba.so", "libb.so"]);
        let opts = ResolveOptions::new().with_unresolved(UnresolvedPolicy::Error);

        let err = resolve(&[app], &SearchPath::default(), &opts, &inspector).unwrap_err();
        match err {
            ResolveError::Unresolved { names, .. } => {
                assert_eq!(names, vec!["liba.so".to_string(), "libb.so".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_system_libraries_are_skipped() {
        let tree = LibraryTree::new();
        let app = tree.file("app.exe");

        let inspector = FakeInspector::new().with_binary(&app, ["KERNEL32.dll", "libc.so.6"]);
        let opts = ResolveOptions::new()
            .with_matching(NameMatching::IgnoreAsciiCase)
            .with_unresolved(UnresolvedPolicy::Error)
            .with_system_libraries(&["kernel32.dll", "libc.so.*"])
            .unwrap();

        let resolution = resolve(&[app], &SearchPath::default(), &opts, &inspector).unwrap();

        assert!(resolution.resolved.is_empty());
        assert!(resolution.unresolved.is_empty());
        assert_eq!(resolution.skipped.len(), 2);
    }

    #[test]
    fn test_invalid_system_library_pattern() {
        let err = ResolveOptions::new()
            .with_system_libraries(&["lib[.so"])
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidPattern { .. }));
    }

    #[test]
    fn test_self_dependency_on_entry_is_included() {
        let tree = LibraryTree::new();
        let core = tree.file("lib/libcore.so");
        let plugin = tree.file("lib/libplugin.so");

        let inspector = FakeInspector::new()
            .with_binary(&plugin, ["libcore.so"])
            .with_binary(&core, Vec::<String>::new());

        let search = SearchPath::new([tree.path("lib")]);
        let resolution = resolve(
            &[plugin, core.clone()],
            &search,
            &ResolveOptions::new(),
            &inspector,
        )
        .unwrap();

        assert_eq!(resolution.resolved["libcore.so"], core);
        assert_eq!(inspector.call_count(&core), 1);
    }

    #[test]
    fn test_case_insensitive_names_visit_once() {
        let tree = LibraryTree::new();
        let app = tree.file("app.exe");
        let zlib = tree.file("lib/ZLIB1.dll");

        let inspector = FakeInspector::new()
            .with_binary(&app, ["zlib1.dll", "ZLIB1.DLL"])
            .with_binary(&zlib, Vec::<String>::new());

        let opts = ResolveOptions::new().with_matching(NameMatching::IgnoreAsciiCase);
        let search = SearchPath::new([tree.path("lib")]);
        let resolution = resolve(&[app], &search, &opts, &inspector).unwrap();

        assert_eq!(resolution.resolved.len(), 1);
        assert_eq!(resolution.resolved.values().next().unwrap(), &zlib);
    }

    #[test]
    fn test_uninspectable_entry_fails() {
        let tree = LibraryTree::new();
        let notes = tree.file("notes.dll");

        let err = resolve(
            &[notes],
            &SearchPath::default(),
            &ResolveOptions::new(),
            &FakeInspector::new(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            ResolveError::Inspection(InspectError::UnrecognizedFormat { .. })
        ));
    }

    #[test]
    fn test_uninspectable_dependency_fails() {
        let tree = LibraryTree::new();
        let app = tree.file("app.exe");
        tree.file("lib/libbroken.so");

        let inspector = FakeInspector::new().with_binary(&app, ["libbroken.so"]);
        let search = SearchPath::new([tree.path("lib")]);

        let result = resolve(&[app], &search, &ResolveOptions::new(), &inspector);
        assert!(matches!(result, Err(ResolveError::Inspection(_))));
    }
}
