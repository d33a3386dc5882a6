use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
};

use log::warn;
use serde_json::{Map, Value};

use crate::{
    index::PackageIndex,
    model::package::{Capability, Origin, PackageName, PackageRecord, PackageRef, SourceKey},
    resolver::{ResolveError, Resolver, SourceResolver},
};

pub const DEFAULT_CLOSURE_DEPTH: usize = 10;

/// A requirement that could not be resolved while expanding a package.
/// Recorded and skipped; one bad dependency never aborts a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    UnresolvedDependency {
        capability: Capability,
        package: String,
    },
    UnresolvedSource {
        source_name: PackageName,
        package: String,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::UnresolvedDependency {
                capability,
                package,
            } => write!(f, "unable to resolve dependency {capability} of {package}"),
            Diagnostic::UnresolvedSource {
                source_name,
                package,
            } => write!(f, "unable to resolve source package {source_name} of {package}"),
        }
    }
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    events: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn record(&mut self, diagnostic: Diagnostic) {
        warn!("{diagnostic}");
        self.events.push(diagnostic);
    }

    pub fn events(&self) -> &[Diagnostic] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

/// One-hop runtime requirements of a package, as concrete records.
/// Resolving the reference itself is fatal; resolving its declared
/// requirements is not.
pub fn requires_of<I: PackageIndex>(
    resolver: &Resolver<'_, I>,
    reference: &PackageRef,
    diagnostics: &mut Diagnostics,
) -> Result<BTreeSet<PackageRecord>, ResolveError> {
    let package = resolver.resolve(reference)?;
    Ok(expand_requires(resolver, &package, diagnostics))
}

/// One-hop build requirements: what the originating source package needs.
pub fn build_requires_of<I: PackageIndex>(
    sources: &SourceResolver<'_, I>,
    reference: &PackageRef,
    diagnostics: &mut Diagnostics,
) -> Result<BTreeSet<PackageRecord>, ResolveError> {
    let source = sources.source_of(reference)?;
    Ok(expand_requires(sources.resolver(), &source, diagnostics))
}

fn expand_requires<I: PackageIndex>(
    resolver: &Resolver<'_, I>,
    package: &PackageRecord,
    diagnostics: &mut Diagnostics,
) -> BTreeSet<PackageRecord> {
    // Declared requirements are deduplicated by their textual form before
    // resolution.
    let declared: BTreeSet<&Capability> = package.requires.iter().collect();

    let mut result = BTreeSet::new();
    for capability in declared {
        match resolver.resolve(&PackageRef::Capability(capability.clone())) {
            Ok(provider) => {
                result.insert(provider);
            }
            Err(_) => diagnostics.record(Diagnostic::UnresolvedDependency {
                capability: capability.clone(),
                package: package.to_string(),
            }),
        }
    }
    result
}

/// The transitive closure of `requires_of ∪ build_requires_of`, bounded to
/// `max_depth` breadth-first expansion rounds. The depth bound guarantees
/// termination on cyclic requirement graphs. The starting package enters
/// the result only if some other package requires it back.
pub fn closure<I: PackageIndex>(
    sources: &SourceResolver<'_, I>,
    reference: &PackageRef,
    max_depth: usize,
    diagnostics: &mut Diagnostics,
) -> Result<BTreeSet<PackageRecord>, ResolveError> {
    let start = sources.resolver().resolve(reference)?;

    let mut result: BTreeSet<PackageRecord> = BTreeSet::new();
    let mut frontier = BTreeSet::from([start]);

    for _ in 0..max_depth {
        let mut next = BTreeSet::new();
        for package in &frontier {
            let reference = PackageRef::Record(package.clone());
            next.extend(requires_of(sources.resolver(), &reference, diagnostics)?);
            next.extend(build_requires_of(sources, &reference, diagnostics)?);
        }

        next.retain(|package| !result.contains(package) && !frontier.contains(package));
        result.extend(next.iter().cloned());
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    Ok(result)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DependencyEdges {
    pub requires: BTreeSet<PackageRecord>,
    pub build_requires: BTreeSet<PackageRecord>,
}

/// The whole-index dependency graph: source key → binary package → one-hop
/// requirement edges.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    groups: BTreeMap<SourceKey, BTreeMap<PackageRecord, DependencyEdges>>,
}

impl DependencyGraph {
    pub fn get(&self, source: &SourceKey) -> Option<&BTreeMap<PackageRecord, DependencyEdges>> {
        self.groups.get(source)
    }

    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&SourceKey, &BTreeMap<PackageRecord, DependencyEdges>)> {
        self.groups.iter()
    }

    pub fn source_count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// String-keyed projection for serialization: ordered maps keyed by
    /// canonical string forms, requirement sets as ordered arrays.
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        for (source, members) in &self.groups {
            let mut group = Map::new();
            for (package, edges) in members {
                let mut entry = Map::new();
                entry.insert("requires".to_string(), string_array(&edges.requires));
                entry.insert(
                    "build_requires".to_string(),
                    string_array(&edges.build_requires),
                );
                group.insert(package.to_string(), Value::Object(entry));
            }
            root.insert(source.to_string(), Value::Object(group));
        }
        Value::Object(root)
    }
}

fn string_array(packages: &BTreeSet<PackageRecord>) -> Value {
    Value::Array(
        packages
            .iter()
            .map(|package| Value::String(package.to_string()))
            .collect(),
    )
}

/// Assembles requirement edges for every binary package of every source
/// group. Always completes: a member whose source package cannot be
/// resolved keeps an empty build-requires set and the event is recorded.
pub fn build_graph<I: PackageIndex>(
    sources: &SourceResolver<'_, I>,
    diagnostics: &mut Diagnostics,
) -> Result<DependencyGraph, ResolveError> {
    let mut groups = BTreeMap::new();
    for (source_key, subpackages) in sources.groups().iter() {
        let mut members = BTreeMap::new();
        for package in subpackages {
            let reference = PackageRef::Record(package.clone());
            let requires = requires_of(sources.resolver(), &reference, diagnostics)?;
            let build_requires = match build_requires_of(sources, &reference, diagnostics) {
                Ok(build_requires) => build_requires,
                Err(_) => {
                    if let Origin::Binary { source_name, .. } = &package.origin {
                        diagnostics.record(Diagnostic::UnresolvedSource {
                            source_name: source_name.clone(),
                            package: package.to_string(),
                        });
                    }
                    BTreeSet::new()
                }
            };
            members.insert(
                package.clone(),
                DependencyEdges {
                    requires,
                    build_requires,
                },
            );
        }
        groups.insert(source_key.clone(), members);
    }
    Ok(DependencyGraph { groups })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        index::{SnapshotIndex, SourceGroups},
        model::package::{Arch, RepoName},
    };
    use pretty_assertions::assert_eq;

    fn x86() -> Arch {
        Arch::new("x86_64")
    }

    fn repos() -> Vec<RepoName> {
        vec![RepoName::from("rawhide"), RepoName::from("rawhide-source")]
    }

    fn binary(name: &str, source: &str, requires: &[&str]) -> PackageRecord {
        PackageRecord::binary(name, "1-1", x86(), "rawhide", format!("{source}-1-1.src.rpm"))
            .unwrap()
            .with_requires(requires.iter().map(|c| Capability::from(*c)).collect())
    }

    fn source(name: &str, requires: &[&str]) -> PackageRecord {
        PackageRecord::source(name, "1-1", "rawhide-source")
            .with_requires(requires.iter().map(|c| Capability::from(*c)).collect())
    }

    /// Source `a` produces `a` (requires `b`) and `a-libs`; source `b`
    /// produces `b`.
    fn two_source_index() -> SnapshotIndex {
        SnapshotIndex::new(vec![
            source("a", &[]),
            source("b", &[]),
            binary("a", "a", &["b"]),
            binary("a-libs", "a", &[]),
            binary("b", "b", &[]),
        ])
    }

    fn names(packages: &BTreeSet<PackageRecord>) -> Vec<&str> {
        packages.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn requires_resolve_to_concrete_records() {
        let index = two_source_index();
        let resolver = Resolver::new(&index, x86(), repos());
        let mut diagnostics = Diagnostics::new();

        let requires =
            requires_of(&resolver, &PackageRef::from("a"), &mut diagnostics).unwrap();
        assert_eq!(names(&requires), vec!["b"]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn duplicate_declared_requirements_are_expanded_once() {
        let index = SnapshotIndex::new(vec![
            source("a", &[]),
            source("b", &[]),
            binary("a", "a", &["b", "b"]),
            binary("b", "b", &[]),
        ]);
        let resolver = Resolver::new(&index, x86(), repos());
        let mut diagnostics = Diagnostics::new();

        let requires =
            requires_of(&resolver, &PackageRef::from("a"), &mut diagnostics).unwrap();
        assert_eq!(requires.len(), 1);
    }

    #[test]
    fn one_unresolvable_requirement_does_not_poison_the_rest() {
        let index = SnapshotIndex::new(vec![
            source("a", &[]),
            source("b", &[]),
            binary("a", "a", &["b", "libmissing.so.9"]),
            binary("b", "b", &[]),
        ]);
        let resolver = Resolver::new(&index, x86(), repos());
        let mut diagnostics = Diagnostics::new();

        let requires =
            requires_of(&resolver, &PackageRef::from("a"), &mut diagnostics).unwrap();
        assert_eq!(names(&requires), vec!["b"]);
        assert_eq!(
            diagnostics.events(),
            &[Diagnostic::UnresolvedDependency {
                capability: Capability::from("libmissing.so.9"),
                package: "a-1-1.x86_64".to_string(),
            }]
        );
    }

    #[test]
    fn build_requires_come_from_the_source_package() {
        let index = SnapshotIndex::new(vec![
            source("a", &["gcc"]),
            source("gcc", &[]),
            binary("a", "a", &["b"]),
            binary("gcc", "gcc", &[]),
            binary("b", "b", &[]),
            source("b", &[]),
        ]);
        let resolver = Resolver::new(&index, x86(), repos());
        let groups = SourceGroups::from_index(&index);
        let sources = SourceResolver::new(&resolver, &groups);
        let mut diagnostics = Diagnostics::new();

        let build_requires =
            build_requires_of(&sources, &PackageRef::from("a"), &mut diagnostics).unwrap();
        assert_eq!(names(&build_requires), vec!["gcc"]);
    }

    #[test]
    fn closure_of_depth_one_is_the_direct_requirements() {
        let index = two_source_index();
        let resolver = Resolver::new(&index, x86(), repos());
        let groups = SourceGroups::from_index(&index);
        let sources = SourceResolver::new(&resolver, &groups);
        let mut diagnostics = Diagnostics::new();

        let result = closure(&sources, &PackageRef::from("a"), 1, &mut diagnostics).unwrap();
        assert_eq!(names(&result), vec!["b"]);
    }

    #[test]
    fn closure_of_depth_zero_is_empty() {
        let index = two_source_index();
        let resolver = Resolver::new(&index, x86(), repos());
        let groups = SourceGroups::from_index(&index);
        let sources = SourceResolver::new(&resolver, &groups);
        let mut diagnostics = Diagnostics::new();

        let result = closure(&sources, &PackageRef::from("a"), 0, &mut diagnostics).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn closure_terminates_on_requirement_cycles() {
        let index = SnapshotIndex::new(vec![
            source("a", &[]),
            source("b", &[]),
            binary("a", "a", &["b"]),
            binary("b", "b", &["a"]),
        ]);
        let resolver = Resolver::new(&index, x86(), repos());
        let groups = SourceGroups::from_index(&index);
        let sources = SourceResolver::new(&resolver, &groups);
        let mut diagnostics = Diagnostics::new();

        let result =
            closure(&sources, &PackageRef::from("a"), 100, &mut diagnostics).unwrap();
        // `a` is rediscovered through the cycle.
        assert_eq!(names(&result), vec!["a", "b"]);
    }

    #[test]
    fn closure_is_monotone_in_depth() {
        let index = SnapshotIndex::new(vec![
            source("a", &[]),
            source("b", &[]),
            source("c", &[]),
            binary("a", "a", &["b"]),
            binary("b", "b", &["c"]),
            binary("c", "c", &[]),
        ]);
        let resolver = Resolver::new(&index, x86(), repos());
        let groups = SourceGroups::from_index(&index);
        let sources = SourceResolver::new(&resolver, &groups);
        let mut diagnostics = Diagnostics::new();

        let mut previous = BTreeSet::new();
        for depth in 0..4 {
            let result =
                closure(&sources, &PackageRef::from("a"), depth, &mut diagnostics).unwrap();
            assert!(result.is_superset(&previous));
            previous = result;
        }
        assert_eq!(names(&previous), vec!["b", "c"]);
    }

    #[test]
    fn graph_groups_edges_under_the_source_key() {
        let index = two_source_index();
        let resolver = Resolver::new(&index, x86(), repos());
        let groups = SourceGroups::from_index(&index);
        let sources = SourceResolver::new(&resolver, &groups);
        let mut diagnostics = Diagnostics::new();

        let graph = build_graph(&sources, &mut diagnostics).unwrap();
        assert_eq!(graph.source_count(), 2);

        let group = graph.get(&SourceKey::from("a-1-1.src.rpm")).unwrap();
        let a = resolver.resolve(&PackageRef::from("a")).unwrap();
        let edges = group.get(&a).unwrap();
        assert_eq!(names(&edges.requires), vec!["b"]);
        assert!(edges.build_requires.is_empty());
    }

    #[test]
    fn graph_building_is_idempotent() {
        let index = two_source_index();
        let resolver = Resolver::new(&index, x86(), repos());
        let groups = SourceGroups::from_index(&index);
        let sources = SourceResolver::new(&resolver, &groups);

        let first = build_graph(&sources, &mut Diagnostics::new()).unwrap();
        let second = build_graph(&sources, &mut Diagnostics::new()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn graph_survives_a_group_without_source_package() {
        let index = SnapshotIndex::new(vec![
            source("a", &[]),
            binary("a", "a", &[]),
            binary("orphan", "orphan", &[]),
        ]);
        let resolver = Resolver::new(&index, x86(), repos());
        let groups = SourceGroups::from_index(&index);
        let sources = SourceResolver::new(&resolver, &groups);
        let mut diagnostics = Diagnostics::new();

        let graph = build_graph(&sources, &mut diagnostics).unwrap();
        assert_eq!(graph.source_count(), 2);

        let group = graph.get(&SourceKey::from("orphan-1-1.src.rpm")).unwrap();
        let orphan = resolver.resolve(&PackageRef::from("orphan")).unwrap();
        assert!(group.get(&orphan).unwrap().build_requires.is_empty());
        assert!(diagnostics
            .events()
            .iter()
            .any(|event| matches!(event, Diagnostic::UnresolvedSource { .. })));
    }

    #[test]
    fn json_projection_uses_canonical_string_keys() {
        let index = two_source_index();
        let resolver = Resolver::new(&index, x86(), repos());
        let groups = SourceGroups::from_index(&index);
        let sources = SourceResolver::new(&resolver, &groups);

        let graph = build_graph(&sources, &mut Diagnostics::new()).unwrap();
        let json = graph.to_json();

        let requires = &json["a-1-1.src.rpm"]["a-1-1.x86_64"]["requires"];
        assert_eq!(requires, &serde_json::json!(["b-1-1.x86_64"]));
        let libs = &json["a-1-1.src.rpm"]["a-libs-1-1.x86_64"]["requires"];
        assert_eq!(libs, &serde_json::json!([]));
    }
}
