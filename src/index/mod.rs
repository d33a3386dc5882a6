mod snapshot;

use std::collections::{BTreeMap, BTreeSet};

use crate::model::package::{Arch, Capability, PackageRecord, RepoName, SourceKey};

pub use snapshot::SnapshotIndex;

/// Read-only view over one snapshot of package records. Implemented by the
/// repository-metadata subsystem; everything above it only filters and
/// groups what the index returns.
pub trait PackageIndex {
    fn list_all(&self) -> Vec<&PackageRecord>;

    fn query(&self, query: &Query<'_>) -> Vec<&PackageRecord>;
}

/// A conjunctive filter over package records; unset dimensions match
/// everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Query<'a> {
    name: Option<&'a str>,
    provides: Option<&'a Capability>,
    arch: Option<&'a Arch>,
    repo: Option<&'a RepoName>,
}

impl<'a> Query<'a> {
    pub fn new() -> Self {
        Query::default()
    }

    pub fn name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn provides(mut self, capability: &'a Capability) -> Self {
        self.provides = Some(capability);
        self
    }

    pub fn arch(mut self, arch: &'a Arch) -> Self {
        self.arch = Some(arch);
        self
    }

    pub fn repo(mut self, repo: &'a RepoName) -> Self {
        self.repo = Some(repo);
        self
    }

    pub fn matches(&self, package: &PackageRecord) -> bool {
        self.name
            .map_or(true, |name| package.name.as_str() == name)
            && self
                .provides
                .map_or(true, |capability| package.provides.contains(capability))
            && self.arch.map_or(true, |arch| &package.arch == arch)
            && self.repo.map_or(true, |repo| &package.repo == repo)
    }
}

/// All binary packages of the index grouped by the source rpm they were
/// built from. Built once per run by a single scan over the index.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SourceGroups {
    groups: BTreeMap<SourceKey, BTreeSet<PackageRecord>>,
}

impl SourceGroups {
    pub fn from_index(index: &impl PackageIndex) -> Self {
        let mut groups: BTreeMap<SourceKey, BTreeSet<PackageRecord>> = BTreeMap::new();
        for package in index.list_all() {
            if package.is_source() {
                continue;
            }
            groups
                .entry(package.source_key())
                .or_default()
                .insert(package.clone());
        }
        SourceGroups { groups }
    }

    /// Binary packages sharing the given source key; empty for unknown keys.
    pub fn subpackages(&self, key: &SourceKey) -> BTreeSet<PackageRecord> {
        self.groups.get(key).cloned().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SourceKey, &BTreeSet<PackageRecord>)> {
        self.groups.iter()
    }

    pub fn source_count(&self) -> usize {
        self.groups.len()
    }

    pub fn package_count(&self) -> usize {
        self.groups.values().map(BTreeSet::len).sum()
    }
}
