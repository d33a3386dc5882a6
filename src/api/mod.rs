use std::{error::Error, path::Path};

use crate::{
    cli::command_handlers::{do_closure, do_graph, do_requires, do_stats, do_subpackages},
    graph::DEFAULT_CLOSURE_DEPTH,
    index::{SnapshotIndex, SourceGroups},
    model::manifest::Manifest,
    resolver::{Resolver, SourceResolver},
};

mod builder;

pub use builder::RepographBuilder;

/// A fully loaded analysis session: manifest, package index and the
/// precomputed source groups.
pub struct Repograph {
    manifest: Manifest,
    index: SnapshotIndex,
    groups: SourceGroups,
}

impl Repograph {
    pub fn builder() -> RepographBuilder {
        RepographBuilder::default()
    }

    /// Computes the transitive closure of a package's runtime and build
    /// requirements.
    pub fn closure(&self, package: &str, max_depth: Option<usize>) -> Result<(), Box<dyn Error>> {
        let max_depth = max_depth
            .or(self.manifest.max_depth)
            .unwrap_or(DEFAULT_CLOSURE_DEPTH);
        let resolver = self.resolver();
        let sources = SourceResolver::new(&resolver, &self.groups);
        do_closure(&sources, package, max_depth)
    }

    /// Lists the one-hop runtime or build requirements of a package.
    pub fn requires(&self, package: &str, build: bool) -> Result<(), Box<dyn Error>> {
        let resolver = self.resolver();
        let sources = SourceResolver::new(&resolver, &self.groups);
        do_requires(&sources, package, build)
    }

    /// Lists all binary packages built from the same source package.
    pub fn subpackages(&self, package: &str) -> Result<(), Box<dyn Error>> {
        let resolver = self.resolver();
        let sources = SourceResolver::new(&resolver, &self.groups);
        do_subpackages(&sources, package)
    }

    /// Builds and emits the dependency graph for the whole index.
    pub fn graph(&self, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
        let resolver = self.resolver();
        let sources = SourceResolver::new(&resolver, &self.groups);
        do_graph(&sources, output)
    }

    /// Prints source group and package counts for the loaded snapshot.
    pub fn stats(&self) -> Result<(), Box<dyn Error>> {
        do_stats(&self.groups)
    }

    fn resolver(&self) -> Resolver<'_, SnapshotIndex> {
        Resolver::new(
            &self.index,
            self.manifest.arch.clone(),
            self.manifest.enabled_repositories(),
        )
    }
}
