use std::collections::BTreeSet;

use crate::{
    index::{PackageIndex, SourceGroups},
    model::package::{Arch, Origin, PackageRecord, PackageRef},
};

use super::{ResolveError, Resolver};

/// Maps packages to the source package they were built from, and to the
/// other binaries of the same source group.
pub struct SourceResolver<'a, I> {
    resolver: &'a Resolver<'a, I>,
    groups: &'a SourceGroups,
}

impl<'a, I: PackageIndex> SourceResolver<'a, I> {
    pub fn new(resolver: &'a Resolver<'a, I>, groups: &'a SourceGroups) -> Self {
        SourceResolver { resolver, groups }
    }

    pub fn resolver(&self) -> &Resolver<'a, I> {
        self.resolver
    }

    pub fn groups(&self) -> &SourceGroups {
        self.groups
    }

    /// Resolve the source package a reference was built from, restricting
    /// the search to the `src` architecture tier.
    pub fn source_of(&self, reference: &PackageRef) -> Result<PackageRecord, ResolveError> {
        let src_tier = [Arch::src()];
        match reference {
            PackageRef::Record(record) => {
                let name = match &record.origin {
                    Origin::Binary { source_name, .. } => source_name.as_str(),
                    Origin::Source => record.name.as_str(),
                };
                self.resolver
                    .resolve_with_arches(&PackageRef::from(name), &src_tier)
            }
            other => self.resolver.resolve_with_arches(other, &src_tier),
        }
    }

    /// All binary packages built from the same source as the reference.
    pub fn subpackages_of(
        &self,
        reference: &PackageRef,
    ) -> Result<BTreeSet<PackageRecord>, ResolveError> {
        let source = self.source_of(reference)?;
        Ok(self.groups.subpackages(&source.source_key()))
    }
}
