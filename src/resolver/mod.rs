mod source;

use thiserror::Error;

use crate::{
    index::{PackageIndex, Query},
    model::package::{Arch, Capability, PackageRecord, PackageRef, RepoName},
};

pub use source::SourceResolver;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A plain-name lookup did not match exactly one record in the first
    /// non-empty tier. Never resolved to an arbitrary pick.
    #[error("unable to uniquely resolve `{reference}`: matched {candidates:?}")]
    AmbiguousReference {
        reference: String,
        candidates: Vec<String>,
    },
    #[error("unable to resolve dependency `{0}`")]
    UnresolvableDependency(Capability),
}

/// Resolves a package reference to exactly one concrete record by trying
/// (repository, architecture) tiers in priority order. Repository order
/// dominates: every architecture tier of a repository is consulted before
/// falling back to the next repository.
pub struct Resolver<'a, I> {
    index: &'a I,
    arches: Vec<Arch>,
    repos: Vec<RepoName>,
}

impl<'a, I: PackageIndex> Resolver<'a, I> {
    pub fn new(index: &'a I, primary_arch: Arch, repos: Vec<RepoName>) -> Self {
        Resolver {
            index,
            arches: vec![primary_arch, Arch::noarch()],
            repos,
        }
    }

    /// Resolve against the default architecture tiers (primary, noarch).
    pub fn resolve(&self, reference: &PackageRef) -> Result<PackageRecord, ResolveError> {
        self.resolve_with_arches(reference, &self.arches)
    }

    pub fn resolve_with_arches(
        &self,
        reference: &PackageRef,
        arches: &[Arch],
    ) -> Result<PackageRecord, ResolveError> {
        match reference {
            PackageRef::Record(record) => Ok(record.clone()),
            PackageRef::Name(name) => self.resolve_name(name, arches),
            PackageRef::Capability(capability) => self.resolve_capability(capability, arches),
        }
    }

    fn resolve_name(&self, name: &str, arches: &[Arch]) -> Result<PackageRecord, ResolveError> {
        let matches = self.first_tier(arches, |arch, repo| {
            self.index
                .query(&Query::new().name(name).arch(arch).repo(repo))
        });

        match matches.as_slice() {
            [package] => Ok((*package).clone()),
            other => Err(ResolveError::AmbiguousReference {
                reference: name.to_string(),
                candidates: other.iter().map(|package| package.to_string()).collect(),
            }),
        }
    }

    fn resolve_capability(
        &self,
        capability: &Capability,
        arches: &[Arch],
    ) -> Result<PackageRecord, ResolveError> {
        let matches = self.first_tier(arches, |arch, repo| {
            self.index
                .query(&Query::new().provides(capability).arch(arch).repo(repo))
        });

        // A provider named exactly like the capability outranks every other
        // provider in the tier.
        if let Some(exact) = matches
            .iter()
            .find(|package| package.name.as_str() == capability.as_str())
        {
            return Ok((*exact).clone());
        }

        matches
            .first()
            .map(|package| (*package).clone())
            .ok_or_else(|| ResolveError::UnresolvableDependency(capability.clone()))
    }

    /// The match set of the first (repository, architecture) tier that has
    /// one; empty if no tier matches.
    fn first_tier<F>(&self, arches: &[Arch], query: F) -> Vec<&'a PackageRecord>
    where
        F: Fn(&Arch, &RepoName) -> Vec<&'a PackageRecord>,
    {
        for repo in &self.repos {
            for arch in arches {
                let matches = query(arch, repo);
                if !matches.is_empty() {
                    return matches;
                }
            }
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::SnapshotIndex;
    use pretty_assertions::assert_eq;

    fn x86() -> Arch {
        Arch::new("x86_64")
    }

    fn repos() -> Vec<RepoName> {
        vec![RepoName::from("rawhide"), RepoName::from("rawhide-source")]
    }

    fn binary(name: &str, arch: Arch, repo: &str) -> PackageRecord {
        PackageRecord::binary(name, "1-1", arch, repo, format!("{name}-1-1.src.rpm")).unwrap()
    }

    #[test]
    fn resolves_a_unique_name_deterministically() {
        let index = SnapshotIndex::new(vec![
            binary("a", x86(), "rawhide"),
            binary("b", x86(), "rawhide"),
        ]);
        let resolver = Resolver::new(&index, x86(), repos());

        let first = resolver.resolve(&PackageRef::from("a")).unwrap();
        let second = resolver.resolve(&PackageRef::from("a")).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_string(), "a-1-1.x86_64");
    }

    #[test]
    fn primary_arch_outranks_noarch_within_a_repository() {
        let index = SnapshotIndex::new(vec![
            binary("a", Arch::noarch(), "rawhide"),
            binary("a", x86(), "rawhide"),
        ]);
        let resolver = Resolver::new(&index, x86(), repos());

        let package = resolver.resolve(&PackageRef::from("a")).unwrap();
        assert_eq!(package.arch, x86());
    }

    #[test]
    fn repository_priority_dominates_architecture_priority() {
        // The name only exists as noarch in the first repository, and as
        // the primary arch in the second; the first repository must win.
        let index = SnapshotIndex::new(vec![
            binary("a", x86(), "rawhide-source"),
            binary("a", Arch::noarch(), "rawhide"),
        ]);
        let resolver = Resolver::new(&index, x86(), repos());

        let package = resolver.resolve(&PackageRef::from("a")).unwrap();
        assert_eq!(package.repo, RepoName::from("rawhide"));
        assert_eq!(package.arch, Arch::noarch());
    }

    #[test]
    fn name_with_no_match_anywhere_fails() {
        let index = SnapshotIndex::new(vec![binary("a", x86(), "rawhide")]);
        let resolver = Resolver::new(&index, x86(), repos());

        let err = resolver.resolve(&PackageRef::from("zzz")).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::AmbiguousReference { ref candidates, .. } if candidates.is_empty()
        ));
    }

    #[test]
    fn two_name_matches_in_one_tier_fail() {
        // Same name twice in the same (repo, arch) tier.
        let index = SnapshotIndex::new(vec![
            binary("a", x86(), "rawhide"),
            PackageRecord::binary("a", "2-1", x86(), "rawhide", "a-2-1.src.rpm").unwrap(),
        ]);
        let resolver = Resolver::new(&index, x86(), repos());

        let err = resolver.resolve(&PackageRef::from("a")).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::AmbiguousReference { ref candidates, .. } if candidates.len() == 2
        ));
    }

    #[test]
    fn capability_resolution_prefers_the_exact_name() {
        let provides = Capability::from("libfoo");
        let index = SnapshotIndex::new(vec![
            binary("libfoo-compat", x86(), "rawhide").with_provides(vec![provides.clone()]),
            binary("libfoo", x86(), "rawhide"),
        ]);
        let resolver = Resolver::new(&index, x86(), repos());

        let package = resolver
            .resolve(&PackageRef::from(Capability::from("libfoo")))
            .unwrap();
        assert_eq!(package.name.as_str(), "libfoo");
    }

    #[test]
    fn capability_with_several_providers_takes_the_first_in_index_order() {
        let cap = Capability::from("webserver");
        let index = SnapshotIndex::new(vec![
            binary("nginx", x86(), "rawhide").with_provides(vec![cap.clone()]),
            binary("httpd", x86(), "rawhide").with_provides(vec![cap.clone()]),
        ]);
        let resolver = Resolver::new(&index, x86(), repos());

        let package = resolver.resolve(&PackageRef::from(cap)).unwrap();
        assert_eq!(package.name.as_str(), "nginx");
    }

    #[test]
    fn capability_with_no_provider_is_unresolvable() {
        let index = SnapshotIndex::new(vec![binary("a", x86(), "rawhide")]);
        let resolver = Resolver::new(&index, x86(), repos());

        let err = resolver
            .resolve(&PackageRef::from(Capability::from("libmissing.so.9")))
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::UnresolvableDependency(Capability::from("libmissing.so.9"))
        );
    }

    #[test]
    fn concrete_records_resolve_to_themselves() {
        let index = SnapshotIndex::new(vec![]);
        let resolver = Resolver::new(&index, x86(), repos());

        let record = binary("a", x86(), "rawhide");
        let resolved = resolver
            .resolve(&PackageRef::from(record.clone()))
            .unwrap();
        assert_eq!(resolved, record);
    }
}
