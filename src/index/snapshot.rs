use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::{
    index::{PackageIndex, Query},
    model::{
        package::{Arch, Capability, PackageName, PackageRecord, RepoName},
        ParseError,
    },
};

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    repositories: Vec<RawRepository>,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    name: String,
    #[serde(default)]
    packages: Vec<RawPackage>,
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    name: String,
    evr: String,
    arch: String,
    #[serde(default)]
    sourcerpm: Option<String>,
    #[serde(default)]
    requires: Vec<String>,
    #[serde(default)]
    provides: Vec<String>,
}

/// The in-memory package index over one snapshot file, standing in for the
/// live repository-metadata subsystem.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SnapshotIndex {
    packages: Vec<PackageRecord>,
}

impl SnapshotIndex {
    pub fn new(packages: Vec<PackageRecord>) -> Self {
        SnapshotIndex { packages }
    }

    pub fn from_file(
        path: &Path,
        repositories: &[RepoName],
        exclude: &[PackageName],
    ) -> Result<Self, ParseError> {
        debug!("Loading package snapshot from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents, repositories, exclude)
    }

    pub fn from_json_str(
        data: &str,
        repositories: &[RepoName],
        exclude: &[PackageName],
    ) -> Result<Self, ParseError> {
        let raw: RawSnapshot = serde_json::from_str(data)?;

        let mut packages = Vec::new();
        for repository in raw.repositories {
            let repo = RepoName::from(repository.name);
            if !repositories.contains(&repo) {
                debug!("Skipping disabled repository {repo}");
                continue;
            }
            for package in repository.packages {
                if exclude.iter().any(|name| name.as_str() == package.name) {
                    debug!("Excluding package {} from {repo}", package.name);
                    continue;
                }
                packages.push(into_record(package, &repo)?);
            }
        }

        Ok(SnapshotIndex { packages })
    }
}

fn into_record(raw: RawPackage, repo: &RepoName) -> Result<PackageRecord, ParseError> {
    let arch = Arch::new(raw.arch);
    let record = if arch.is_source() {
        PackageRecord::source(raw.name, raw.evr, repo.clone())
    } else {
        let sourcerpm = raw
            .sourcerpm
            .ok_or_else(|| ParseError::MissingSourceRpm(raw.name.clone()))?;
        PackageRecord::binary(raw.name, raw.evr, arch, repo.clone(), sourcerpm)?
    };
    Ok(record
        .with_requires(raw.requires.into_iter().map(Capability::new).collect())
        .with_provides(raw.provides.into_iter().map(Capability::new).collect()))
}

impl PackageIndex for SnapshotIndex {
    fn list_all(&self) -> Vec<&PackageRecord> {
        self.packages.iter().collect()
    }

    fn query(&self, query: &Query<'_>) -> Vec<&PackageRecord> {
        self.packages
            .iter()
            .filter(|package| query.matches(package))
            .collect()
    }
}
