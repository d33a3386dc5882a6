use std::path::{Path, PathBuf};

use log::{debug, error};
use serde::Deserialize;

use crate::model::{
    package::{Arch, PackageName, RepoName},
    ParseError,
};

/// The run manifest: which snapshot to analyse, which repositories to
/// consult in which priority order, and the resolver defaults.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    pub arch: Arch,
    pub snapshot: PathBuf,
    #[serde(default)]
    pub max_depth: Option<usize>,
    /// Package names excluded from the index at load time. Empty by
    /// default, so nothing is masked.
    #[serde(default)]
    pub exclude: Vec<PackageName>,
    #[serde(rename = "repository", default)]
    pub repositories: Vec<RepositoryEntry>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct RepositoryEntry {
    pub name: RepoName,
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}

impl Manifest {
    pub fn from_file(path: &Path) -> Result<Manifest, ParseError> {
        debug!("Attempting to read manifest from {}", path.display());
        let contents = std::fs::read_to_string(path)?;

        let manifest = Manifest::from_toml_str(&contents);
        if let Err(err) = &manifest {
            error!("Could not build a valid manifest from a repograph toml file due to err {err}")
        }
        manifest
    }

    pub fn from_toml_str(data: &str) -> Result<Manifest, ParseError> {
        let manifest: Manifest = toml::from_str(data)?;
        if manifest.enabled_repositories().is_empty() {
            return Err(ParseError::NoRepositories);
        }
        Ok(manifest)
    }

    /// Enabled repositories, preserving the manifest's priority order.
    pub fn enabled_repositories(&self) -> Vec<RepoName> {
        self.repositories
            .iter()
            .filter(|entry| entry.enabled)
            .map(|entry| entry.name.clone())
            .collect()
    }
}
