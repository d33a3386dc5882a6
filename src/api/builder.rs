use std::{env, error::Error, path::PathBuf};

use home::home_dir;
use log::info;

use crate::{
    index::{SnapshotIndex, SourceGroups},
    model::{manifest::Manifest, package::Arch},
    Repograph,
};

const DEFAULT_MANIFEST_FILE_NAME: &str = "repograph.toml";

#[derive(Default)]
pub struct RepographBuilder {
    // All other paths are relative to `root`
    root: Option<PathBuf>,
    manifest_file_name: Option<PathBuf>,
    snapshot_path: Option<PathBuf>,
    arch: Option<Arch>,
}

impl RepographBuilder {
    /// Project root directory.
    ///
    /// Defaults to the current directory.
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Name of the repograph manifest toml file.
    ///
    /// Defaults to `repograph.toml`, falling back to
    /// `$HOME/.config/repograph/repograph.toml`.
    pub fn manifest_file_name(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_file_name = Some(path.into());
        self
    }

    /// Overrides the snapshot file configured in the manifest.
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Overrides the primary architecture configured in the manifest.
    pub fn arch(mut self, arch: Arch) -> Self {
        self.arch = Some(arch);
        self
    }

    pub fn try_build(self) -> Result<Repograph, Box<dyn Error>> {
        let Self {
            root,
            manifest_file_name,
            snapshot_path,
            arch,
        } = self;

        let root = match root {
            Some(root) => root,
            None => env::current_dir()?,
        };

        let manifest_path = match manifest_file_name {
            Some(name) => root.join(name),
            None => {
                let local = root.join(DEFAULT_MANIFEST_FILE_NAME);
                if local.exists() {
                    local
                } else {
                    default_manifest_path()
                }
            }
        };

        let mut manifest = Manifest::from_file(&manifest_path)?;
        if let Some(arch) = arch {
            manifest.arch = arch;
        }

        let snapshot_path = snapshot_path.unwrap_or_else(|| manifest.snapshot.clone());
        let snapshot_path = if snapshot_path.is_absolute() {
            snapshot_path
        } else {
            root.join(snapshot_path)
        };

        let index = SnapshotIndex::from_file(
            &snapshot_path,
            &manifest.enabled_repositories(),
            &manifest.exclude,
        )?;
        let groups = SourceGroups::from_index(&index);
        info!(
            "Loaded {} source groups covering {} binary packages",
            groups.source_count(),
            groups.package_count()
        );

        Ok(Repograph {
            manifest,
            index,
            groups,
        })
    }
}

fn default_manifest_path() -> PathBuf {
    let mut manifest_path =
        home_dir().expect("Could not find home dir. Please define $HOME env variable.");
    manifest_path.push(".config/repograph");
    manifest_path.push(DEFAULT_MANIFEST_FILE_NAME);
    manifest_path
}
