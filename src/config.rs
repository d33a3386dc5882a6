use std::{collections::HashMap, path::PathBuf};

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::model::package::Arch;

/// Environment overrides layered on top of the manifest file.
pub struct RepographConfig {
    pub manifest_path: Option<PathBuf>,
    pub arch: Option<Arch>,
}

impl RepographConfig {
    pub fn load() -> anyhow::Result<Self> {
        let raw_config = RawConfig::load(None)?;

        Ok(Self {
            manifest_path: raw_config.manifest.path,
            arch: raw_config.resolver.arch,
        })
    }
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RawConfig {
    #[serde(default)]
    manifest: ManifestConfig,
    #[serde(default)]
    resolver: ResolverConfig,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct ManifestConfig {
    path: Option<PathBuf>,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct ResolverConfig {
    arch: Option<Arch>,
}

impl RawConfig {
    fn load(env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                Environment::with_prefix("REPOGRAPH")
                    .separator("_")
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}
