use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::model::ParseError;

#[derive(Clone, Hash, Deserialize, Serialize, Debug, PartialEq, Eq, Ord, PartialOrd)]
pub struct PackageName(String);

impl PackageName {
    pub fn new(s: impl Into<String>) -> Self {
        PackageName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        PackageName(s)
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        PackageName(s.to_string())
    }
}

#[derive(Clone, Hash, Deserialize, Serialize, Debug, PartialEq, Eq, Ord, PartialOrd)]
pub struct RepoName(String);

impl RepoName {
    pub fn new(s: impl Into<String>) -> Self {
        RepoName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RepoName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RepoName {
    fn from(s: String) -> Self {
        RepoName(s)
    }
}

impl From<&str> for RepoName {
    fn from(s: &str) -> Self {
        RepoName(s.to_string())
    }
}

/// A package architecture label, e.g. `x86_64`, `noarch` or `src`.
#[derive(Clone, Hash, Deserialize, Serialize, Debug, PartialEq, Eq, Ord, PartialOrd)]
pub struct Arch(String);

impl Arch {
    pub fn new(s: impl Into<String>) -> Self {
        Arch(s.into())
    }

    /// The architecture of packages installable everywhere.
    pub fn noarch() -> Self {
        Arch("noarch".to_string())
    }

    /// The architecture reserved for source packages.
    pub fn src() -> Self {
        Arch("src".to_string())
    }

    pub fn is_source(&self) -> bool {
        self.0 == "src"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Arch {
    fn from(s: &str) -> Self {
        Arch(s.to_string())
    }
}

/// An abstract requirement satisfied by whatever provides it. Two
/// capabilities are the same dependency iff their textual forms are equal.
#[derive(Clone, Hash, Deserialize, Serialize, Debug, PartialEq, Eq, Ord, PartialOrd)]
pub struct Capability(String);

impl Capability {
    pub fn new(s: impl Into<String>) -> Self {
        Capability(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Capability {
    fn from(s: &str) -> Self {
        Capability(s.to_string())
    }
}

/// Identity of a source artifact: the source rpm file name shared by every
/// binary package built from it, e.g. `bash-5.2.26-3.fc41.src.rpm`.
#[derive(Clone, Hash, Deserialize, Serialize, Debug, PartialEq, Eq, Ord, PartialOrd)]
pub struct SourceKey(String);

impl SourceKey {
    pub fn new(s: impl Into<String>) -> Self {
        SourceKey(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extracts the package name from a `name-version-release.src.rpm` key.
    pub fn source_name(&self) -> Result<PackageName, ParseError> {
        let re = Regex::new(r"^(?P<name>.+)-[^-]+-[^-]+\.src\.rpm$").unwrap();
        re.captures(&self.0)
            .and_then(|c| c.name("name"))
            .map(|name| PackageName::from(name.as_str()))
            .ok_or_else(|| ParseError::MalformedSourceRpm(self.0.clone()))
    }
}

impl Display for SourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SourceKey {
    fn from(s: String) -> Self {
        SourceKey(s)
    }
}

impl From<&str> for SourceKey {
    fn from(s: &str) -> Self {
        SourceKey(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum Origin {
    /// A source package; its own canonical form names the source artifact.
    Source,
    /// A binary package built from `source_rpm`. The source name is parsed
    /// out of the key once, at construction.
    Binary {
        source_rpm: SourceKey,
        source_name: PackageName,
    },
}

/// One concrete artifact in the package index. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct PackageRecord {
    pub name: PackageName,
    pub evr: String,
    pub arch: Arch,
    pub repo: RepoName,
    pub origin: Origin,
    pub requires: Vec<Capability>,
    pub provides: Vec<Capability>,
}

impl PackageRecord {
    pub fn source(
        name: impl Into<PackageName>,
        evr: impl Into<String>,
        repo: impl Into<RepoName>,
    ) -> Self {
        let mut record = PackageRecord {
            name: name.into(),
            evr: evr.into(),
            arch: Arch::src(),
            repo: repo.into(),
            origin: Origin::Source,
            requires: Vec::new(),
            provides: Vec::new(),
        };
        record.ensure_self_provide();
        record
    }

    pub fn binary(
        name: impl Into<PackageName>,
        evr: impl Into<String>,
        arch: Arch,
        repo: impl Into<RepoName>,
        source_rpm: impl Into<SourceKey>,
    ) -> Result<Self, ParseError> {
        let source_rpm = source_rpm.into();
        let source_name = source_rpm.source_name()?;
        let mut record = PackageRecord {
            name: name.into(),
            evr: evr.into(),
            arch,
            repo: repo.into(),
            origin: Origin::Binary {
                source_rpm,
                source_name,
            },
            requires: Vec::new(),
            provides: Vec::new(),
        };
        record.ensure_self_provide();
        Ok(record)
    }

    pub fn with_requires(mut self, requires: Vec<Capability>) -> Self {
        self.requires = requires;
        self
    }

    pub fn with_provides(mut self, provides: Vec<Capability>) -> Self {
        self.provides = provides;
        self.ensure_self_provide();
        self
    }

    // Repository metadata always lists a package's own name among its
    // provides; programmatically built records must hold the same invariant.
    fn ensure_self_provide(&mut self) {
        let own = Capability::new(self.name.as_str());
        if !self.provides.contains(&own) {
            self.provides.push(own);
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(self.origin, Origin::Source)
    }

    /// The source-group identity key: the source rpm a binary was built
    /// from, or the source package's own canonical form plus `.rpm`.
    pub fn source_key(&self) -> SourceKey {
        match &self.origin {
            Origin::Source => SourceKey::new(format!("{self}.rpm")),
            Origin::Binary { source_rpm, .. } => source_rpm.clone(),
        }
    }
}

impl Display for PackageRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}.{}", self.name, self.evr, self.arch)
    }
}

/// A reference to a package before resolution: a plain name, an abstract
/// capability, or an already-concrete record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageRef {
    Name(String),
    Capability(Capability),
    Record(PackageRecord),
}

impl From<&str> for PackageRef {
    fn from(s: &str) -> Self {
        PackageRef::Name(s.to_string())
    }
}

impl From<String> for PackageRef {
    fn from(s: String) -> Self {
        PackageRef::Name(s)
    }
}

impl From<Capability> for PackageRef {
    fn from(capability: Capability) -> Self {
        PackageRef::Capability(capability)
    }
}

impl From<PackageRecord> for PackageRef {
    fn from(record: PackageRecord) -> Self {
        PackageRef::Record(record)
    }
}
