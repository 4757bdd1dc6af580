//! Artifact descriptors: identity and file locations of one build output

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Kind of plugin an artifact implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Compression,
    Archive,
}

impl ArtifactKind {
    /// Every supported kind
    pub const ALL: [ArtifactKind; 2] = [ArtifactKind::Compression, ArtifactKind::Archive];

    /// Directory and package-name segment for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Compression => "compression",
            ArtifactKind::Archive => "archive",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compression" => Ok(ArtifactKind::Compression),
            "archive" => Ok(ArtifactKind::Archive),
            other => Err(format!("unknown artifact kind: {}", other)),
        }
    }
}

/// Derive the leaf package name for an artifact
///
/// # Examples
///
/// ```
/// use plugin_publisher::artifacts::{ArtifactKind, package_name};
///
/// assert_eq!(
///     package_name("@droply/plugins", "nodejs", ArtifactKind::Compression, "gzip"),
///     "@droply/plugins-nodejs-compression-gzip"
/// );
/// ```
pub fn package_name(umbrella: &str, platform: &str, kind: ArtifactKind, algorithm: &str) -> String {
    format!("{}-{}-{}-{}", umbrella, platform, kind.as_str(), algorithm)
}

/// File names found in an artifact directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactFiles {
    /// Entry module, always present
    pub entry: String,
    /// Type declarations
    pub types: Option<String>,
    /// Compiled binary
    pub binary: Option<String>,
}

impl ArtifactFiles {
    /// Present files in manifest order: entry, binary, types
    pub fn present(&self) -> Vec<&str> {
        let mut files = vec![self.entry.as_str()];
        files.extend(self.binary.as_deref());
        files.extend(self.types.as_deref());
        files
    }
}

/// Identity and file locations for one platform/kind/algorithm build output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    pub platform: String,
    pub kind: ArtifactKind,
    pub algorithm: String,
    /// Directory holding the artifact files and its manifests
    pub directory: PathBuf,
    pub files: ArtifactFiles,
    pub package_name: String,
}

impl ArtifactDescriptor {
    /// Create a descriptor, deriving its package name from the umbrella name
    pub fn new(
        umbrella: &str,
        platform: impl Into<String>,
        kind: ArtifactKind,
        algorithm: impl Into<String>,
        directory: impl Into<PathBuf>,
        files: ArtifactFiles,
    ) -> Self {
        let platform = platform.into();
        let algorithm = algorithm.into();
        let package_name = package_name(umbrella, &platform, kind, &algorithm);

        Self {
            platform,
            kind,
            algorithm,
            directory: directory.into(),
            files,
            package_name,
        }
    }

    /// Sort and identity key: `(platform, kind, algorithm)` as strings
    pub fn key(&self) -> (&str, &str, &str) {
        (&self.platform, self.kind.as_str(), &self.algorithm)
    }

    /// Export subpath inside the umbrella package
    pub fn subpath(&self) -> String {
        format!("./{}/{}/{}", self.platform, self.kind, self.algorithm)
    }

    /// Absolute path of a file inside the artifact directory
    pub fn file_path(&self, file_name: &str) -> PathBuf {
        self.directory.join(file_name)
    }

    /// Path of the artifact's package manifest
    pub fn manifest_path(&self) -> PathBuf {
        self.directory.join(crate::manifest::MANIFEST_FILE)
    }
}

/// Sort descriptors by `(platform, kind, algorithm)`
pub fn sort_descriptors(descriptors: &mut [ArtifactDescriptor]) {
    descriptors.sort_by(|a, b| a.key().cmp(&b.key()));
}
