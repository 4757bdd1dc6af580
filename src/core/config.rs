//! Configuration structures and types for plugin-publisher
//!
//! This module provides type-safe configuration management with serde support.
//! Every field has a default so an empty `.plugin-publisher.yaml` is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PublisherConfig {
    /// Extend from base configuration file (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,

    /// Directory holding the umbrella manifest and registry document,
    /// relative to the project root
    pub package_root: PathBuf,

    /// Artifact tree, relative to `package_root`
    pub dist_dir: PathBuf,

    /// Registry document file name, relative to `package_root`
    pub registry_file: String,

    /// Where a publish run reads its descriptors from
    pub source: DescriptorSource,

    /// Delay between live publish attempts, in milliseconds
    pub publish_delay_ms: u64,

    /// Kill registry commands running longer than this (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_timeout_secs: Option<u64>,

    /// Umbrella package settings
    pub umbrella: UmbrellaConfig,

    /// File names looked up in each artifact directory
    pub layout: ArtifactLayout,

    /// Values copied into every synthesized manifest
    pub package: PackageDefaults,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            extends: None,
            package_root: PathBuf::from("packages/plugins"),
            dist_dir: PathBuf::from("dist"),
            registry_file: "REGISTRY.json".to_string(),
            source: DescriptorSource::Registry,
            publish_delay_ms: 2000,
            command_timeout_secs: None,
            umbrella: UmbrellaConfig::default(),
            layout: ArtifactLayout::default(),
            package: PackageDefaults::default(),
        }
    }
}

impl PublisherConfig {
    /// Absolute package root for a project
    pub fn package_root_in(&self, project_path: &Path) -> PathBuf {
        project_path.join(&self.package_root)
    }

    /// Absolute artifact tree root for a project
    pub fn dist_root_in(&self, project_path: &Path) -> PathBuf {
        self.package_root_in(project_path).join(&self.dist_dir)
    }

    /// Absolute registry document path for a project
    pub fn registry_path_in(&self, project_path: &Path) -> PathBuf {
        self.package_root_in(project_path).join(&self.registry_file)
    }
}

/// Descriptor source for publish runs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorSource {
    /// Read the persisted registry document
    #[default]
    Registry,
    /// Re-scan the artifact tree
    Scan,
}

/// Umbrella package configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct UmbrellaConfig {
    /// Umbrella package name; leaf names are derived from it
    pub name: String,

    /// Description used when the umbrella manifest has to be created
    pub description: String,
}

impl Default for UmbrellaConfig {
    fn default() -> Self {
        Self {
            name: "@droply/plugins".to_string(),
            description:
                "High-performance WASM compression and archive plugins for Node.js and browsers"
                    .to_string(),
        }
    }
}

/// Artifact file names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ArtifactLayout {
    /// Entry module; an artifact exists only if this file exists
    pub entry_file: String,

    /// Optional type declarations
    pub types_file: String,

    /// Optional compiled binary
    pub binary_file: String,
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self {
            entry_file: "index.js".to_string(),
            types_file: "index.d.ts".to_string(),
            binary_file: "plugin.wasm".to_string(),
        }
    }
}

/// Package metadata defaults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageDefaults {
    pub author: String,
    pub license: String,
    /// Git repository URL
    pub repository: String,
    /// Repository sub-directory of the package root
    pub repository_directory: String,
    pub homepage: String,
    pub bugs: String,
    /// Supported Node.js range (`engines.node`)
    pub node_engine: String,
}

impl Default for PackageDefaults {
    fn default() -> Self {
        Self {
            author: "ZamDev".to_string(),
            license: "MIT".to_string(),
            repository: "https://github.com/zamdevio/droply.git".to_string(),
            repository_directory: "wasm/packages/plugins".to_string(),
            homepage: "https://github.com/zamdevio/droply#readme".to_string(),
            bugs: "https://github.com/zamdevio/droply/issues".to_string(),
            node_engine: ">=18.0.0".to_string(),
        }
    }
}
