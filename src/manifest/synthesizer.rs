//! Manifest synthesis for leaf artifacts
//!
//! For each artifact this produces two documents: the package manifest
//! (`package.json`) that the registry publishes, and a metadata document
//! (`plugin.json`) describing capabilities for loaders. Both derive their
//! file lists from the same [`ArtifactFiles`], so the manifest, the metadata
//! and the registry entry always agree on what the artifact contains.

use crate::artifacts::{ArtifactDescriptor, ArtifactFiles, ArtifactKind};
use crate::core::config::PackageDefaults;
use crate::core::error::{PublishError, Result};
use crate::manifest::METADATA_FILE;
use crate::manifest::catalog::{self, AlgorithmProfile, CompressionLevels};
use crate::manifest::package_manifest::{
    self, Bugs, Engines, ExportTarget, INITIAL_VERSION, PackageManifest, PublishConfig, Repository,
    to_pretty_json, write_atomic,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// File references inside a metadata document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFiles {
    pub module: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wasm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<String>,
}

/// Capability flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub compression: bool,
    pub archiving: bool,
    pub metadata_embedding: bool,
    pub compress_inside: bool,
}

/// Per-artifact metadata document (`plugin.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDocument {
    pub name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub description: String,
    pub files: MetadataFiles,
    pub capabilities: Capabilities,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_levels: Option<CompressionLevels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    pub extensions: Vec<String>,
}

/// Documents produced for one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedPackage {
    pub manifest: PackageManifest,
    pub metadata: MetadataDocument,
}

/// Synthesizes package manifests and metadata documents
#[derive(Debug, Clone)]
pub struct ManifestSynthesizer {
    defaults: PackageDefaults,
    umbrella: String,
}

fn relative(file: &str) -> String {
    format!("./{}", file)
}

impl ManifestSynthesizer {
    pub fn new(defaults: PackageDefaults, umbrella: impl Into<String>) -> Self {
        Self {
            defaults,
            umbrella: umbrella.into(),
        }
    }

    /// Build both documents for `descriptor` at `version`
    ///
    /// Pure: the same descriptor and version always yield equal documents.
    pub fn synthesize(&self, descriptor: &ArtifactDescriptor, version: &str) -> SynthesizedPackage {
        SynthesizedPackage {
            manifest: self.package_manifest(descriptor, version),
            metadata: self.metadata_document(descriptor, version),
        }
    }

    /// Synthesize and write both documents into the artifact directory
    ///
    /// An existing manifest's version is carried over so regenerating never
    /// rolls a published version back; new manifests start at `0.1.0`.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::ArtifactRootMissing` if the artifact directory
    /// no longer exists.
    pub async fn write(&self, descriptor: &ArtifactDescriptor) -> Result<SynthesizedPackage> {
        if !descriptor.directory.is_dir() {
            return Err(PublishError::ArtifactRootMissing {
                path: descriptor.directory.clone(),
            });
        }

        let manifest_path = descriptor.manifest_path();
        let version = package_manifest::read_version(&manifest_path)
            .await?
            .unwrap_or_else(|| INITIAL_VERSION.to_string());

        let package = self.synthesize(descriptor, &version);
        package.manifest.write(&manifest_path).await?;
        write_atomic(
            &descriptor.file_path(METADATA_FILE),
            &to_pretty_json(&package.metadata)?,
        )
        .await?;

        tracing::debug!(
            package = %descriptor.package_name,
            version = %version,
            "wrote package manifest"
        );

        Ok(package)
    }

    fn package_manifest(&self, descriptor: &ArtifactDescriptor, version: &str) -> PackageManifest {
        let files = &descriptor.files;
        let defaults = &self.defaults;

        let mut file_list: Vec<String> = files.present().into_iter().map(str::to_string).collect();
        file_list.push(METADATA_FILE.to_string());

        let mut exports = BTreeMap::new();
        exports.insert(".".to_string(), export_target(files));

        PackageManifest {
            name: descriptor.package_name.clone(),
            version: version.to_string(),
            description: catalog::description(
                descriptor.kind,
                &descriptor.algorithm,
                &descriptor.platform,
            ),
            module_type: "module".to_string(),
            private: false,
            main: relative(&files.entry),
            types: files.types.as_deref().map(relative),
            files: file_list,
            exports,
            keywords: catalog::keywords(descriptor.kind, &descriptor.algorithm),
            author: defaults.author.clone(),
            license: defaults.license.clone(),
            repository: Repository {
                kind: "git".to_string(),
                url: defaults.repository.clone(),
                directory: Some(format!(
                    "{}/{}/{}/{}",
                    defaults.repository_directory,
                    descriptor.platform,
                    descriptor.kind,
                    descriptor.algorithm
                )),
            },
            bugs: Bugs {
                url: defaults.bugs.clone(),
            },
            homepage: defaults.homepage.clone(),
            publish_config: PublishConfig {
                access: "public".to_string(),
            },
            engines: Engines {
                node: defaults.node_engine.clone(),
            },
        }
    }

    fn metadata_document(
        &self,
        descriptor: &ArtifactDescriptor,
        version: &str,
    ) -> MetadataDocument {
        let kind = descriptor.kind;
        let algorithm = &descriptor.algorithm;
        let profile = AlgorithmProfile::lookup(kind, algorithm);
        let extensions = profile.extensions().to_vec();

        let (compression_levels, features) = match profile {
            AlgorithmProfile::Compression { levels, .. } => (Some(levels), None),
            AlgorithmProfile::Archive { features, .. } => (None, Some(features)),
        };
        let has_feature = |name: &str| {
            features
                .as_ref()
                .is_some_and(|f| f.iter().any(|feature| feature == name))
        };

        MetadataDocument {
            name: format!("{}-{}-{}", self.scope(), kind, algorithm),
            version: version.to_string(),
            kind,
            platform: descriptor.platform.clone(),
            algorithm: (kind == ArtifactKind::Compression).then(|| algorithm.clone()),
            format: (kind == ArtifactKind::Archive).then(|| algorithm.clone()),
            description: catalog::short_description(kind, algorithm, &descriptor.platform),
            files: MetadataFiles {
                module: relative(&descriptor.files.entry),
                wasm: descriptor.files.binary.as_deref().map(relative),
                types: descriptor.files.types.as_deref().map(relative),
            },
            capabilities: Capabilities {
                compression: kind == ArtifactKind::Compression,
                archiving: kind == ArtifactKind::Archive,
                metadata_embedding: true,
                compress_inside: has_feature(catalog::FEATURE_COMPRESS_INSIDE),
            },
            compression_levels,
            features,
            extensions,
        }
    }

    /// Scope of the umbrella name without `@`, e.g. `droply` for `@droply/plugins`
    fn scope(&self) -> &str {
        let trimmed = self.umbrella.trim_start_matches('@');
        trimmed.split('/').next().unwrap_or(trimmed)
    }
}

/// Export target for a leaf artifact's own root export
pub fn export_target(files: &ArtifactFiles) -> ExportTarget {
    ExportTarget {
        default: relative(&files.entry),
        types: files.types.as_deref().map(relative),
    }
}
