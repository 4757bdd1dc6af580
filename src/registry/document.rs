//! Persisted registry document (`REGISTRY.json`)
//!
//! The document is the canonical, regenerable listing of every artifact. All
//! file paths are relative to the package root and use `/` separators, so the
//! document is portable between machines.

use crate::artifacts::{ArtifactDescriptor, ArtifactFiles, ArtifactKind, sort_descriptors};
use crate::core::error::{PublishError, Result};
use crate::manifest::package_manifest::{to_pretty_json, write_atomic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Current registry document schema
pub const SCHEMA_VERSION: u32 = 1;

/// File locations of one entry, relative to the package root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFiles {
    pub entry: String,
    pub types: Option<String>,
    pub binary: Option<String>,
}

/// One artifact record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub platform: String,
    pub kind: ArtifactKind,
    pub algorithm: String,
    pub subpath: String,
    pub package_name: String,
    pub files: EntryFiles,
}

/// Flat registry document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryDocument {
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<RegistryEntry>,
}

/// Path of `path` relative to `root`, with `/` separators
pub fn relative_to(path: &Path, root: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| PublishError::PathOutsideRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })?;

    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

/// Resolve a document path against `root`, rejecting paths that escape it
fn resolve_in(root: &Path, relative: &str) -> Result<PathBuf> {
    let candidate = Path::new(relative);
    let escapes = candidate
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(PublishError::PathOutsideRoot {
            path: candidate.to_path_buf(),
            root: root.to_path_buf(),
        });
    }
    Ok(root.join(candidate))
}

fn file_name(relative: &str) -> String {
    relative.rsplit('/').next().unwrap_or(relative).to_string()
}

impl RegistryEntry {
    /// Build an entry for a descriptor
    pub fn from_descriptor(descriptor: &ArtifactDescriptor, package_root: &Path) -> Result<Self> {
        let located = |name: &str| relative_to(&descriptor.file_path(name), package_root);

        Ok(Self {
            platform: descriptor.platform.clone(),
            kind: descriptor.kind,
            algorithm: descriptor.algorithm.clone(),
            subpath: descriptor.subpath(),
            package_name: descriptor.package_name.clone(),
            files: EntryFiles {
                entry: located(&descriptor.files.entry)?,
                types: descriptor.files.types.as_deref().map(located).transpose()?,
                binary: descriptor.files.binary.as_deref().map(located).transpose()?,
            },
        })
    }

    /// Convert back into a descriptor rooted at `package_root`
    pub fn to_descriptor(&self, package_root: &Path, umbrella: &str) -> Result<ArtifactDescriptor> {
        let entry_path = resolve_in(package_root, &self.files.entry)?;
        let directory = entry_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| package_root.to_path_buf());

        let files = ArtifactFiles {
            entry: file_name(&self.files.entry),
            types: self.files.types.as_deref().map(file_name),
            binary: self.files.binary.as_deref().map(file_name),
        };

        let descriptor = ArtifactDescriptor::new(
            umbrella,
            &self.platform,
            self.kind,
            &self.algorithm,
            directory,
            files,
        );
        if descriptor.package_name != self.package_name {
            tracing::warn!(
                recorded = %self.package_name,
                derived = %descriptor.package_name,
                "registry entry has a stale package name; regenerate the registry"
            );
        }
        Ok(descriptor)
    }
}

impl RegistryDocument {
    /// Build a document from descriptors; entries are sorted by identity key
    pub fn from_descriptors(
        descriptors: &[ArtifactDescriptor],
        package_root: &Path,
    ) -> Result<Self> {
        let mut sorted = descriptors.to_vec();
        sort_descriptors(&mut sorted);

        let entries = sorted
            .iter()
            .map(|d| RegistryEntry::from_descriptor(d, package_root))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            entries,
        })
    }

    /// Convert every entry back into a descriptor
    pub fn to_descriptors(
        &self,
        package_root: &Path,
        umbrella: &str,
    ) -> Result<Vec<ArtifactDescriptor>> {
        self.entries
            .iter()
            .map(|e| e.to_descriptor(package_root, umbrella))
            .collect()
    }

    /// Load a document from disk
    ///
    /// # Errors
    ///
    /// Returns `PublishError::RegistryDocumentMissing` if `path` does not
    /// exist, and `PublishError::ManifestInvalid` if it cannot be parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PublishError::RegistryDocumentMissing {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).await?;
        let document: Self =
            serde_json::from_str(&content).map_err(|e| PublishError::ManifestInvalid {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if document.schema_version != SCHEMA_VERSION {
            tracing::warn!(
                path = %path.display(),
                found = document.schema_version,
                expected = SCHEMA_VERSION,
                "unexpected registry schema version"
            );
        }

        Ok(document)
    }

    /// Write the document to disk
    pub async fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, &to_pretty_json(self)?).await
    }

    /// Write the document unless the file on disk already lists the same entries
    ///
    /// When the entries are unchanged the previous `generatedAt` is kept and
    /// nothing is written, so regenerating from an unchanged tree leaves the
    /// file byte-identical. Returns whether the file was written.
    pub async fn write_if_changed(&mut self, path: &Path) -> Result<bool> {
        if path.is_file() {
            match Self::load(path).await {
                Ok(existing) if existing.entries == self.entries => {
                    self.generated_at = existing.generated_at;
                    tracing::debug!(path = %path.display(), "registry document unchanged");
                    return Ok(false);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "replacing unreadable registry document"
                    );
                }
            }
        }

        self.save(path).await?;
        Ok(true)
    }
}
