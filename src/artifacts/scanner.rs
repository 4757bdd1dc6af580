//! Artifact scanner for discovering built plugins.
//!
//! The artifact tree structure is:
//! ```text
//! {root}/{platform}/{kind}/{algorithm}/{entry file}
//! ```
//!
//! A directory without its entry file is not an artifact. Kind directories
//! other than `compression` and `archive` are ignored.

use crate::artifacts::descriptor::{
    ArtifactDescriptor, ArtifactFiles, ArtifactKind, sort_descriptors,
};
use crate::core::config::ArtifactLayout;
use crate::core::error::{PublishError, Result};
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

/// Depth of algorithm directories below the root
const ALGORITHM_DEPTH: usize = 3;

/// Depth of kind directories below the root
const KIND_DEPTH: usize = 2;

/// Walks an artifact tree and produces descriptors
#[derive(Debug, Clone)]
pub struct ArtifactScanner {
    layout: ArtifactLayout,
    umbrella: String,
}

impl ArtifactScanner {
    /// Create a scanner for the given file layout and umbrella package name
    pub fn new(layout: ArtifactLayout, umbrella: impl Into<String>) -> Self {
        Self {
            layout,
            umbrella: umbrella.into(),
        }
    }

    /// Scan the tree rooted at `root`
    ///
    /// The result is sorted by `(platform, kind, algorithm)`. Scanning never
    /// writes to disk.
    ///
    /// # Errors
    ///
    /// Returns `PublishError::ArtifactRootMissing` if `root` is not a
    /// directory, and `PublishError::Io` if the tree cannot be read.
    pub fn scan(&self, root: &Path) -> Result<Vec<ArtifactDescriptor>> {
        if !root.is_dir() {
            return Err(PublishError::ArtifactRootMissing {
                path: root.to_path_buf(),
            });
        }

        let mut descriptors = Vec::new();

        let walker = WalkDir::new(root)
            .min_depth(ALGORITHM_DEPTH)
            .max_depth(ALGORITHM_DEPTH)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(Self::is_candidate);

        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            if let Some(descriptor) = self.describe(root, &entry) {
                descriptors.push(descriptor);
            }
        }

        sort_descriptors(&mut descriptors);

        tracing::debug!(
            root = %root.display(),
            artifacts = descriptors.len(),
            "artifact scan finished"
        );

        Ok(descriptors)
    }

    /// Prune files and unknown kind directories before descending
    fn is_candidate(entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        if entry.depth() != KIND_DEPTH {
            return true;
        }

        let known = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.parse::<ArtifactKind>().is_ok());
        if !known {
            tracing::debug!(path = %entry.path().display(), "ignoring unknown kind directory");
        }
        known
    }

    /// Build a descriptor for an algorithm directory, if it holds an artifact
    fn describe(&self, root: &Path, entry: &DirEntry) -> Option<ArtifactDescriptor> {
        let directory = entry.path();
        let relative = directory.strip_prefix(root).ok()?;
        let mut parts = relative.iter().map(|p| p.to_str());

        let (Some(Some(platform)), Some(Some(kind)), Some(Some(algorithm))) =
            (parts.next(), parts.next(), parts.next())
        else {
            tracing::warn!(path = %directory.display(), "skipping non UTF-8 artifact path");
            return None;
        };
        let kind = kind.parse::<ArtifactKind>().ok()?;

        if !directory.join(&self.layout.entry_file).is_file() {
            tracing::debug!(path = %directory.display(), "no entry file, not an artifact");
            return None;
        }

        let optional = |name: &str| {
            directory
                .join(name)
                .is_file()
                .then(|| name.to_string())
        };

        let files = ArtifactFiles {
            entry: self.layout.entry_file.clone(),
            types: optional(&self.layout.types_file),
            binary: optional(&self.layout.binary_file),
        };

        Some(ArtifactDescriptor::new(
            &self.umbrella,
            platform,
            kind,
            algorithm,
            directory,
            files,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn scanner() -> ArtifactScanner {
        ArtifactScanner::new(ArtifactLayout::default(), "@droply/plugins")
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let result = scanner().scan(&temp_dir.path().join("dist"));

        assert!(matches!(result, Err(PublishError::ArtifactRootMissing { .. })));
    }

    #[test]
    fn test_empty_root_yields_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let descriptors = scanner().scan(temp_dir.path()).unwrap();

        assert!(descriptors.is_empty());
    }

    #[test]
    fn test_scan_finds_artifacts_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "web/compression/gzip/index.js");
        touch(root, "nodejs/compression/gzip/index.js");
        touch(root, "nodejs/archive/tar/index.js");
        touch(root, "bundler/compression/brotli/index.js");

        let descriptors = scanner().scan(root).unwrap();
        let keys: Vec<_> = descriptors.iter().map(|d| d.key()).collect();

        assert_eq!(
            keys,
            vec![
                ("bundler", "compression", "brotli"),
                ("nodejs", "archive", "tar"),
                ("nodejs", "compression", "gzip"),
                ("web", "compression", "gzip"),
            ]
        );
    }

    #[test]
    fn test_directory_without_entry_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "nodejs/compression/gzip/index.d.ts");
        touch(root, "nodejs/compression/brotli/index.js");

        let descriptors = scanner().scan(root).unwrap();

        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].algorithm, "brotli");
    }

    #[test]
    fn test_optional_files_recorded_when_present() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "nodejs/compression/gzip/index.js");
        touch(root, "nodejs/compression/gzip/index.d.ts");
        touch(root, "nodejs/compression/gzip/plugin.wasm");
        touch(root, "web/archive/tar/index.js");

        let descriptors = scanner().scan(root).unwrap();

        let gzip = &descriptors[0];
        assert_eq!(gzip.files.types.as_deref(), Some("index.d.ts"));
        assert_eq!(gzip.files.binary.as_deref(), Some("plugin.wasm"));

        let tar = &descriptors[1];
        assert_eq!(tar.files.types, None);
        assert_eq!(tar.files.binary, None);
    }

    #[test]
    fn test_unknown_kinds_and_stray_files_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "nodejs/encryption/aes/index.js");
        touch(root, "nodejs/compression/README.md");
        touch(root, "nodejs/compression/gzip/index.js");
        touch(root, "README.md");

        let descriptors = scanner().scan(root).unwrap();

        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].package_name, "@droply/plugins-nodejs-compression-gzip");
    }

    #[test]
    fn test_scan_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "nodejs/compression/gzip/index.js");
        touch(root, "web/archive/zip/index.js");

        let first = scanner().scan(root).unwrap();
        let second = scanner().scan(root).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_layout() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(root, "nodejs/compression/gzip/module.js");
        touch(root, "nodejs/compression/gzip/module_bg.wasm");

        let layout = ArtifactLayout {
            entry_file: "module.js".to_string(),
            types_file: "module.d.ts".to_string(),
            binary_file: "module_bg.wasm".to_string(),
        };
        let descriptors = ArtifactScanner::new(layout, "@droply/plugins").scan(root).unwrap();

        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].files.entry, "module.js");
        assert_eq!(descriptors[0].files.binary.as_deref(), Some("module_bg.wasm"));
    }
}
