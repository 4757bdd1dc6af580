//! Registry builder
//!
//! One builder produces every registry-shaped output from the same
//! descriptors: the flat [`RegistryDocument`], the nested platform → kind →
//! algorithm view, and the export map of the umbrella package.

use crate::artifacts::{ArtifactDescriptor, sort_descriptors};
use crate::core::config::{PackageDefaults, UmbrellaConfig};
use crate::core::error::Result;
use crate::manifest::catalog::{self, AlgorithmProfile};
use crate::manifest::package_manifest::{
    ExportTarget, INITIAL_VERSION, read_object, to_pretty_json, write_atomic,
};
use crate::manifest::{MANIFEST_FILE, METADATA_FILE};
use crate::registry::document::{RegistryDocument, relative_to};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Output shape of [`RegistryBuilder::render`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryShape {
    /// Flat entry list, the persisted registry document
    #[default]
    Flat,
    /// Platform → kind → algorithm tree with catalog metadata
    Nested,
}

impl std::str::FromStr for RegistryShape {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "flat" => Ok(RegistryShape::Flat),
            "nested" => Ok(RegistryShape::Nested),
            other => Err(format!("unknown registry shape: {}", other)),
        }
    }
}

/// Export map of the umbrella package, keyed by subpath
pub type ExportMap = BTreeMap<String, ExportTarget>;

/// Builds registry documents and the umbrella export map
#[derive(Debug, Clone)]
pub struct RegistryBuilder {
    package_root: PathBuf,
    dist_dir: String,
    registry_file: String,
    umbrella: UmbrellaConfig,
    defaults: PackageDefaults,
}

impl RegistryBuilder {
    /// `dist_dir` is the artifact tree relative to `package_root`, as listed
    /// in the umbrella manifest's `files`
    pub fn new(
        package_root: impl Into<PathBuf>,
        dist_dir: impl Into<String>,
        registry_file: impl Into<String>,
        umbrella: UmbrellaConfig,
        defaults: PackageDefaults,
    ) -> Self {
        Self {
            package_root: package_root.into(),
            dist_dir: dist_dir.into(),
            registry_file: registry_file.into(),
            umbrella,
            defaults,
        }
    }

    /// Package root all registry paths are relative to
    pub fn package_root(&self) -> &Path {
        &self.package_root
    }

    /// Path of the persisted registry document
    pub fn registry_path(&self) -> PathBuf {
        self.package_root.join(&self.registry_file)
    }

    /// Path of the umbrella package manifest
    pub fn umbrella_manifest_path(&self) -> PathBuf {
        self.package_root.join(MANIFEST_FILE)
    }

    /// Build the flat registry document
    pub fn build(&self, descriptors: &[ArtifactDescriptor]) -> Result<RegistryDocument> {
        RegistryDocument::from_descriptors(descriptors, &self.package_root)
    }

    /// Render descriptors in the requested shape
    pub fn render(
        &self,
        descriptors: &[ArtifactDescriptor],
        shape: RegistryShape,
    ) -> Result<Value> {
        match shape {
            RegistryShape::Flat => Ok(serde_json::to_value(self.build(descriptors)?)?),
            RegistryShape::Nested => self.nested(descriptors),
        }
    }

    /// Build the nested view
    ///
    /// Every algorithm node carries the same catalog metadata the metadata
    /// documents carry.
    pub fn nested(&self, descriptors: &[ArtifactDescriptor]) -> Result<Value> {
        let document = self.build(descriptors)?;
        let mut sorted = descriptors.to_vec();
        sort_descriptors(&mut sorted);

        let mut platforms = Map::new();
        for (descriptor, entry) in sorted.iter().zip(&document.entries) {
            let mut node = Map::new();
            node.insert("packageName".into(), json!(entry.package_name));
            node.insert(
                "description".into(),
                json!(catalog::short_description(
                    descriptor.kind,
                    &descriptor.algorithm,
                    &descriptor.platform
                )),
            );

            let profile = AlgorithmProfile::lookup(descriptor.kind, &descriptor.algorithm);
            node.insert("extensions".into(), json!(profile.extensions()));
            match profile {
                AlgorithmProfile::Compression { levels, .. } => {
                    node.insert("compressionLevels".into(), json!(levels));
                }
                AlgorithmProfile::Archive { features, .. } => {
                    node.insert("features".into(), json!(features));
                }
            }

            let metadata_path =
                relative_to(&descriptor.file_path(METADATA_FILE), &self.package_root)?;
            node.insert(
                "paths".into(),
                json!({
                    "module": entry.files.entry,
                    "types": entry.files.types,
                    "wasm": entry.files.binary,
                    "metadata": metadata_path,
                }),
            );

            let kinds = platforms
                .entry(descriptor.platform.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            let algorithms = kinds
                .as_object_mut()
                .map(|k| {
                    k.entry(descriptor.kind.as_str())
                        .or_insert_with(|| Value::Object(Map::new()))
                });
            if let Some(Value::Object(algorithms)) = algorithms {
                algorithms.insert(descriptor.algorithm.clone(), Value::Object(node));
            }
        }

        Ok(json!({
            "schemaVersion": document.schema_version,
            "platforms": platforms,
            "metadata": {
                "generatedAt": document.generated_at,
                "totalPlugins": document.entries.len(),
            },
        }))
    }

    /// Build the umbrella export map
    ///
    /// Targets are `./`-prefixed paths relative to the package root.
    pub fn export_map(&self, descriptors: &[ArtifactDescriptor]) -> Result<ExportMap> {
        let document = self.build(descriptors)?;
        let dotted = |path: &str| format!("./{}", path);

        Ok(document
            .entries
            .iter()
            .map(|entry| {
                (
                    entry.subpath.clone(),
                    ExportTarget {
                        default: dotted(&entry.files.entry),
                        types: entry.files.types.as_deref().map(dotted),
                    },
                )
            })
            .collect())
    }

    /// Write the export map into the umbrella manifest
    ///
    /// Creates a base umbrella manifest if none exists. Existing fields other
    /// than `exports` and `files` are left alone.
    pub async fn update_umbrella_manifest(
        &self,
        descriptors: &[ArtifactDescriptor],
    ) -> Result<()> {
        let path = self.umbrella_manifest_path();
        let mut manifest = if path.is_file() {
            read_object(&path).await?
        } else {
            tracing::info!(path = %path.display(), "creating umbrella manifest");
            self.base_umbrella_manifest()
        };

        let exports = serde_json::to_value(self.export_map(descriptors)?)?;
        manifest.insert("exports".to_string(), exports);

        let files = manifest
            .entry("files")
            .or_insert_with(|| json!([self.dist_dir]));
        if let Value::Array(files) = files {
            if !files.iter().any(|f| f == self.registry_file.as_str()) {
                files.push(json!(self.registry_file));
            }
        }

        write_atomic(&path, &to_pretty_json(&manifest)?).await
    }

    /// Set the umbrella manifest's version and its published file list
    ///
    /// The manifest is created first if it does not exist. Returns the
    /// previous version.
    pub async fn write_umbrella_version(
        &self,
        descriptors: &[ArtifactDescriptor],
        version: &str,
    ) -> Result<Option<String>> {
        let path = self.umbrella_manifest_path();
        if !path.is_file() {
            self.update_umbrella_manifest(descriptors).await?;
        }

        let mut manifest = read_object(&path).await?;
        let old = manifest
            .insert("version".to_string(), json!(version))
            .and_then(|v| v.as_str().map(str::to_string));
        manifest.insert(
            "files".to_string(),
            json!([self.dist_dir, self.registry_file, "README.md", "LICENSE"]),
        );

        write_atomic(&path, &to_pretty_json(&manifest)?).await?;
        Ok(old)
    }

    fn base_umbrella_manifest(&self) -> Map<String, Value> {
        let defaults = &self.defaults;
        let value = json!({
            "name": self.umbrella.name,
            "version": INITIAL_VERSION,
            "description": self.umbrella.description,
            "type": "module",
            "sideEffects": false,
            "exports": {},
            "files": [self.dist_dir, self.registry_file],
            "keywords": [
                "wasm", "compression", "archive", "gzip", "brotli", "zip", "tar",
                "webassembly", "performance"
            ],
            "author": defaults.author,
            "license": defaults.license,
            "repository": {
                "type": "git",
                "url": defaults.repository,
                "directory": defaults.repository_directory,
            },
            "bugs": { "url": defaults.bugs },
            "homepage": defaults.homepage,
            "publishConfig": { "access": "public" },
            "engines": { "node": defaults.node_engine },
        });

        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{ArtifactFiles, ArtifactKind};
    use crate::manifest::ManifestSynthesizer;
    use tempfile::TempDir;

    fn descriptor(
        root: &Path,
        platform: &str,
        kind: ArtifactKind,
        algorithm: &str,
        types: bool,
    ) -> ArtifactDescriptor {
        ArtifactDescriptor::new(
            "@droply/plugins",
            platform,
            kind,
            algorithm,
            root.join("dist").join(platform).join(kind.as_str()).join(algorithm),
            ArtifactFiles {
                entry: "index.js".to_string(),
                types: types.then(|| "index.d.ts".to_string()),
                binary: Some("plugin.wasm".to_string()),
            },
        )
    }

    fn builder(root: &Path) -> RegistryBuilder {
        RegistryBuilder::new(
            root,
            "dist",
            "REGISTRY.json",
            UmbrellaConfig::default(),
            PackageDefaults::default(),
        )
    }

    fn sample(root: &Path) -> Vec<ArtifactDescriptor> {
        vec![
            descriptor(root, "web", ArtifactKind::Archive, "zip", false),
            descriptor(root, "nodejs", ArtifactKind::Compression, "gzip", true),
        ]
    }

    #[test]
    fn test_export_map() {
        let root = Path::new("/repo");
        let exports = builder(root).export_map(&sample(root)).unwrap();

        assert_eq!(
            exports["./nodejs/compression/gzip"],
            ExportTarget {
                default: "./dist/nodejs/compression/gzip/index.js".to_string(),
                types: Some("./dist/nodejs/compression/gzip/index.d.ts".to_string()),
            }
        );
        assert_eq!(exports["./web/archive/zip"].types, None);
    }

    #[test]
    fn test_nested_shape() {
        let root = Path::new("/repo");
        let nested = builder(root).nested(&sample(root)).unwrap();

        assert_eq!(nested["metadata"]["totalPlugins"], 2);

        let gzip = &nested["platforms"]["nodejs"]["compression"]["gzip"];
        assert_eq!(gzip["packageName"], "@droply/plugins-nodejs-compression-gzip");
        assert_eq!(gzip["compressionLevels"]["max"], 9);
        assert!(gzip.get("features").is_none());
        assert_eq!(gzip["paths"]["module"], "dist/nodejs/compression/gzip/index.js");

        let zip = &nested["platforms"]["web"]["archive"]["zip"];
        assert_eq!(zip["features"], json!(["metadata-embedding", "compress-inside"]));
        assert!(zip["paths"]["types"].is_null());
    }

    #[test]
    fn test_flat_and_nested_agree_on_names() {
        let root = Path::new("/repo");
        let builder = builder(root);
        let flat = builder.build(&sample(root)).unwrap();
        let nested = builder.render(&sample(root), RegistryShape::Nested).unwrap();

        for entry in &flat.entries {
            let node = &nested["platforms"][&entry.platform][entry.kind.as_str()][&entry.algorithm];
            assert_eq!(node["packageName"], entry.package_name.as_str());
            assert_eq!(node["paths"]["module"], entry.files.entry.as_str());
        }
    }

    #[test]
    fn test_registry_matches_synthesized_manifest() {
        let root = Path::new("/repo");
        let descriptors = sample(root);
        let document = builder(root).build(&descriptors).unwrap();
        let synthesizer = ManifestSynthesizer::new(PackageDefaults::default(), "@droply/plugins");

        for descriptor in &descriptors {
            let manifest = synthesizer.synthesize(descriptor, "1.0.0").manifest;
            let entry = document
                .entries
                .iter()
                .find(|e| e.package_name == manifest.name)
                .unwrap();
            let entry_file = manifest.main.trim_start_matches("./");
            assert!(entry.files.entry.ends_with(&format!("/{}", entry_file)));
            assert!(manifest.files.iter().any(|f| entry.files.entry.ends_with(f.as_str())));
        }
    }

    #[test]
    fn test_shape_parsing() {
        assert_eq!("flat".parse::<RegistryShape>(), Ok(RegistryShape::Flat));
        assert_eq!("nested".parse::<RegistryShape>(), Ok(RegistryShape::Nested));
        assert!("tree".parse::<RegistryShape>().is_err());
    }

    #[tokio::test]
    async fn test_update_creates_base_umbrella_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let builder = builder(root);

        builder.update_umbrella_manifest(&sample(root)).await.unwrap();

        let manifest = read_object(&builder.umbrella_manifest_path()).await.unwrap();
        assert_eq!(manifest["name"], "@droply/plugins");
        assert_eq!(manifest["version"], "0.1.0");
        assert_eq!(manifest["files"], json!(["dist", "REGISTRY.json"]));
        assert_eq!(
            manifest["exports"]["./web/archive/zip"]["default"],
            "./dist/web/archive/zip/index.js"
        );
    }

    #[tokio::test]
    async fn test_update_preserves_existing_fields() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::write(
            root.join("package.json"),
            r#"{"name":"@droply/plugins","version":"2.0.3","files":["dist","README.md"],"scripts":{"pack":"npm pack"}}"#,
        )
        .unwrap();
        let builder = builder(root);

        builder.update_umbrella_manifest(&sample(root)).await.unwrap();

        let manifest = read_object(&builder.umbrella_manifest_path()).await.unwrap();
        assert_eq!(manifest["version"], "2.0.3");
        assert_eq!(manifest["scripts"]["pack"], "npm pack");
        assert_eq!(manifest["files"], json!(["dist", "README.md", "REGISTRY.json"]));
        assert_eq!(manifest["exports"].as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_write_umbrella_version() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let builder = builder(root);

        let old = builder
            .write_umbrella_version(&sample(root), "2.0.4")
            .await
            .unwrap();

        assert_eq!(old.as_deref(), Some("0.1.0"));
        let manifest = read_object(&builder.umbrella_manifest_path()).await.unwrap();
        assert_eq!(manifest["version"], "2.0.4");
        assert_eq!(
            manifest["files"],
            json!(["dist", "REGISTRY.json", "README.md", "LICENSE"])
        );
        assert_eq!(manifest["exports"].as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_configured_dist_dir_in_umbrella_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let builder = RegistryBuilder::new(
            root,
            "build",
            "REGISTRY.json",
            UmbrellaConfig::default(),
            PackageDefaults::default(),
        );

        builder.update_umbrella_manifest(&[]).await.unwrap();
        let manifest = read_object(&builder.umbrella_manifest_path()).await.unwrap();
        assert_eq!(manifest["files"], json!(["build", "REGISTRY.json"]));

        builder.write_umbrella_version(&[], "1.0.0").await.unwrap();
        let manifest = read_object(&builder.umbrella_manifest_path()).await.unwrap();
        assert_eq!(
            manifest["files"],
            json!(["build", "REGISTRY.json", "README.md", "LICENSE"])
        );
    }
}
