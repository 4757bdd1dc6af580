//! Package manifest (`package.json`) model and on-disk operations
//!
//! Synthesis produces a typed [`PackageManifest`]. Version writes operate on
//! the raw JSON object instead, so fields added by hand or by other tools
//! survive a publish run.

use crate::core::error::{PublishError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

/// Version given to freshly synthesized manifests
pub const INITIAL_VERSION: &str = "0.1.0";

/// One conditional export target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTarget {
    pub default: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<String>,
}

/// Repository reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
}

/// Issue tracker reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bugs {
    pub url: String,
}

/// Publish settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishConfig {
    pub access: String,
}

/// Runtime requirements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engines {
    pub node: String,
}

/// Package manifest of a leaf artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    pub name: String,
    pub version: String,
    pub description: String,
    #[serde(rename = "type")]
    pub module_type: String,
    pub private: bool,
    pub main: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub types: Option<String>,
    pub files: Vec<String>,
    pub exports: BTreeMap<String, ExportTarget>,
    pub keywords: Vec<String>,
    pub author: String,
    pub license: String,
    pub repository: Repository,
    pub bugs: Bugs,
    pub homepage: String,
    pub publish_config: PublishConfig,
    pub engines: Engines,
}

/// Serialize a JSON document the way npm writes them
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}

/// Write a file atomically: write to a temp file, then rename
pub async fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let temp_file = path.with_extension("json.tmp");
    fs::write(&temp_file, content).await?;
    fs::rename(&temp_file, path).await?;
    Ok(())
}

/// Read a JSON object from disk
pub async fn read_object(path: &Path) -> Result<serde_json::Map<String, Value>> {
    let content = fs::read_to_string(path).await?;
    let value: Value = serde_json::from_str(&content).map_err(|e| PublishError::ManifestInvalid {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(PublishError::ManifestInvalid {
            path: path.to_path_buf(),
            message: "expected a JSON object".to_string(),
        }),
    }
}

/// Read the `version` field of a manifest, if the file and field exist
pub async fn read_version(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let map = read_object(path).await?;
    Ok(map.get("version").and_then(Value::as_str).map(str::to_string))
}

/// Overwrite the `version` field of an existing manifest
///
/// Returns the previous version, if there was one. Every other field is
/// kept as-is, in its original order.
pub async fn write_version(path: &Path, version: &str) -> Result<Option<String>> {
    let mut map = read_object(path).await?;
    let old = map
        .insert("version".to_string(), Value::String(version.to_string()))
        .and_then(|v| v.as_str().map(str::to_string));

    write_atomic(path, &to_pretty_json(&map)?).await?;
    Ok(old)
}

impl PackageManifest {
    /// Write the manifest to `path`
    pub async fn write(&self, path: &Path) -> Result<()> {
        write_atomic(path, &to_pretty_json(self)?).await
    }

    /// Load a manifest from `path`
    pub async fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        serde_json::from_str(&content).map_err(|e| PublishError::ManifestInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_version_preserves_other_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("package.json");
        std::fs::write(
            &path,
            r#"{"name":"@droply/plugins-web-archive-tar","version":"0.1.0","custom":{"keep":true}}"#,
        )
        .unwrap();

        let old = write_version(&path, "2.0.4").await.unwrap();

        assert_eq!(old.as_deref(), Some("0.1.0"));
        let map = read_object(&path).await.unwrap();
        assert_eq!(map["version"], "2.0.4");
        assert_eq!(map["custom"]["keep"], true);
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["name", "version", "custom"]);
    }

    #[tokio::test]
    async fn test_write_version_adds_missing_field() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("package.json");
        std::fs::write(&path, r#"{"name":"x"}"#).unwrap();

        let old = write_version(&path, "1.0.0").await.unwrap();

        assert_eq!(old, None);
        assert_eq!(read_version(&path).await.unwrap().as_deref(), Some("1.0.0"));
    }

    #[tokio::test]
    async fn test_read_version_of_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let version = read_version(&temp_dir.path().join("package.json"))
            .await
            .unwrap();

        assert_eq!(version, None);
    }

    #[tokio::test]
    async fn test_non_object_manifest_is_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("package.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let result = write_version(&path, "1.0.0").await;

        assert!(matches!(result, Err(PublishError::ManifestInvalid { .. })));
    }

    #[tokio::test]
    async fn test_no_temp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("package.json");
        std::fs::write(&path, r#"{"version":"0.1.0"}"#).unwrap();

        write_version(&path, "0.2.0").await.unwrap();

        assert!(!temp_dir.path().join("package.json.tmp").exists());
    }
}
