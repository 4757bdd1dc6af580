//! Configuration file loader for plugin-publisher
//!
//! This module provides configuration loading, merging and `${VAR}` expansion.
//!
//! Priority (high to low):
//! 1. CLI overrides
//! 2. Environment variables (`PLUGIN_PUBLISHER_*`)
//! 3. Project config (`./.plugin-publisher.yaml`, following `extends`)
//! 4. Default values

use super::config::{DescriptorSource, PublisherConfig};
use crate::core::error::{PublishError, Result};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Configuration file name
pub const CONFIG_FILENAME: &str = ".plugin-publisher.yaml";

/// Environment variable pattern (${VAR_NAME})
const ENV_VAR_PATTERN: &str = r"\$\{([A-Z_][A-Z0-9_]*)\}";

/// Maximum depth of an `extends` chain
const MAX_EXTENDS_DEPTH: usize = 8;

/// Values set on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source: Option<DescriptorSource>,
    pub publish_delay_ms: Option<u64>,
}

/// Configuration load options
#[derive(Debug, Clone)]
pub struct ConfigLoadOptions {
    /// Project path to load config from
    pub project_path: PathBuf,

    /// CLI overrides (highest priority)
    pub overrides: ConfigOverrides,

    /// Environment variables
    pub env: HashMap<String, String>,
}

impl ConfigLoadOptions {
    /// Options for a project, reading the process environment
    pub fn for_project<P: Into<PathBuf>>(project_path: P) -> Self {
        Self {
            project_path: project_path.into(),
            overrides: ConfigOverrides::default(),
            env: std::env::vars().collect(),
        }
    }
}

/// Configuration file loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources
    pub async fn load(options: ConfigLoadOptions) -> Result<PublisherConfig> {
        let mut merged = serde_yaml::to_value(PublisherConfig::default())
            .map_err(|e| PublishError::ConfigError(e.to_string()))?;

        let project_file = options.project_path.join(CONFIG_FILENAME);
        for layer in Self::load_file_chain(&project_file).await? {
            Self::merge_value(&mut merged, layer);
        }

        Self::merge_value(&mut merged, Self::env_layer(&options.env)?);

        let env_var_regex =
            Regex::new(ENV_VAR_PATTERN).map_err(|e| PublishError::ConfigError(e.to_string()))?;
        Self::expand_value(&mut merged, &env_var_regex, &options.env)?;

        let mut config: PublisherConfig = serde_yaml::from_value(merged)
            .map_err(|e| PublishError::ConfigError(format!("invalid configuration: {}", e)))?;

        if let Some(source) = options.overrides.source {
            config.source = source;
        }
        if let Some(delay) = options.overrides.publish_delay_ms {
            config.publish_delay_ms = delay;
        }

        tracing::debug!(
            package_root = %config.package_root.display(),
            source = ?config.source,
            "configuration loaded"
        );

        Ok(config)
    }

    /// Read a config file and every file it extends, base first
    async fn load_file_chain(file_path: &Path) -> Result<Vec<Value>> {
        let mut layers = Vec::new();
        let mut next = Some(file_path.to_path_buf());

        while let Some(path) = next.take() {
            if layers.len() >= MAX_EXTENDS_DEPTH {
                return Err(PublishError::ConfigError(format!(
                    "extends chain deeper than {} at {}",
                    MAX_EXTENDS_DEPTH,
                    path.display()
                )));
            }
            if !path.exists() {
                if layers.is_empty() {
                    break;
                }
                return Err(PublishError::ConfigError(format!(
                    "extended config not found: {}",
                    path.display()
                )));
            }

            let content = fs::read_to_string(&path).await.map_err(|e| {
                PublishError::ConfigError(format!("failed to read {}: {}", path.display(), e))
            })?;
            let value: Value = serde_yaml::from_str(&content).map_err(|e| {
                PublishError::ConfigError(format!("failed to parse {}: {}", path.display(), e))
            })?;

            if let Some(extends) = value.get("extends").and_then(Value::as_str) {
                let base = path.parent().unwrap_or_else(|| Path::new(".")).join(extends);
                next = Some(base);
            }
            layers.push(value);
        }

        layers.reverse();
        Ok(layers)
    }

    /// Build a config layer from `PLUGIN_PUBLISHER_*` variables
    fn env_layer(env: &HashMap<String, String>) -> Result<Value> {
        let mut layer = Mapping::new();

        if let Some(root) = env.get("PLUGIN_PUBLISHER_PACKAGE_ROOT") {
            layer.insert("packageRoot".into(), root.as_str().into());
        }

        if let Some(source) = env.get("PLUGIN_PUBLISHER_SOURCE") {
            match source.as_str() {
                "registry" | "scan" => {
                    layer.insert("source".into(), source.as_str().into());
                }
                other => {
                    return Err(PublishError::ConfigError(format!(
                        "PLUGIN_PUBLISHER_SOURCE must be registry or scan, got {}",
                        other
                    )));
                }
            }
        }

        if let Some(delay) = env.get("PLUGIN_PUBLISHER_DELAY_MS") {
            let delay: u64 = delay.parse().map_err(|_| {
                PublishError::ConfigError(format!(
                    "PLUGIN_PUBLISHER_DELAY_MS must be an integer, got {}",
                    delay
                ))
            })?;
            layer.insert("publishDelayMs".into(), delay.into());
        }

        if let Some(name) = env.get("PLUGIN_PUBLISHER_UMBRELLA") {
            let mut umbrella = Mapping::new();
            umbrella.insert("name".into(), name.as_str().into());
            layer.insert("umbrella".into(), Value::Mapping(umbrella));
        }

        Ok(Value::Mapping(layer))
    }

    /// Deep-merge `source` into `target`; mappings merge, everything else replaces
    fn merge_value(target: &mut Value, source: Value) {
        match (target, source) {
            (Value::Mapping(target_map), Value::Mapping(source_map)) => {
                for (key, value) in source_map {
                    match target_map.get_mut(&key) {
                        Some(existing) => Self::merge_value(existing, value),
                        None => {
                            target_map.insert(key, value);
                        }
                    }
                }
            }
            (_, Value::Null) => {}
            (target, source) => *target = source,
        }
    }

    /// Expand `${VAR}` references in every string value
    fn expand_value(value: &mut Value, regex: &Regex, env: &HashMap<String, String>) -> Result<()> {
        match value {
            Value::String(s) => {
                *s = Self::expand_string(s, regex, env)?;
            }
            Value::Mapping(map) => {
                for (_, v) in map.iter_mut() {
                    Self::expand_value(v, regex, env)?;
                }
            }
            Value::Sequence(seq) => {
                for v in seq.iter_mut() {
                    Self::expand_value(v, regex, env)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Expand environment variables in a single string
    fn expand_string(input: &str, regex: &Regex, env: &HashMap<String, String>) -> Result<String> {
        let mut result = String::with_capacity(input.len());
        let mut last = 0;

        for cap in regex.captures_iter(input) {
            let Some(whole) = cap.get(0) else { continue };
            let var_name = &cap[1];
            let value = env.get(var_name).ok_or_else(|| {
                PublishError::ConfigError(format!("environment variable {} is not set", var_name))
            })?;
            result.push_str(&input[last..whole.start()]);
            result.push_str(value);
            last = whole.end();
        }

        result.push_str(&input[last..]);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options(dir: &Path, env: &[(&str, &str)]) -> ConfigLoadOptions {
        ConfigLoadOptions {
            project_path: dir.to_path_buf(),
            overrides: ConfigOverrides::default(),
            env: env
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_load_defaults_without_file() {
        let temp_dir = TempDir::new().unwrap();

        let config = ConfigLoader::load(options(temp_dir.path(), &[])).await.unwrap();

        assert_eq!(config, PublisherConfig::default());
    }

    #[tokio::test]
    async fn test_project_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            "packageRoot: plugins\npublishDelayMs: 0\nlayout:\n  entryFile: module.js\n",
        )
        .unwrap();

        let config = ConfigLoader::load(options(temp_dir.path(), &[])).await.unwrap();

        assert_eq!(config.package_root, PathBuf::from("plugins"));
        assert_eq!(config.publish_delay_ms, 0);
        assert_eq!(config.layout.entry_file, "module.js");
        assert_eq!(config.layout.types_file, "index.d.ts");
    }

    #[tokio::test]
    async fn test_extends_base_file() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("base.yaml"),
            "umbrella:\n  name: \"@acme/codecs\"\npublishDelayMs: 10\n",
        )
        .unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            "extends: base.yaml\npublishDelayMs: 20\n",
        )
        .unwrap();

        let config = ConfigLoader::load(options(temp_dir.path(), &[])).await.unwrap();

        assert_eq!(config.umbrella.name, "@acme/codecs");
        assert_eq!(config.publish_delay_ms, 20);
    }

    #[tokio::test]
    async fn test_env_overrides_file_and_cli_overrides_env() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(CONFIG_FILENAME), "source: registry\n").unwrap();

        let mut opts = options(
            temp_dir.path(),
            &[
                ("PLUGIN_PUBLISHER_SOURCE", "scan"),
                ("PLUGIN_PUBLISHER_DELAY_MS", "5"),
            ],
        );
        opts.overrides.publish_delay_ms = Some(0);

        let config = ConfigLoader::load(opts).await.unwrap();

        assert_eq!(config.source, DescriptorSource::Scan);
        assert_eq!(config.publish_delay_ms, 0);
    }

    #[tokio::test]
    async fn test_invalid_env_source_is_rejected() {
        let temp_dir = TempDir::new().unwrap();

        let result =
            ConfigLoader::load(options(temp_dir.path(), &[("PLUGIN_PUBLISHER_SOURCE", "ftp")]))
                .await;

        assert!(matches!(result, Err(PublishError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_expands_env_references() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            "package:\n  author: \"${RELEASE_AUTHOR} <ops>\"\n",
        )
        .unwrap();

        let config = ConfigLoader::load(options(temp_dir.path(), &[("RELEASE_AUTHOR", "Zam")]))
            .await
            .unwrap();

        assert_eq!(config.package.author, "Zam <ops>");
    }

    #[tokio::test]
    async fn test_unknown_env_reference_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(CONFIG_FILENAME),
            "package:\n  author: \"${NOT_SET_ANYWHERE}\"\n",
        )
        .unwrap();

        let result = ConfigLoader::load(options(temp_dir.path(), &[])).await;

        assert!(matches!(
            result,
            Err(PublishError::ConfigError(msg)) if msg.contains("NOT_SET_ANYWHERE")
        ));
    }
}
