//! Shared fixtures: a temporary project, a recording registry and a scripted operator

#![allow(dead_code)]

use async_trait::async_trait;
use plugin_publisher::core::{
    DescriptorSource, OperatorPrompt, PackageRegistryClient, PromptAnswer, PublisherConfig,
};
use plugin_publisher::orchestration::PublishOrchestrator;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// One call received by [`FakeRegistry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Identity,
    CurrentVersion(String),
    VersionHistory(String),
    Publish(PathBuf),
}

/// In-memory registry that records every call
pub struct FakeRegistry {
    user: Option<String>,
    history: Option<Vec<String>>,
    published: Mutex<HashMap<String, String>>,
    failing: HashSet<String>,
    publish_duration: Duration,
    calls: Mutex<Vec<Call>>,
    publish_spans: Mutex<Vec<(Instant, Instant)>>,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self {
            user: Some("tester".to_string()),
            history: Some(Vec::new()),
            published: Mutex::new(HashMap::new()),
            failing: HashSet::new(),
            publish_duration: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            publish_spans: Mutex::new(Vec::new()),
        }
    }

    pub fn logged_out(mut self) -> Self {
        self.user = None;
        self
    }

    pub fn with_history(mut self, versions: &[&str]) -> Self {
        self.history = Some(versions.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn with_published(self, package_name: &str, version: &str) -> Self {
        self.published
            .lock()
            .unwrap()
            .insert(package_name.to_string(), version.to_string());
        self
    }

    /// Publishing the package with this name fails
    pub fn failing_on(mut self, package_name: &str) -> Self {
        self.failing.insert(package_name.to_string());
        self
    }

    /// Every publish call takes this long
    pub fn slow(mut self, duration: Duration) -> Self {
        self.publish_duration = duration;
        self
    }

    /// Start and end of every publish call, in call order
    pub fn publish_spans(&self) -> Vec<(Instant, Instant)> {
        self.publish_spans.lock().unwrap().clone()
    }

    /// Time between the end of each publish and the start of the next
    pub fn publish_gaps(&self) -> Vec<Duration> {
        self.publish_spans()
            .windows(2)
            .map(|pair| pair[1].0.duration_since(pair[0].1))
            .collect()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn publish_calls(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Publish(dir) => Some(dir),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl PackageRegistryClient for FakeRegistry {
    fn name(&self) -> &str {
        "fake"
    }

    async fn identity(&self) -> anyhow::Result<String> {
        self.record(Call::Identity);
        self.user
            .clone()
            .ok_or_else(|| anyhow::anyhow!("ENEEDAUTH: not logged in"))
    }

    async fn current_version(&self, package_name: &str) -> anyhow::Result<Option<String>> {
        self.record(Call::CurrentVersion(package_name.to_string()));
        Ok(self.published.lock().unwrap().get(package_name).cloned())
    }

    async fn version_history(&self, package_name: &str) -> anyhow::Result<Vec<String>> {
        self.record(Call::VersionHistory(package_name.to_string()));
        self.history
            .clone()
            .ok_or_else(|| anyhow::anyhow!("E404 not found"))
    }

    async fn publish(&self, package_dir: &Path) -> anyhow::Result<()> {
        let started = Instant::now();
        self.record(Call::Publish(package_dir.to_path_buf()));
        tokio::time::sleep(self.publish_duration).await;
        let result = self.finish_publish(package_dir);
        self.publish_spans
            .lock()
            .unwrap()
            .push((started, Instant::now()));
        result
    }
}

impl FakeRegistry {
    fn finish_publish(&self, package_dir: &Path) -> anyhow::Result<()> {
        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(package_dir.join("package.json"))?)?;
        let name = manifest["name"].as_str().unwrap_or_default().to_string();
        let version = manifest["version"].as_str().unwrap_or_default().to_string();

        if self.failing.contains(&name) {
            anyhow::bail!("E403 forbidden: {}", name);
        }
        self.published.lock().unwrap().insert(name, version);
        Ok(())
    }
}

/// Operator with canned answers
pub struct ScriptedPrompt {
    version: PromptAnswer,
    confirm: bool,
    confirmations: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new(version: PromptAnswer, confirm: bool) -> Self {
        Self {
            version,
            confirm,
            confirmations: Mutex::new(Vec::new()),
        }
    }

    pub fn confirming() -> Self {
        Self::new(PromptAnswer::Cancelled, true)
    }

    pub fn confirmations(&self) -> Vec<String> {
        self.confirmations.lock().unwrap().clone()
    }
}

#[async_trait]
impl OperatorPrompt for ScriptedPrompt {
    async fn ask_version(&self) -> anyhow::Result<PromptAnswer> {
        Ok(self.version.clone())
    }

    async fn confirm(&self, message: &str) -> anyhow::Result<bool> {
        self.confirmations.lock().unwrap().push(message.to_string());
        Ok(self.confirm)
    }
}

/// Temporary project with a `packages/plugins/dist` artifact tree
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn package_root(&self) -> PathBuf {
        self.path().join("packages/plugins")
    }

    pub fn dist(&self) -> PathBuf {
        self.package_root().join("dist")
    }

    /// Create an artifact with entry, types and binary files
    pub fn artifact(&self, rel: &str) -> PathBuf {
        let dir = self.dist().join(rel);
        fs::create_dir_all(&dir).unwrap();
        for file in ["index.js", "index.d.ts", "plugin.wasm"] {
            fs::write(dir.join(file), "").unwrap();
        }
        dir
    }

    pub fn manifest_version(&self, dir: &Path) -> Option<String> {
        let content = fs::read_to_string(dir.join("package.json")).ok()?;
        let value: serde_json::Value = serde_json::from_str(&content).ok()?;
        value["version"].as_str().map(str::to_string)
    }

    pub fn umbrella_version(&self) -> Option<String> {
        self.manifest_version(&self.package_root())
    }

    pub fn config(&self, source: DescriptorSource) -> PublisherConfig {
        self.config_with_delay(source, 0)
    }

    pub fn config_with_delay(&self, source: DescriptorSource, delay_ms: u64) -> PublisherConfig {
        PublisherConfig {
            source,
            publish_delay_ms: delay_ms,
            ..PublisherConfig::default()
        }
    }

    pub fn orchestrator(
        &self,
        source: DescriptorSource,
        registry: &Arc<FakeRegistry>,
        prompt: &Arc<ScriptedPrompt>,
    ) -> PublishOrchestrator {
        self.orchestrator_with(self.config(source), registry, prompt)
    }

    pub fn orchestrator_with(
        &self,
        config: PublisherConfig,
        registry: &Arc<FakeRegistry>,
        prompt: &Arc<ScriptedPrompt>,
    ) -> PublishOrchestrator {
        PublishOrchestrator::new(self.path(), config, registry.clone(), prompt.clone())
    }
}
