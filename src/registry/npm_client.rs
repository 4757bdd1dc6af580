//! npm implementation of [`PackageRegistryClient`]
//!
//! Every call shells out to the `npm` CLI through [`SafeCommandExecutor`],
//! which takes care of the allow-list and the timeout.

use crate::core::traits::PackageRegistryClient;
use crate::security::SafeCommandExecutor;
use async_trait::async_trait;
use std::path::Path;
use std::process::Output;

/// Registry client backed by the npm CLI
#[derive(Debug, Clone)]
pub struct NpmRegistryClient {
    executor: SafeCommandExecutor,
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

/// Parse `npm view <pkg> versions --json`
///
/// npm prints a bare string instead of an array when exactly one version is
/// published.
fn parse_versions(raw: &str) -> anyhow::Result<Vec<String>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<serde_json::Value>(raw)? {
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()),
        serde_json::Value::String(single) => Ok(vec![single]),
        other => anyhow::bail!("unexpected version list from npm: {}", other),
    }
}

impl NpmRegistryClient {
    pub fn new(executor: SafeCommandExecutor) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl PackageRegistryClient for NpmRegistryClient {
    fn name(&self) -> &str {
        "npm"
    }

    async fn identity(&self) -> anyhow::Result<String> {
        let output = self.executor.execute("npm", &["whoami"]).await?;
        if !output.status.success() {
            anyhow::bail!("npm whoami failed: {}", stderr_of(&output));
        }

        let user = stdout_of(&output);
        if user.is_empty() {
            anyhow::bail!("npm whoami returned no user");
        }
        Ok(user)
    }

    async fn current_version(&self, package_name: &str) -> anyhow::Result<Option<String>> {
        let output = self
            .executor
            .execute("npm", &["view", package_name, "version"])
            .await?;

        // E404 and friends: treat as never published
        if !output.status.success() {
            tracing::debug!(
                package = %package_name,
                stderr = %stderr_of(&output),
                "package not found"
            );
            return Ok(None);
        }

        let version = stdout_of(&output);
        Ok((!version.is_empty()).then_some(version))
    }

    async fn version_history(&self, package_name: &str) -> anyhow::Result<Vec<String>> {
        let output = self
            .executor
            .execute("npm", &["view", package_name, "versions", "--json"])
            .await?;

        if !output.status.success() {
            anyhow::bail!(
                "npm view {} versions failed: {}",
                package_name,
                stderr_of(&output)
            );
        }

        parse_versions(&stdout_of(&output))
    }

    async fn publish(&self, package_dir: &Path) -> anyhow::Result<()> {
        let output = self
            .executor
            .execute_in(package_dir, "npm", &["publish"])
            .await?;

        if !output.status.success() {
            anyhow::bail!("{}", stderr_of(&output));
        }
        Ok(())
    }
}
