//! Publish Orchestrator - drives one publish run end to end
//!
//! A run goes through these stages:
//! - identity check against the remote registry
//! - descriptor discovery (registry document or a fresh scan) and filtering
//! - version resolution and operator confirmation
//! - version write into every selected manifest and the umbrella manifest
//! - sequential, idempotent, rate-limited publishing of leaves, then the umbrella
//!
//! Everything before the version write can abort the run without touching
//! disk. After it, failures are recorded in the [`PublishResult`] and the run
//! always completes.

use crate::artifacts::{ArtifactDescriptor, ArtifactScanner};
use crate::core::config::{DescriptorSource, PublisherConfig};
use crate::core::error::{PublishError, Result};
use crate::core::state_machine::{PublishState, PublishStateMachine, StateTransition};
use crate::core::throttle::PublishThrottle;
use crate::core::traits::{OperatorPrompt, PackageRegistryClient};
use crate::manifest::ManifestSynthesizer;
use crate::manifest::package_manifest;
use crate::orchestration::filter::{PublishTarget, filter};
use crate::orchestration::version_resolver::{ResolvedVersion, VersionResolver};
use crate::registry::{RegistryBuilder, RegistryDocument};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Flags of a publish run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Version to publish instead of deriving one
    pub explicit_version: Option<String>,
    /// Write versions locally but never call publish
    pub dry_run: bool,
    /// Leave the umbrella package alone
    pub skip_umbrella: bool,
    /// Skip the confirmation prompt
    pub assume_yes: bool,
}

/// A leaf package that could not be published
#[derive(Debug, Clone, PartialEq)]
pub struct PublishFailure {
    pub descriptor: ArtifactDescriptor,
    pub error: String,
}

/// What happened to the umbrella package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UmbrellaOutcome {
    Published,
    AlreadyPublished,
    DryRun,
    Failed(String),
    /// `--no-umbrella`
    Skipped,
}

/// Outcome of a publish run
#[derive(Debug, Clone)]
pub struct PublishResult {
    /// Version written and published
    pub version: String,
    pub dry_run: bool,
    /// Leaves that are now at `version` on the registry (or would be, in a dry run)
    pub published: Vec<ArtifactDescriptor>,
    /// Names of published leaves that already held `version` (no publish call made)
    pub already_published: Vec<String>,
    pub failed: Vec<PublishFailure>,
    /// Number of selected leaves
    pub total: usize,
    pub umbrella: UmbrellaOutcome,
    /// Recorded state transitions
    pub transitions: Vec<StateTransition>,
    /// Run duration in milliseconds
    pub duration_ms: u64,
}

impl PublishResult {
    /// Whether every leaf and the umbrella ended up published
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !matches!(self.umbrella, UmbrellaOutcome::Failed(_))
    }

    /// Human-readable summary for the terminal
    pub fn summary(&self) -> String {
        let rule = "=".repeat(60);
        let mut lines = vec![
            String::new(),
            rule.clone(),
            if self.dry_run {
                format!("📊 Publish Summary v{} (dry run)", self.version)
            } else {
                format!("📊 Publish Summary v{}", self.version)
            },
            rule.clone(),
            String::new(),
            format!("✅ Published: {}/{}", self.published.len(), self.total),
        ];

        for descriptor in &self.published {
            let note = if self.already_published.contains(&descriptor.package_name) {
                " (already published)"
            } else {
                ""
            };
            lines.push(format!("   - {}{}", descriptor.package_name, note));
        }

        if !self.failed.is_empty() {
            lines.push(String::new());
            lines.push(format!("❌ Failed: {}", self.failed.len()));
            for failure in &self.failed {
                lines.push(format!(
                    "   - {}: {}",
                    failure.descriptor.package_name, failure.error
                ));
            }
        }

        lines.push(String::new());
        lines.push(match &self.umbrella {
            UmbrellaOutcome::Published => "📦 Umbrella: published".to_string(),
            UmbrellaOutcome::AlreadyPublished => "📦 Umbrella: already published".to_string(),
            UmbrellaOutcome::DryRun => "📦 Umbrella: dry run".to_string(),
            UmbrellaOutcome::Failed(e) => format!("📦 Umbrella: ❌ failed: {}", e),
            UmbrellaOutcome::Skipped => "⏭️  Umbrella: skipped".to_string(),
        });

        lines.push(String::new());
        lines.push(rule.clone());
        lines.push(format!(
            "Overall Status: {} ({}ms)",
            if self.is_success() { "✅ SUCCESS" } else { "❌ FAILED" },
            self.duration_ms
        ));
        lines.push(rule);

        lines.join("\n")
    }
}

/// Result of regenerating manifests and the registry document
#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub descriptors: Vec<ArtifactDescriptor>,
    /// Whether the registry document changed on disk
    pub registry_written: bool,
}

/// Outcome of one idempotency-check-then-publish sequence
#[derive(Debug, Clone, PartialEq, Eq)]
enum Attempt {
    Published,
    AlreadyPublished,
    DryRun,
    Failed(String),
}

/// Drives publish runs for one project
pub struct PublishOrchestrator {
    config: PublisherConfig,
    package_root: PathBuf,
    dist_root: PathBuf,
    client: Arc<dyn PackageRegistryClient>,
    prompt: Arc<dyn OperatorPrompt>,
    scanner: ArtifactScanner,
    synthesizer: ManifestSynthesizer,
    builder: RegistryBuilder,
}

impl PublishOrchestrator {
    /// Create an orchestrator for the project at `project_path`
    pub fn new(
        project_path: &Path,
        config: PublisherConfig,
        client: Arc<dyn PackageRegistryClient>,
        prompt: Arc<dyn OperatorPrompt>,
    ) -> Self {
        let package_root = config.package_root_in(project_path);
        let dist_root = config.dist_root_in(project_path);
        let umbrella = config.umbrella.name.clone();

        Self {
            scanner: ArtifactScanner::new(config.layout.clone(), &umbrella),
            synthesizer: ManifestSynthesizer::new(config.package.clone(), &umbrella),
            builder: RegistryBuilder::new(
                &package_root,
                config.dist_dir.to_string_lossy(),
                &config.registry_file,
                config.umbrella.clone(),
                config.package.clone(),
            ),
            config,
            package_root,
            dist_root,
            client,
            prompt,
        }
    }

    pub fn builder(&self) -> &RegistryBuilder {
        &self.builder
    }

    pub fn dist_root(&self) -> &Path {
        &self.dist_root
    }

    /// Load descriptors from the configured source
    ///
    /// # Errors
    ///
    /// - `PublishError::ArtifactRootMissing` - the artifact tree does not exist
    /// - `PublishError::RegistryDocumentMissing` - reading from a registry
    ///   document that was never generated
    pub async fn discover(&self) -> Result<Vec<ArtifactDescriptor>> {
        if !self.dist_root.is_dir() {
            return Err(PublishError::ArtifactRootMissing {
                path: self.dist_root.clone(),
            });
        }

        match self.config.source {
            DescriptorSource::Scan => self.scanner.scan(&self.dist_root),
            DescriptorSource::Registry => {
                let document = RegistryDocument::load(&self.builder.registry_path()).await?;
                document.to_descriptors(&self.package_root, &self.config.umbrella.name)
            }
        }
    }

    /// Scan the tree and regenerate every manifest, metadata document, the
    /// registry document and the umbrella export map
    pub async fn generate(&self) -> Result<GenerateReport> {
        let descriptors = self.scanner.scan(&self.dist_root)?;

        for descriptor in &descriptors {
            self.synthesizer.write(descriptor).await?;
        }

        let mut document = self.builder.build(&descriptors)?;
        let registry_written = document.write_if_changed(&self.builder.registry_path()).await?;
        self.builder.update_umbrella_manifest(&descriptors).await?;

        tracing::info!(
            artifacts = descriptors.len(),
            registry_written,
            "generated manifests and registry"
        );

        Ok(GenerateReport {
            descriptors,
            registry_written,
        })
    }

    /// Execute a publish run
    ///
    /// # Errors
    ///
    /// Fatal preconditions (`IdentityCheckFailed`, `ArtifactRootMissing`,
    /// `RegistryDocumentMissing`), `FilterEmpty`, `VersionRequired` and
    /// `Cancelled` abort the run before anything is written. Publish failures
    /// never surface here; they are part of the returned result.
    pub async fn run(&self, target: &PublishTarget, options: &RunOptions) -> Result<PublishResult> {
        let started = std::time::Instant::now();
        let mut machine = PublishStateMachine::new();

        let (all, selected, resolved) = match self.prepare(target, options).await {
            Ok(prepared) => prepared,
            Err(e) => {
                machine.transition(PublishState::Aborted, Some(e.to_string()))?;
                return Err(e);
            }
        };
        let version = resolved.version;
        machine.transition(PublishState::VersionResolved, Some(version.clone()))?;

        if !options.dry_run && !options.assume_yes {
            let question = format!("Proceed with publishing {} plugins?", selected.len());
            let confirmed = self.prompt.confirm(&question).await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "confirmation prompt failed");
                false
            });
            if !confirmed {
                machine.transition(PublishState::Aborted, Some("declined".to_string()))?;
                tracing::info!("publishing cancelled by operator");
                return Err(PublishError::Cancelled);
            }
        }

        self.write_versions(&all, &selected, &version, options).await?;
        machine.transition(PublishState::VersionsWritten, None)?;

        machine.transition(PublishState::ArtifactsPublishing, None)?;
        let delay = Duration::from_millis(self.config.publish_delay_ms);
        let mut throttle = PublishThrottle::new(delay);
        let mut published = Vec::new();
        let mut already_published = Vec::new();
        let mut failed = Vec::new();

        for descriptor in &selected {
            let attempt = self
                .attempt(
                    &descriptor.package_name,
                    &descriptor.directory,
                    &version,
                    options.dry_run,
                    &mut throttle,
                )
                .await;

            match attempt {
                Attempt::Failed(error) => failed.push(PublishFailure {
                    descriptor: descriptor.clone(),
                    error,
                }),
                other => {
                    if other == Attempt::AlreadyPublished {
                        already_published.push(descriptor.package_name.clone());
                    }
                    published.push(descriptor.clone());
                }
            }
        }

        let umbrella = if options.skip_umbrella {
            UmbrellaOutcome::Skipped
        } else {
            machine.transition(PublishState::UmbrellaPublishing, None)?;
            let attempt = self
                .attempt(
                    &self.config.umbrella.name,
                    &self.package_root,
                    &version,
                    options.dry_run,
                    &mut throttle,
                )
                .await;
            match attempt {
                Attempt::Published => UmbrellaOutcome::Published,
                Attempt::AlreadyPublished => UmbrellaOutcome::AlreadyPublished,
                Attempt::DryRun => UmbrellaOutcome::DryRun,
                Attempt::Failed(error) => UmbrellaOutcome::Failed(error),
            }
        };
        machine.transition(PublishState::Done, None)?;

        tracing::info!(
            version = %version,
            published = published.len(),
            failed = failed.len(),
            total = selected.len(),
            "publish run finished"
        );

        Ok(PublishResult {
            version,
            dry_run: options.dry_run,
            published,
            already_published,
            failed,
            total: selected.len(),
            umbrella,
            transitions: machine.transitions().to_vec(),
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Everything that may still abort the run: identity, discovery,
    /// filtering, presence of every selected artifact directory, version
    /// resolution
    async fn prepare(
        &self,
        target: &PublishTarget,
        options: &RunOptions,
    ) -> Result<(Vec<ArtifactDescriptor>, Vec<ArtifactDescriptor>, ResolvedVersion)> {
        let identity = self
            .client
            .identity()
            .await
            .map_err(|e| PublishError::IdentityCheckFailed {
                message: e.to_string(),
            })?;
        tracing::info!(registry = self.client.name(), user = %identity, "authenticated");

        let all = self.discover().await?;
        let selected = filter(&all, target);
        if selected.is_empty() {
            return Err(PublishError::FilterEmpty {
                available: all.iter().map(|d| d.package_name.clone()).collect(),
            });
        }
        if let Some(missing) = selected.iter().find(|d| !d.directory.is_dir()) {
            tracing::error!(
                package = %missing.package_name,
                path = %missing.directory.display(),
                "selected artifact directory is gone; regenerate the registry"
            );
            return Err(PublishError::ArtifactRootMissing {
                path: missing.directory.clone(),
            });
        }
        tracing::info!(selected = selected.len(), available = all.len(), "plugins selected");

        let resolver = VersionResolver::new(
            self.client.as_ref(),
            self.prompt.as_ref(),
            &self.config.umbrella.name,
        );
        let resolved = resolver.resolve(options.explicit_version.as_deref()).await?;

        Ok((all, selected, resolved))
    }

    /// Write `version` into every selected manifest and, unless skipped, the
    /// umbrella manifest. Runs in dry runs too.
    async fn write_versions(
        &self,
        all: &[ArtifactDescriptor],
        selected: &[ArtifactDescriptor],
        version: &str,
        options: &RunOptions,
    ) -> Result<()> {
        for descriptor in selected {
            let manifest_path = descriptor.manifest_path();
            if !manifest_path.is_file() {
                self.synthesizer.write(descriptor).await?;
            }

            let old = package_manifest::write_version(&manifest_path, version).await?;
            tracing::info!(
                package = %descriptor.package_name,
                from = old.as_deref().unwrap_or("unknown"),
                to = %version,
                "updated manifest version"
            );
        }

        if !options.skip_umbrella {
            let old = self.builder.write_umbrella_version(all, version).await?;
            tracing::info!(
                package = %self.config.umbrella.name,
                from = old.as_deref().unwrap_or("unknown"),
                to = %version,
                "updated umbrella version"
            );
        }

        Ok(())
    }

    /// Idempotency check, then publish unless this is a dry run
    async fn attempt(
        &self,
        package_name: &str,
        package_dir: &Path,
        version: &str,
        dry_run: bool,
        throttle: &mut PublishThrottle,
    ) -> Attempt {
        let current = match self.client.current_version(package_name).await {
            Ok(current) => current,
            Err(e) => {
                tracing::warn!(
                    package = %package_name,
                    error = %e,
                    "version query failed, assuming unpublished"
                );
                None
            }
        };

        if current.as_deref() == Some(version) {
            tracing::info!(
                package = %package_name,
                version = %version,
                "already published, skipping"
            );
            return Attempt::AlreadyPublished;
        }

        if dry_run {
            tracing::info!(package = %package_name, version = %version, "[DRY RUN] would publish");
            return Attempt::DryRun;
        }

        throttle.wait_turn().await;
        match self.client.publish(package_dir).await {
            Ok(()) => {
                tracing::info!(package = %package_name, version = %version, "published");
                Attempt::Published
            }
            Err(e) => {
                tracing::error!(package = %package_name, error = %e, "publish failed");
                Attempt::Failed(e.to_string())
            }
        }
    }
}
