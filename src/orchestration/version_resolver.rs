//! Target version resolution
//!
//! Order of precedence: an explicit version, then the next patch after the
//! highest numeric version published for the umbrella package, then the
//! operator.

use crate::core::error::{PublishError, Result};
use crate::core::traits::{OperatorPrompt, PackageRegistryClient, PromptAnswer};
use crate::validation::VersionValidator;

/// How the version of a run was obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSource {
    Explicit,
    /// Derived from the highest published version
    Bumped { from: String },
    Prompted,
}

/// Resolved version of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    pub version: String,
    pub source: VersionSource,
}

/// Resolves the version a run publishes
pub struct VersionResolver<'a> {
    client: &'a dyn PackageRegistryClient,
    prompt: &'a dyn OperatorPrompt,
    umbrella: &'a str,
    validator: VersionValidator,
}

impl<'a> VersionResolver<'a> {
    pub fn new(
        client: &'a dyn PackageRegistryClient,
        prompt: &'a dyn OperatorPrompt,
        umbrella: &'a str,
    ) -> Self {
        Self {
            client,
            prompt,
            umbrella,
            validator: VersionValidator::new(),
        }
    }

    /// Resolve the version to publish
    ///
    /// An explicit version is used verbatim; a non-semver one only logs a
    /// warning.
    ///
    /// # Errors
    ///
    /// - `PublishError::VersionRequired` - the operator gave an empty answer
    /// - `PublishError::Cancelled` - the operator cancelled the prompt
    pub async fn resolve(&self, explicit: Option<&str>) -> Result<ResolvedVersion> {
        if let Some(version) = explicit {
            let check = self.validator.validate(version);
            if !check.is_valid {
                tracing::warn!(
                    version = %version,
                    reason = check.error.as_deref().unwrap_or_default(),
                    "explicit version is not valid semver, using it as given"
                );
            }
            return Ok(ResolvedVersion {
                version: version.to_string(),
                source: VersionSource::Explicit,
            });
        }

        if let Some(resolved) = self.bump_from_history().await {
            return Ok(resolved);
        }

        self.ask_operator().await
    }

    async fn bump_from_history(&self) -> Option<ResolvedVersion> {
        let history = match self.client.version_history(self.umbrella).await {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(
                    package = %self.umbrella,
                    error = %e,
                    "could not determine next version automatically"
                );
                return None;
            }
        };

        let selection = self.validator.select_max(&history);
        if !selection.ignored.is_empty() {
            tracing::warn!(ignored = ?selection.ignored, "ignoring non-numeric published versions");
        }

        let max = selection.max?;
        let Some(version) = self.validator.next_version(&max) else {
            tracing::warn!(highest = %max, "cannot increment highest published version");
            return None;
        };
        tracing::info!(highest = %max, next = %version, "derived next version");

        Some(ResolvedVersion {
            version,
            source: VersionSource::Bumped { from: max },
        })
    }

    async fn ask_operator(&self) -> Result<ResolvedVersion> {
        let answer = self.prompt.ask_version().await.map_err(|e| {
            tracing::warn!(error = %e, "version prompt failed");
            PublishError::Cancelled
        })?;

        match answer {
            PromptAnswer::Answer(version) if !version.trim().is_empty() => Ok(ResolvedVersion {
                version: version.trim().to_string(),
                source: VersionSource::Prompted,
            }),
            PromptAnswer::Answer(_) => Err(PublishError::VersionRequired),
            PromptAnswer::Cancelled => Err(PublishError::Cancelled),
        }
    }
}
