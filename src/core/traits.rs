//! Core traits for plugin publishing
//!
//! This module defines the seams between the publish pipeline and the outside
//! world: the remote package registry and the operator answering prompts.
//! Both are injected so tests can drive a full run without network access or
//! a terminal.

use async_trait::async_trait;
use std::path::Path;

// ============================================================================
// Remote Registry
// ============================================================================

/// Narrow capability over a remote package registry
///
/// Every call is a black-box request/response operation. Implementations must
/// not retry internally: the orchestrator decides how a failure is recorded.
#[async_trait]
pub trait PackageRegistryClient: Send + Sync {
    /// Registry name used in logs (e.g., "npm")
    fn name(&self) -> &str;

    /// Return the currently authenticated identity
    ///
    /// An error here is a fatal precondition for a publish run.
    async fn identity(&self) -> anyhow::Result<String>;

    /// Return the currently published version of a package
    ///
    /// `Ok(None)` means the package is not published yet.
    async fn current_version(&self, package_name: &str) -> anyhow::Result<Option<String>>;

    /// Return every version ever published for a package
    async fn version_history(&self, package_name: &str) -> anyhow::Result<Vec<String>>;

    /// Upload the package whose manifest lives in `package_dir`
    async fn publish(&self, package_dir: &Path) -> anyhow::Result<()>;
}

// ============================================================================
// Operator
// ============================================================================

/// Answer to a version prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptAnswer {
    /// The operator typed something (possibly empty)
    Answer(String),
    /// The operator cancelled the prompt (EOF, Ctrl-D)
    Cancelled,
}

/// Source of operator decisions during a run
#[async_trait]
pub trait OperatorPrompt: Send + Sync {
    /// Ask for the version to publish when it cannot be derived
    async fn ask_version(&self) -> anyhow::Result<PromptAnswer>;

    /// Ask a yes/no question before anything is mutated
    async fn confirm(&self, message: &str) -> anyhow::Result<bool>;
}
