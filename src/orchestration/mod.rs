//! Orchestration layer for plugin publishing
//!
//! Target selection, version resolution, operator prompts and the publish
//! run that ties them together.

pub mod filter;
pub mod orchestrator;
pub mod prompt;
pub mod version_resolver;

// Re-export main types for convenience
pub use filter::{PublishTarget, filter};
pub use orchestrator::{
    GenerateReport, PublishFailure, PublishOrchestrator, PublishResult, RunOptions,
    UmbrellaOutcome,
};
pub use prompt::{NonInteractivePrompt, StdinPrompt};
pub use version_resolver::{ResolvedVersion, VersionResolver, VersionSource};
