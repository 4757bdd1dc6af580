//! Discovery, manifest synthesis and publishing of pre-built plugin artifacts
//!
//! Artifacts live in a `{platform}/{kind}/{algorithm}` tree. The crate scans
//! that tree, writes a package manifest per artifact plus a registry document
//! listing all of them, and publishes the leaf packages followed by the
//! umbrella package that re-exports them.

pub mod artifacts;
pub mod core;
pub mod manifest;
pub mod orchestration;
pub mod registry;
pub mod security;
pub mod validation;

pub use artifacts::{ArtifactDescriptor, ArtifactKind, ArtifactScanner};
pub use core::{PackageRegistryClient, PublishError, PublisherConfig};
pub use orchestration::{PublishOrchestrator, PublishResult, PublishTarget, RunOptions};
pub use registry::{NpmRegistryClient, RegistryBuilder, RegistryShape};
pub use security::{CommandError, SafeCommandExecutor};
