//! Artifact discovery
//!
//! Descriptors identify one build output by `(platform, kind, algorithm)`;
//! the scanner finds them on disk.

pub mod descriptor;
pub mod scanner;

pub use descriptor::{
    ArtifactDescriptor, ArtifactFiles, ArtifactKind, package_name, sort_descriptors,
};
pub use scanner::ArtifactScanner;
