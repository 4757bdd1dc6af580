//! Package manifests and plugin metadata documents

pub mod catalog;
pub mod package_manifest;
pub mod synthesizer;

/// Package manifest file name inside an artifact directory
pub const MANIFEST_FILE: &str = "package.json";

/// Plugin metadata document file name inside an artifact directory
pub const METADATA_FILE: &str = "plugin.json";

pub use catalog::{AlgorithmProfile, CompressionLevels};
pub use package_manifest::{ExportTarget, PackageManifest};
pub use synthesizer::{ManifestSynthesizer, MetadataDocument, SynthesizedPackage};
