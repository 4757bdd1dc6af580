//! Static algorithm catalog
//!
//! Description templates, keywords, compression levels, extensions and
//! archive features for every known algorithm. Both the per-artifact metadata
//! document and the nested registry shape read from here, so the two never
//! disagree.

use crate::artifacts::ArtifactKind;
use serde::{Deserialize, Serialize};

/// Compression level range of an algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionLevels {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

/// Feature every archive plugin supports
pub const FEATURE_METADATA_EMBEDDING: &str = "metadata-embedding";

/// Feature of archive formats that compress their members
pub const FEATURE_COMPRESS_INSIDE: &str = "compress-inside";

/// Kind-specific metadata of an algorithm
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlgorithmProfile {
    Compression {
        levels: CompressionLevels,
        extensions: Vec<String>,
    },
    Archive {
        features: Vec<String>,
        extensions: Vec<String>,
    },
}

impl AlgorithmProfile {
    /// Look up the profile of an algorithm
    pub fn lookup(kind: ArtifactKind, algorithm: &str) -> Self {
        match kind {
            ArtifactKind::Compression => AlgorithmProfile::Compression {
                levels: compression_levels(algorithm),
                extensions: extensions(kind, algorithm),
            },
            ArtifactKind::Archive => AlgorithmProfile::Archive {
                features: archive_features(algorithm),
                extensions: extensions(kind, algorithm),
            },
        }
    }

    /// File extensions handled by the algorithm
    pub fn extensions(&self) -> &[String] {
        match self {
            AlgorithmProfile::Compression { extensions, .. }
            | AlgorithmProfile::Archive { extensions, .. } => extensions,
        }
    }
}

/// Compression level range; gzip and zip top out at 9, everything else at 11
pub fn compression_levels(algorithm: &str) -> CompressionLevels {
    let max = match algorithm {
        "gzip" | "zip" => 9,
        _ => 11,
    };
    CompressionLevels {
        min: 0,
        max,
        default: 6,
    }
}

/// File extensions for an algorithm; unknown algorithms have none
pub fn extensions(kind: ArtifactKind, algorithm: &str) -> Vec<String> {
    let known: &[&str] = match (kind, algorithm) {
        (ArtifactKind::Compression, "gzip") => &["gz"],
        (ArtifactKind::Compression, "brotli") => &["br"],
        (ArtifactKind::Compression, "zip") => &["zip"],
        (ArtifactKind::Archive, "tar") => &["tar"],
        (ArtifactKind::Archive, "zip") => &["zip"],
        _ => &[],
    };
    known.iter().map(|e| e.to_string()).collect()
}

/// Archive features
pub fn archive_features(algorithm: &str) -> Vec<String> {
    let mut features = vec![FEATURE_METADATA_EMBEDDING.to_string()];
    if algorithm == "zip" {
        features.push(FEATURE_COMPRESS_INSIDE.to_string());
    }
    features
}

/// Package description for a leaf artifact
pub fn description(kind: ArtifactKind, algorithm: &str, platform: &str) -> String {
    let algo = algorithm.to_uppercase();
    match kind {
        ArtifactKind::Compression => format!(
            "High-performance {} compression using WebAssembly for {}",
            algo, platform
        ),
        ArtifactKind::Archive => format!(
            "High-performance {} archive format using WebAssembly for {}",
            algo, platform
        ),
    }
}

/// Short description used in metadata documents and the nested registry
pub fn short_description(kind: ArtifactKind, algorithm: &str, platform: &str) -> String {
    format!(
        "{} {} plugin for {} platform",
        algorithm.to_uppercase(),
        kind,
        platform
    )
}

/// Package keywords for a leaf artifact
pub fn keywords(kind: ArtifactKind, algorithm: &str) -> Vec<String> {
    [algorithm, kind.as_str(), "wasm", "webassembly", "performance"]
        .iter()
        .map(|k| k.to_string())
        .collect()
}
