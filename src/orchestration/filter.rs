//! Publish target selection
//!
//! A [`PublishTarget`] is a conjunction of four optional set filters. An empty
//! set means "no constraint on this dimension", so the default target selects
//! everything.

use crate::artifacts::{ArtifactDescriptor, ArtifactKind};
use std::collections::BTreeSet;

/// Subset of artifacts a run should publish
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishTarget {
    pub platforms: BTreeSet<String>,
    pub kinds: BTreeSet<ArtifactKind>,
    pub algorithms: BTreeSet<String>,
    /// Exact leaf package names
    pub explicit_names: BTreeSet<String>,
}

impl PublishTarget {
    /// Target matching every artifact
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platforms.insert(platform.into());
        self
    }

    pub fn with_kind(mut self, kind: ArtifactKind) -> Self {
        self.kinds.insert(kind);
        self
    }

    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithms.insert(algorithm.into());
        self
    }

    pub fn with_name(mut self, package_name: impl Into<String>) -> Self {
        self.explicit_names.insert(package_name.into());
        self
    }

    /// Whether no dimension is constrained
    pub fn is_unconstrained(&self) -> bool {
        self.platforms.is_empty()
            && self.kinds.is_empty()
            && self.algorithms.is_empty()
            && self.explicit_names.is_empty()
    }

    /// Whether `descriptor` is selected by this target
    pub fn matches(&self, descriptor: &ArtifactDescriptor) -> bool {
        fn allows<T, U>(set: &BTreeSet<U>, value: &T) -> bool
        where
            T: Ord + ?Sized,
            U: std::borrow::Borrow<T> + Ord,
        {
            set.is_empty() || set.contains(value)
        }

        allows(&self.platforms, descriptor.platform.as_str())
            && allows(&self.kinds, &descriptor.kind)
            && allows(&self.algorithms, descriptor.algorithm.as_str())
            && allows(&self.explicit_names, descriptor.package_name.as_str())
    }
}

/// Select the descriptors matched by `target`, preserving input order
pub fn filter(
    descriptors: &[ArtifactDescriptor],
    target: &PublishTarget,
) -> Vec<ArtifactDescriptor> {
    descriptors
        .iter()
        .filter(|d| target.matches(d))
        .cloned()
        .collect()
}
