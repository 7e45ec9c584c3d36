//! Build lookup.
//!
//! # Responsibilities
//! - Store builds in preference order
//! - Return the first build a client can run, or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) linear scan; catalog order is the only source of preference,
//!   so builds must be listed most capable first
//! - No scoring: the first satisfied requirement wins even if a later
//!   build would also run

use crate::builds::build::Build;
use crate::capabilities::CapabilitySet;

/// Ordered collection of builds, most capable first.
#[derive(Debug, Default)]
pub struct BuildCatalog {
    builds: Vec<Build>,
}

impl BuildCatalog {
    pub fn new(builds: Vec<Build>) -> Self {
        Self { builds }
    }

    /// First build in catalog order whose requirement holds.
    pub fn find_build(&self, capabilities: &CapabilitySet) -> Option<&Build> {
        self.builds.iter().find(|b| b.is_supported_by(capabilities))
    }

    pub fn len(&self) -> usize {
        self.builds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Build> {
        self.builds.iter()
    }
}

impl FromIterator<Build> for BuildCatalog {
    fn from_iter<T: IntoIterator<Item = Build>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
