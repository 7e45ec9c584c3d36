//! A single pre-built application variant.

use std::fmt;

use thiserror::Error;

use crate::builds::requirement::{Always, Requirement};
use crate::capabilities::CapabilitySet;
use crate::push::PushManifest;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("build {0:?} has an empty entrypoint")]
    EmptyEntrypoint(String),
}

/// One variant of the application, gated by a capability requirement.
pub struct Build {
    name: String,
    requirement: Box<dyn Requirement>,
    entrypoint: String,
    push_manifest: Option<PushManifest>,
}

impl Build {
    /// Create a build. The entrypoint must be non-empty.
    pub fn new(
        name: impl Into<String>,
        entrypoint: impl Into<String>,
        requirement: impl Requirement + 'static,
    ) -> Result<Self, BuildError> {
        let name = name.into();
        let entrypoint = entrypoint.into();
        if entrypoint.is_empty() {
            return Err(BuildError::EmptyEntrypoint(name));
        }

        Ok(Self {
            name,
            requirement: Box::new(requirement),
            entrypoint,
            push_manifest: None,
        })
    }

    /// A build every client can run.
    pub fn fallback(name: impl Into<String>, entrypoint: impl Into<String>) -> Result<Self, BuildError> {
        Self::new(name, entrypoint, Always)
    }

    pub fn with_push_manifest(mut self, manifest: PushManifest) -> Self {
        self.push_manifest = Some(manifest);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entrypoint(&self) -> &str {
        &self.entrypoint
    }

    pub fn push_manifest(&self) -> Option<&PushManifest> {
        self.push_manifest.as_ref()
    }

    pub fn requirement(&self) -> &dyn Requirement {
        self.requirement.as_ref()
    }

    /// Can this build run given these capabilities?
    pub fn is_supported_by(&self, capabilities: &CapabilitySet) -> bool {
        self.requirement.is_satisfied(capabilities)
    }
}

impl fmt::Debug for Build {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Build")
            .field("name", &self.name)
            .field("entrypoint", &self.entrypoint)
            .field("requirement", &self.requirement)
            .field("push_entries", &self.push_manifest.as_ref().map(PushManifest::len))
            .finish()
    }
}
