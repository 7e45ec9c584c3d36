//! Build requirement predicates.
//!
//! # Responsibilities
//! - Decide whether a build can run given a capability set
//! - Compose simple checks with AND / OR / NOT semantics
//!
//! # Design Decisions
//! - Empty requirement = always satisfied (universal fallback)
//! - Missing capabilities are treated as absent, never as errors

use std::fmt;

use crate::capabilities::{CapabilitySet, CapabilityValue};

/// Predicate over a capability set: "can this build run here?"
pub trait Requirement: Send + Sync + fmt::Debug {
    fn is_satisfied(&self, capabilities: &CapabilitySet) -> bool;
}

/// Satisfied by every client.
#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl Requirement for Always {
    fn is_satisfied(&self, _capabilities: &CapabilitySet) -> bool {
        true
    }
}

/// Satisfied when the named capability is present and truthy.
#[derive(Debug, Clone)]
pub struct HasCapability {
    name: String,
}

impl HasCapability {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Requirement for HasCapability {
    fn is_satisfied(&self, capabilities: &CapabilitySet) -> bool {
        capabilities.has(&self.name)
    }
}

/// Satisfied when the named capability has exactly this value.
#[derive(Debug, Clone)]
pub struct CapabilityEquals {
    name: String,
    value: CapabilityValue,
}

impl CapabilityEquals {
    pub fn new(name: impl Into<String>, value: impl Into<CapabilityValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl Requirement for CapabilityEquals {
    fn is_satisfied(&self, capabilities: &CapabilitySet) -> bool {
        capabilities.get(&self.name) == Some(&self.value)
    }
}

/// All inner requirements must hold. Empty = always.
#[derive(Debug, Default)]
pub struct AllOf {
    requirements: Vec<Box<dyn Requirement>>,
}

impl AllOf {
    pub fn new(requirements: Vec<Box<dyn Requirement>>) -> Self {
        Self { requirements }
    }

    /// `AllOf` of `HasCapability` for each name.
    pub fn capabilities<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self::new(
            names
                .into_iter()
                .map(|n| Box::new(HasCapability::new(n)) as Box<dyn Requirement>)
                .collect(),
        )
    }
}

impl Requirement for AllOf {
    fn is_satisfied(&self, capabilities: &CapabilitySet) -> bool {
        self.requirements.iter().all(|r| r.is_satisfied(capabilities))
    }
}

/// At least one inner requirement must hold. Empty = never.
#[derive(Debug, Default)]
pub struct AnyOf {
    requirements: Vec<Box<dyn Requirement>>,
}

impl AnyOf {
    pub fn new(requirements: Vec<Box<dyn Requirement>>) -> Self {
        Self { requirements }
    }
}

impl Requirement for AnyOf {
    fn is_satisfied(&self, capabilities: &CapabilitySet) -> bool {
        self.requirements.iter().any(|r| r.is_satisfied(capabilities))
    }
}

#[derive(Debug)]
pub struct Not {
    inner: Box<dyn Requirement>,
}

impl Not {
    pub fn new(inner: impl Requirement + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }
}

impl Requirement for Not {
    fn is_satisfied(&self, capabilities: &CapabilitySet) -> bool {
        !self.inner.is_satisfied(capabilities)
    }
}

/// Wraps an arbitrary closure as a requirement.
pub struct FnRequirement<F> {
    label: &'static str,
    f: F,
}

impl<F> FnRequirement<F>
where
    F: Fn(&CapabilitySet) -> bool + Send + Sync,
{
    pub fn new(label: &'static str, f: F) -> Self {
        Self { label, f }
    }
}

// Closures have no Debug impl; print the label instead.
impl<F> fmt::Debug for FnRequirement<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnRequirement").field(&self.label).finish()
    }
}

impl<F> Requirement for FnRequirement<F>
where
    F: Fn(&CapabilitySet) -> bool + Send + Sync,
{
    fn is_satisfied(&self, capabilities: &CapabilitySet) -> bool {
        (self.f)(capabilities)
    }
}
