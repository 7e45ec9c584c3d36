//! Build catalog subsystem.
//!
//! # Data Flow
//! ```text
//! Build Compilation (at startup):
//!     BuildConfig[] (in preference order)
//!     → requirement.rs (compile capability predicates)
//!     → build.rs (entrypoint + push manifest)
//!     → catalog.rs (freeze as immutable BuildCatalog)
//!
//! Per request:
//!     CapabilitySet → BuildCatalog::find_build → Build or NoMatch
//! ```

pub mod build;
pub mod catalog;
pub mod requirement;

pub use build::{Build, BuildError};
pub use catalog::BuildCatalog;
pub use requirement::{AllOf, Always, AnyOf, CapabilityEquals, FnRequirement, HasCapability, Not, Requirement};
