//! Startup orchestration.
//!
//! # Responsibilities
//! - Compile validated build configuration into a `BuildCatalog`
//! - Load each build's push manifest
//! - Assemble the dispatcher over the site root
//!
//! # Design Decisions
//! - Fail fast: any manifest or build error is fatal at startup
//! - The same compilation runs on hot reload, where failure keeps the
//!   previous dispatcher

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::builds::{AllOf, Build, BuildCatalog, BuildError, CapabilityEquals, HasCapability, Requirement};
use crate::capabilities::{BrowserCapabilities, CapabilityDetector};
use crate::config::schema::{BuildConfig, ServerConfig};
use crate::http::Dispatcher;
use crate::push::{load_push_manifest, ManifestError};
use crate::routing::resolve::{normalize, PathError};
use crate::storage::DirectoryStore;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("build {build}: invalid entrypoint: {source}")]
    Entrypoint {
        build: String,
        #[source]
        source: PathError,
    },
}

/// Requirement for a configured build: every listed capability present
/// and every listed value equal. No constraints = always satisfied.
pub fn compile_requirement(config: &BuildConfig) -> AllOf {
    let flags = config
        .requires
        .iter()
        .map(|name| Box::new(HasCapability::new(name.clone())) as Box<dyn Requirement>);
    let values = config.requires_values.iter().map(|(name, value)| {
        Box::new(CapabilityEquals::new(name.clone(), value.clone())) as Box<dyn Requirement>
    });
    AllOf::new(flags.chain(values).collect())
}

pub fn compile_build(index: usize, config: &BuildConfig, root: &Path) -> Result<Build, StartupError> {
    let name = config.display_name(index);
    let entrypoint = if config.entrypoint.is_empty() {
        // Let Build::new report it.
        String::new()
    } else {
        normalize(&config.entrypoint).map_err(|source| StartupError::Entrypoint {
            build: name.clone(),
            source,
        })?
    };

    let mut build = Build::new(name, entrypoint, compile_requirement(config))?;
    if let Some(manifest) = &config.push_manifest {
        build = build.with_push_manifest(load_push_manifest(root, manifest)?);
    }
    Ok(build)
}

pub fn build_catalog(config: &ServerConfig) -> Result<BuildCatalog, StartupError> {
    config
        .builds
        .iter()
        .enumerate()
        .map(|(i, b)| compile_build(i, b, &config.site.root))
        .collect()
}

/// Compile the full dispatcher for `config`, serving from `site.root`.
pub fn build_dispatcher(config: &ServerConfig) -> Result<Dispatcher<DirectoryStore>, StartupError> {
    build_dispatcher_with(config, Arc::new(BrowserCapabilities::new()))
}

/// Like `build_dispatcher`, keeping an existing detector.
pub fn build_dispatcher_with(
    config: &ServerConfig,
    detector: Arc<dyn CapabilityDetector>,
) -> Result<Dispatcher<DirectoryStore>, StartupError> {
    let catalog = build_catalog(config)?;

    for build in catalog.iter() {
        tracing::info!(
            build = %build.name(),
            entrypoint = %build.entrypoint(),
            requirement = ?build.requirement(),
            push_entries = build.push_manifest().map(|m| m.len()).unwrap_or(0),
            "Build registered"
        );
    }

    Ok(Dispatcher::with_shared_detector(
        catalog,
        detector,
        DirectoryStore::new(config.site.root.clone()),
    ))
}
