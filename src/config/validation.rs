//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Every build has an absolute entrypoint and a unique name
//! - Detect builds that can never be selected
//! - Validate addresses and timeouts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{BuildConfig, ServerConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no builds configured")]
    NoBuilds,

    #[error("build {build}: entrypoint is empty")]
    EmptyEntrypoint { build: String },

    #[error("build {build}: entrypoint {entrypoint:?} must start with '/'")]
    RelativeEntrypoint { build: String, entrypoint: String },

    #[error("duplicate build name {0:?}")]
    DuplicateName(String),

    #[error("build {shadowed} can never be selected: {by} comes first and accepts every client it would")]
    UnreachableBuild { shadowed: String, by: String },

    #[error("invalid bind address {0:?}")]
    InvalidBindAddress(String),

    #[error("invalid metrics address {0:?}")]
    InvalidMetricsAddress(String),

    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
}

pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    validate_builds(&config.builds, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_builds(builds: &[BuildConfig], errors: &mut Vec<ValidationError>) {
    if builds.is_empty() {
        errors.push(ValidationError::NoBuilds);
        return;
    }

    let mut names = HashSet::new();
    for (i, build) in builds.iter().enumerate() {
        let name = build.display_name(i);
        if build.entrypoint.is_empty() {
            errors.push(ValidationError::EmptyEntrypoint {
                build: name.clone(),
            });
        } else if !build.entrypoint.starts_with('/') {
            errors.push(ValidationError::RelativeEntrypoint {
                build: name.clone(),
                entrypoint: build.entrypoint.clone(),
            });
        }
        if !names.insert(name.clone()) {
            errors.push(ValidationError::DuplicateName(name));
        }
    }

    for (j, later) in builds.iter().enumerate() {
        if let Some((i, earlier)) = builds[..j]
            .iter()
            .enumerate()
            .find(|(_, earlier)| shadows(earlier, later))
        {
            errors.push(ValidationError::UnreachableBuild {
                shadowed: later.display_name(j),
                by: earlier.display_name(i),
            });
        }
    }
}

/// `earlier` matches every client `later` matches: its requirements
/// are a subset of `later`'s.
fn shadows(earlier: &BuildConfig, later: &BuildConfig) -> bool {
    let flags = earlier.requires.iter().all(|r| later.requires.contains(r));
    let values = earlier
        .requires_values
        .iter()
        .all(|(k, v)| later.requires_values.get(k) == Some(v));
    flags && values
}
