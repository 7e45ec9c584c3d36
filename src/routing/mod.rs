//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path (raw, percent-encoded)
//!     → resolve.rs (decode, normalize)
//!     → matcher.rs (app route? service worker?)
//!     → Return: served file path (entrypoint or literal)
//! ```
//!
//! # Design Decisions
//! - Any path without a file extension is an application route
//!   (client-side routing fallback to the entrypoint)
//! - Deterministic: same path and build always resolve to the same file

pub mod matcher;
pub mod resolve;

pub use matcher::{has_file_extension, is_app_route, is_service_worker};
pub use resolve::{resolve, PathError, ResolvedPath};
