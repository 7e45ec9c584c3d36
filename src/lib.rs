//! PRPL server library.
//!
//! Serves one of several builds of a web application, chosen per request
//! from the client's capabilities, with application routes falling back
//! to the build's entrypoint and preload hints for its critical assets.

pub mod builds;
pub mod capabilities;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod push;
pub mod routing;
pub mod storage;

pub use builds::{Build, BuildCatalog};
pub use capabilities::{CapabilityDetector, CapabilitySet};
pub use config::schema::ServerConfig;
pub use http::{Dispatcher, HttpServer};
pub use lifecycle::Shutdown;
pub use storage::{DirectoryStore, FileStore};
