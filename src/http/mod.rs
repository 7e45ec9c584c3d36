//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, reload)
//!     → request.rs (request ID, user agent, scheme and host)
//!     → dispatch.rs (select build, resolve path, open file, set headers)
//!     → content.rs (conditional requests, ranges, body)
//!     → response.rs (error responses)
//!     → Send to client
//! ```

pub mod content;
pub mod dispatch;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::{Dispatcher, SERVICE_WORKER_ALLOWED};
pub use request::{SecureConnection, X_FORWARDED_PROTO, X_REQUEST_ID};
pub use response::DispatchError;
pub use server::{build_router, reload, AppState, HttpServer};
