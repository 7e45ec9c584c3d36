//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher and server produce:
//!     → logging.rs (structured log events, request ID on each)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty for development, JSON for aggregation)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Unsupported clients are routine: logged at debug, counted
//! - Failed opens are logged at warn; they answer with 500

pub mod logging;
pub mod metrics;
