//! File storage seam.
//!
//! # Responsibilities
//! - Open a file by absolute URL-style path
//! - Hand back an owned, seekable reader
//!
//! # Design Decisions
//! - Release is `Drop`: whoever owns the handle closes it exactly once
//! - Errors are opaque `io::Error`s; callers do not classify them

pub mod directory;

use std::future::Future;
use std::io;

use tokio::io::{AsyncRead, AsyncSeek};

pub use directory::DirectoryStore;

/// Source of files to serve.
pub trait FileStore: Send + Sync + 'static {
    type File: AsyncRead + AsyncSeek + Send + Unpin + 'static;

    /// Open `path`, an absolute normalized path such as `/es6/index.html`.
    fn open(&self, path: &str) -> impl Future<Output = io::Result<Self::File>> + Send;
}
