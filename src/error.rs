//! Error types for the dedupe engine.
//!
//! Store failures are surfaced verbatim, partial cleanups carry the number of
//! deletions that went through before the failure.

use std::path::PathBuf;

use thiserror::Error;

use crate::bookmarks::BookmarkId;

/// Failure reported by a bookmark store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("bookmark {0} not found")]
    NotFound(BookmarkId),

    #[error("bookmark store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid bookmarks JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("places database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("bookmark database is locked (is the browser running?): {0:?}")]
    Locked(PathBuf),

    #[error("bookmark store is corrupt: {0}")]
    Corrupt(String),

    #[error("unsupported bookmark store: {0}")]
    Unsupported(String),
}

/// Another scan or cleanup is already running on this session.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("another scan or cleanup is already in progress")]
pub struct BusyError;

/// A cleanup stopped at its first failed delete.
#[derive(Debug, Error)]
#[error("cleanup stopped after {deleted_count} deletion(s): failed to delete {failed_id}: {source}")]
pub struct DeletionError {
    pub deleted_count: usize,
    pub deleted_ids: Vec<BookmarkId>,
    pub failed_id: BookmarkId,
    #[source]
    pub source: StoreError,
}

/// Errors returned by [`crate::session::Session`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Busy(#[from] BusyError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Deletion(#[from] DeletionError),
}
