//! Bookmark storage collaborators.
//!
//! The engine only needs two capabilities from a store: enumerate the whole
//! bookmark tree and delete a single url entry by id.

use std::future::Future;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::bookmarks::{BookmarkId, BookmarkNode};
use crate::error::StoreError;

mod chromium;
mod firefox;
mod memory;

pub use chromium::ChromiumStore;
pub use firefox::FirefoxStore;
pub use memory::MemoryStore;

/// Unit and epoch of a store's `date_added` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampKind {
    /// Milliseconds since the Unix epoch (extension bookmark API).
    UnixMillis,
    /// Microseconds since the Unix epoch (Firefox PRTime).
    UnixMicros,
    /// Microseconds since 1601-01-01 (Chromium `Bookmarks` file).
    WebkitMicros,
}

pub trait BookmarkStore: Send + Sync {
    /// Read the full bookmark tree.
    fn enumerate(&self) -> impl Future<Output = Result<Vec<BookmarkNode>, StoreError>> + Send;

    /// Delete one url entry.
    fn delete_entry(&self, id: &BookmarkId) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn timestamp_kind(&self) -> TimestampKind {
        TimestampKind::UnixMillis
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Chromium,
    Firefox,
}

impl StoreKind {
    pub fn name(&self) -> &'static str {
        match self {
            StoreKind::Chromium => "Chromium",
            StoreKind::Firefox => "Firefox",
        }
    }
}

/// A file-backed browser store picked at runtime.
#[derive(Debug)]
pub enum BrowserStore {
    Chromium(ChromiumStore),
    Firefox(FirefoxStore),
}

impl BrowserStore {
    pub fn open(kind: StoreKind, path: PathBuf, backup: bool) -> Self {
        match kind {
            StoreKind::Chromium => BrowserStore::Chromium(ChromiumStore::new(path).with_backup(backup)),
            StoreKind::Firefox => BrowserStore::Firefox(FirefoxStore::new(path)),
        }
    }
}

impl BookmarkStore for BrowserStore {
    async fn enumerate(&self) -> Result<Vec<BookmarkNode>, StoreError> {
        match self {
            BrowserStore::Chromium(store) => store.enumerate().await,
            BrowserStore::Firefox(store) => store.enumerate().await,
        }
    }

    async fn delete_entry(&self, id: &BookmarkId) -> Result<(), StoreError> {
        match self {
            BrowserStore::Chromium(store) => store.delete_entry(id).await,
            BrowserStore::Firefox(store) => store.delete_entry(id).await,
        }
    }

    fn timestamp_kind(&self) -> TimestampKind {
        match self {
            BrowserStore::Chromium(store) => store.timestamp_kind(),
            BrowserStore::Firefox(store) => store.timestamp_kind(),
        }
    }
}
