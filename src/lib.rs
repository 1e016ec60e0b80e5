//! Duplicate bookmark detection and cleanup.
//!
//! A [`Session`] scans a [`BookmarkStore`], groups bookmarks that point at
//! the same normalized URL, lets the operator pick which duplicates to drop
//! and deletes them one at a time, always keeping the newest entry of a group.

pub mod bookmarks;
pub mod cleanup;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod grouping;
pub mod normalize;
pub mod report;
pub mod selection;
pub mod session;
pub mod store;

pub use bookmarks::{BookmarkId, BookmarkNode, BookmarkRecord, DuplicateGroup};
pub use cleanup::{CleanupMode, CleanupOutcome};
pub use config::Config;
pub use error::{BusyError, DeletionError, SessionError, StoreError};
pub use grouping::find_duplicates;
pub use normalize::normalize_url;
pub use selection::Selection;
pub use session::Session;
pub use store::{BookmarkStore, BrowserStore, ChromiumStore, FirefoxStore, MemoryStore, StoreKind};
