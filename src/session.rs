//! Scan/cleanup session: owns the current duplicate groups and selection.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::bookmarks::{BookmarkId, DuplicateGroup};
use crate::cleanup::{cleanup_targets, delete_sequentially, CleanupMode, CleanupOutcome};
use crate::enumerate::{flatten_bookmarks_with_label, UNKNOWN_FOLDER};
use crate::error::{BusyError, SessionError};
use crate::grouping::{duplicate_count, find_duplicates};
use crate::selection::Selection;
use crate::store::BookmarkStore;

#[derive(Debug, Default)]
struct ScanState {
    groups: Vec<DuplicateGroup>,
    selection: Selection,
}

impl ScanState {
    /// Drop ids that are gone from the store. Groups left with a single
    /// member are no longer duplicates.
    fn forget(&mut self, ids: &[BookmarkId]) {
        let gone: HashSet<&BookmarkId> = ids.iter().collect();
        for group in &mut self.groups {
            group.items.retain(|r| !gone.contains(&r.id));
        }
        self.groups.retain(|g| g.len() > 1);
        self.selection.forget(ids);
    }
}

/// Releases the session's busy flag when dropped.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// One operator session against a bookmark store.
///
/// At most one scan or cleanup runs at a time; a second one is rejected with
/// [`BusyError`] before it touches any state. Selection calls never wait on a
/// running operation.
pub struct Session<S> {
    store: S,
    busy: AtomicBool,
    state: Mutex<ScanState>,
    unknown_folder: String,
}

impl<S: BookmarkStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            busy: AtomicBool::new(false),
            state: Mutex::new(ScanState::default()),
            unknown_folder: UNKNOWN_FOLDER.to_string(),
        }
    }

    /// Label for bookmarks whose folder path cannot be resolved.
    pub fn with_unknown_folder(mut self, label: impl Into<String>) -> Self {
        self.unknown_folder = label.into();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<BusyGuard<'_>, BusyError> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard { flag: &self.busy })
            .map_err(|_| BusyError)
    }

    fn state(&self) -> MutexGuard<'_, ScanState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enumerate the store and rebuild the duplicate groups.
    ///
    /// The previous groups and selection are discarded before the store is
    /// read, so a failed scan leaves an empty session behind.
    pub async fn scan(&self) -> Result<Vec<DuplicateGroup>, SessionError> {
        let _guard = self.begin()?;

        *self.state() = ScanState::default();

        info!("🔍 Scanning bookmarks...");
        let roots = self.store.enumerate().await?;
        let records = flatten_bookmarks_with_label(&roots, &self.unknown_folder);
        let total = records.len();
        let groups = find_duplicates(records);

        info!(
            "📊 Scanned {} bookmarks: {} duplicate groups, {} redundant entries",
            total,
            groups.len(),
            duplicate_count(&groups)
        );

        let mut state = self.state();
        state.selection = Selection::for_groups(&groups);
        state.groups = groups.clone();
        Ok(groups)
    }

    /// Delete duplicates according to `mode`.
    ///
    /// On success the groups and selection are cleared since their
    /// memberships are stale. When a delete fails, the ids that were
    /// actually deleted leave the groups and the selection, so a retry
    /// resumes at the failed entry.
    /// A cleanup with nothing to delete changes nothing.
    pub async fn cleanup(&self, mode: CleanupMode) -> Result<CleanupOutcome, SessionError> {
        let _guard = self.begin()?;

        let targets = self.targets(mode);
        if targets.is_empty() {
            info!("Nothing to clean up ({} mode)", mode.name());
            return Ok(CleanupOutcome::default());
        }

        info!("🧹 Deleting {} duplicate bookmarks ({} mode)", targets.len(), mode.name());
        match delete_sequentially(&self.store, &targets).await {
            Ok(outcome) => {
                *self.state() = ScanState::default();
                Ok(outcome)
            }
            Err(err) => {
                warn!(
                    "⚠️  Cleanup stopped after {} of {} deletions",
                    err.deleted_count,
                    targets.len()
                );
                self.state().forget(&err.deleted_ids);
                Err(err.into())
            }
        }
    }

    /// Ids a cleanup in `mode` would delete right now.
    pub fn targets(&self, mode: CleanupMode) -> Vec<BookmarkId> {
        let state = self.state();
        cleanup_targets(mode, &state.groups, &state.selection)
    }

    pub fn groups(&self) -> Vec<DuplicateGroup> {
        self.state().groups.clone()
    }

    pub fn toggle(&self, id: &BookmarkId) -> bool {
        self.state().selection.toggle(id)
    }

    pub fn set_all(&self, selected: bool) {
        self.state().selection.set_all(selected);
    }

    pub fn selected_count(&self) -> usize {
        self.state().selection.count()
    }

    pub fn is_all_selected(&self) -> bool {
        self.state().selection.is_all_selected()
    }

    pub fn is_selected(&self, id: &BookmarkId) -> bool {
        self.state().selection.is_selected(id)
    }

    pub fn selected_ids(&self) -> Vec<BookmarkId> {
        self.state().selection.selected_ids().to_vec()
    }

    pub fn clear_selection(&self) {
        self.state().selection.clear();
    }
}
