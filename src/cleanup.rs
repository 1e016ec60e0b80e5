//! Sequential deletion of duplicate bookmarks.
//!
//! Deletes are issued one at a time and each is awaited before the next: the
//! stores shift sibling indexes on every removal, so concurrent deletes in the
//! same tree are not safe. The first failure stops the run.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::bookmarks::{BookmarkId, DuplicateGroup};
use crate::error::DeletionError;
use crate::selection::Selection;
use crate::store::BookmarkStore;

/// Which bookmarks a cleanup deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanupMode {
    /// Keep the newest entry of every group and delete the rest.
    #[default]
    Policy,
    /// Delete exactly the operator's selection.
    Selected,
}

impl CleanupMode {
    pub fn name(&self) -> &'static str {
        match self {
            CleanupMode::Policy => "keep newest",
            CleanupMode::Selected => "selected only",
        }
    }
}

/// Result of a cleanup that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupOutcome {
    pub deleted_count: usize,
    pub deleted_ids: Vec<BookmarkId>,
}

/// Ids a cleanup in `mode` would delete, in deletion order.
///
/// Policy mode walks groups and members in order; selected mode follows the
/// order in which the ids were selected.
pub fn cleanup_targets(mode: CleanupMode, groups: &[DuplicateGroup], selection: &Selection) -> Vec<BookmarkId> {
    match mode {
        CleanupMode::Policy => groups
            .iter()
            .flat_map(|g| g.duplicates().iter().map(|r| r.id.clone()))
            .collect(),
        CleanupMode::Selected => selection
            .selected_ids()
            .iter()
            .filter(|id| selection.is_selectable(id))
            .cloned()
            .collect(),
    }
}

/// Delete `ids` one by one through `store`.
///
/// Stops at the first failed delete; the ids after it are never attempted.
pub async fn delete_sequentially<S>(store: &S, ids: &[BookmarkId]) -> Result<CleanupOutcome, DeletionError>
where
    S: BookmarkStore,
{
    let mut outcome = CleanupOutcome::default();

    for id in ids {
        if let Err(source) = store.delete_entry(id).await {
            error!("❌ Failed to delete bookmark {}: {}", id, source);
            return Err(DeletionError {
                deleted_count: outcome.deleted_count,
                deleted_ids: outcome.deleted_ids,
                failed_id: id.clone(),
                source,
            });
        }
        debug!("🗑️  Deleted bookmark {}", id);
        outcome.deleted_count += 1;
        outcome.deleted_ids.push(id.clone());
    }

    info!("✅ Deleted {} duplicate bookmarks", outcome.deleted_count);
    Ok(outcome)
}
