//! Operator selection of duplicate bookmarks slated for deletion.

use std::collections::HashSet;

use tracing::debug;

use crate::bookmarks::{BookmarkId, DuplicateGroup};

/// Tracks which non-canonical group members are selected.
///
/// Only ids in `items[1..]` of the groups the selection was built for can
/// ever be selected; anything else passed to [`Selection::toggle`] is ignored.
/// Selected ids are kept in the order they were selected.
#[derive(Debug, Default, Clone)]
pub struct Selection {
    /// Non-canonical ids in group/member order.
    selectable: Vec<BookmarkId>,
    selectable_set: HashSet<BookmarkId>,
    selected: Vec<BookmarkId>,
    selected_set: HashSet<BookmarkId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty selection over the deletion candidates of `groups`.
    pub fn for_groups(groups: &[DuplicateGroup]) -> Self {
        let selectable: Vec<BookmarkId> = groups
            .iter()
            .flat_map(|g| g.duplicates().iter().map(|r| r.id.clone()))
            .collect();
        let selectable_set = selectable.iter().cloned().collect();
        Self {
            selectable,
            selectable_set,
            selected: Vec::new(),
            selected_set: HashSet::new(),
        }
    }

    /// Flip the selection state of `id`. Returns whether it is now selected.
    pub fn toggle(&mut self, id: &BookmarkId) -> bool {
        if !self.selectable_set.contains(id) {
            debug!("Ignoring toggle for non-selectable bookmark {}", id);
            return false;
        }

        if self.selected_set.remove(id) {
            self.selected.retain(|s| s != id);
            debug!("Deselected: {}", id);
            false
        } else {
            self.selected_set.insert(id.clone());
            self.selected.push(id.clone());
            debug!("Selected: {}", id);
            true
        }
    }

    /// Select or deselect every deletion candidate.
    pub fn set_all(&mut self, selected: bool) {
        if selected {
            for id in &self.selectable {
                if self.selected_set.insert(id.clone()) {
                    self.selected.push(id.clone());
                }
            }
            debug!("Selected all {} duplicates", self.selected.len());
        } else {
            let count = self.selected.len();
            self.clear();
            debug!("Deselected all {} duplicates", count);
        }
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// True when there is at least one candidate and all of them are selected.
    pub fn is_all_selected(&self) -> bool {
        !self.selectable.is_empty() && self.selected.len() == self.selectable.len()
    }

    pub fn is_selected(&self, id: &BookmarkId) -> bool {
        self.selected_set.contains(id)
    }

    pub fn is_selectable(&self, id: &BookmarkId) -> bool {
        self.selectable_set.contains(id)
    }

    pub fn selectable_count(&self) -> usize {
        self.selectable.len()
    }

    /// Selected ids in selection order.
    pub fn selected_ids(&self) -> &[BookmarkId] {
        &self.selected
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.selected_set.clear();
    }

    /// Drop the given ids from both the selection and the candidate set.
    pub fn forget(&mut self, ids: &[BookmarkId]) {
        let gone: HashSet<&BookmarkId> = ids.iter().collect();
        self.selected.retain(|id| !gone.contains(id));
        self.selected_set.retain(|id| !gone.contains(id));
        self.selectable.retain(|id| !gone.contains(id));
        self.selectable_set.retain(|id| !gone.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::find_duplicates;
    use crate::bookmarks::BookmarkRecord;

    fn record(id: &str, url: &str, date_added: i64) -> BookmarkRecord {
        BookmarkRecord {
            id: BookmarkId::new(id),
            title: String::new(),
            url: url.to_string(),
            date_added: Some(date_added),
            path: "Bookmarks Bar".to_string(),
        }
    }

    fn sample_groups() -> Vec<DuplicateGroup> {
        find_duplicates(vec![
            record("1", "https://a.com", 1),
            record("2", "https://a.com", 2),
            record("3", "https://a.com", 3),
            record("4", "https://b.com", 1),
            record("5", "https://b.com", 2),
            record("6", "https://c.com", 1),
        ])
    }

    fn id(s: &str) -> BookmarkId {
        BookmarkId::new(s)
    }

    #[test]
    fn test_toggle_adds_and_removes() {
        let mut selection = Selection::for_groups(&sample_groups());
        assert!(selection.toggle(&id("1")));
        assert!(selection.is_selected(&id("1")));
        assert_eq!(selection.count(), 1);
        assert!(!selection.toggle(&id("1")));
        assert_eq!(selection.count(), 0);
    }

    #[test]
    fn test_canonical_and_unknown_ids_ignored() {
        let mut selection = Selection::for_groups(&sample_groups());
        // "3" and "5" are the newest of their groups, "6" is not duplicated.
        assert!(!selection.toggle(&id("3")));
        assert!(!selection.toggle(&id("5")));
        assert!(!selection.toggle(&id("6")));
        assert!(!selection.toggle(&id("nope")));
        assert_eq!(selection.count(), 0);
    }

    #[test]
    fn test_set_all_and_is_all_selected() {
        let mut selection = Selection::for_groups(&sample_groups());
        assert!(!selection.is_all_selected());

        selection.set_all(true);
        assert!(selection.is_all_selected());
        assert_eq!(selection.count(), 3);

        selection.toggle(&id("4"));
        assert!(!selection.is_all_selected());
        assert_eq!(selection.count(), 2);

        selection.set_all(false);
        assert_eq!(selection.count(), 0);
    }

    #[test]
    fn test_set_all_keeps_existing_order() {
        let mut selection = Selection::for_groups(&sample_groups());
        selection.toggle(&id("4"));
        selection.set_all(true);
        assert_eq!(selection.selected_ids(), &[id("4"), id("2"), id("1")]);
    }

    #[test]
    fn test_empty_groups_never_all_selected() {
        let mut selection = Selection::for_groups(&[]);
        selection.set_all(true);
        assert!(!selection.is_all_selected());
        assert_eq!(selection.count(), 0);
    }

    #[test]
    fn test_forget_removes_candidates() {
        let mut selection = Selection::for_groups(&sample_groups());
        selection.set_all(true);
        selection.forget(&[id("2")]);
        assert_eq!(selection.count(), 2);
        assert_eq!(selection.selectable_count(), 2);
        assert!(!selection.toggle(&id("2")));
        assert!(selection.is_all_selected());
    }
}
