use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::BookmarkStore;
use crate::bookmarks::{BookmarkId, BookmarkNode};
use crate::error::StoreError;

/// In-process bookmark tree, for hosts that own the data themselves and for
/// tests. Delete calls are recorded in the order they were made.
#[derive(Debug, Default)]
pub struct MemoryStore {
    roots: Mutex<Vec<BookmarkNode>>,
    delete_calls: Mutex<Vec<BookmarkId>>,
    failures: Mutex<HashMap<BookmarkId, String>>,
    fail_enumerate: Mutex<Option<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new(roots: Vec<BookmarkNode>) -> Self {
        Self {
            roots: Mutex::new(roots),
            ..Self::default()
        }
    }

    /// Make every delete of `id` fail with an I/O error carrying `reason`.
    pub fn fail_delete(&self, id: impl Into<BookmarkId>, reason: impl Into<String>) {
        lock(&self.failures).insert(id.into(), reason.into());
    }

    /// Make the next enumerations fail with an I/O error carrying `reason`.
    pub fn fail_enumerate(&self, reason: impl Into<String>) {
        *lock(&self.fail_enumerate) = Some(reason.into());
    }

    /// Every id `delete_entry` was called with, including failed calls.
    pub fn delete_calls(&self) -> Vec<BookmarkId> {
        lock(&self.delete_calls).clone()
    }

    pub fn snapshot(&self) -> Vec<BookmarkNode> {
        lock(&self.roots).clone()
    }

    /// Whether a url node with `id` is still present.
    pub fn contains(&self, id: &BookmarkId) -> bool {
        fn walk(nodes: &[BookmarkNode], id: &BookmarkId) -> bool {
            nodes.iter().any(|node| match node {
                BookmarkNode::Url { id: node_id, .. } => node_id == id,
                BookmarkNode::Folder { children, .. } => walk(children, id),
            })
        }
        walk(&lock(&self.roots), id)
    }
}

fn remove_url(nodes: &mut Vec<BookmarkNode>, id: &BookmarkId) -> bool {
    if let Some(index) = nodes
        .iter()
        .position(|node| matches!(node, BookmarkNode::Url { id: node_id, .. } if node_id == id))
    {
        nodes.remove(index);
        return true;
    }
    nodes.iter_mut().any(|node| match node {
        BookmarkNode::Folder { children, .. } => remove_url(children, id),
        BookmarkNode::Url { .. } => false,
    })
}

impl BookmarkStore for MemoryStore {
    async fn enumerate(&self) -> Result<Vec<BookmarkNode>, StoreError> {
        if let Some(reason) = lock(&self.fail_enumerate).clone() {
            return Err(StoreError::Io(std::io::Error::other(reason)));
        }
        Ok(self.snapshot())
    }

    async fn delete_entry(&self, id: &BookmarkId) -> Result<(), StoreError> {
        lock(&self.delete_calls).push(id.clone());

        if let Some(reason) = lock(&self.failures).get(id).cloned() {
            return Err(StoreError::Io(std::io::Error::other(reason)));
        }

        if remove_url(&mut lock(&self.roots), id) {
            Ok(())
        } else {
            Err(StoreError::NotFound(id.clone()))
        }
    }
}
