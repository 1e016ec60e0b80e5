use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{BookmarkStore, TimestampKind};
use crate::bookmarks::{BookmarkId, BookmarkNode};
use crate::error::StoreError;

/// Chromium-family `Bookmarks` JSON file (Chrome, Brave, Edge, ...).
#[derive(Debug)]
pub struct ChromiumStore {
    path: PathBuf,
    backup: bool,
    backed_up: AtomicBool,
}

impl ChromiumStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup: true,
            backed_up: AtomicBool::new(false),
        }
    }

    /// Whether the first delete copies the file to `<file>.json.backup`.
    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        self.path.with_extension("json.backup")
    }

    async fn read_json(&self) -> Result<Value, StoreError> {
        let data = tokio::fs::read_to_string(&self.path).await?;
        let json: Value = serde_json::from_str(&data)?;
        Ok(json)
    }

    async fn backup_once(&self) -> Result<(), StoreError> {
        if !self.backup || self.backed_up.load(Ordering::Acquire) {
            return Ok(());
        }
        let backup_path = self.backup_path();
        tokio::fs::copy(&self.path, &backup_path).await?;
        self.backed_up.store(true, Ordering::Release);
        info!("💾 Backup created: {:?}", backup_path);
        Ok(())
    }
}

impl BookmarkStore for ChromiumStore {
    async fn enumerate(&self) -> Result<Vec<BookmarkNode>, StoreError> {
        let json = self.read_json().await?;
        let roots = parse_chromium_bookmarks(&json)?;
        debug!("Read {} root folders from {:?}", roots.len(), self.path);
        Ok(roots)
    }

    async fn delete_entry(&self, id: &BookmarkId) -> Result<(), StoreError> {
        let mut json = self.read_json().await?;

        let roots = json
            .get_mut("roots")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| StoreError::Corrupt("missing \"roots\" object".to_string()))?;

        let removed = roots.values_mut().any(|root| remove_url_node(root, id.as_str()));
        if !removed {
            return Err(StoreError::NotFound(id.clone()));
        }

        // Chromium recomputes the checksum when it is absent; a stale one
        // makes it discard the file.
        if let Some(obj) = json.as_object_mut() {
            obj.remove("checksum");
        }

        self.backup_once().await?;

        let data = serde_json::to_string_pretty(&json)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, data).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!("Deleted bookmark {} from {:?}", id, self.path);
        Ok(())
    }

    fn timestamp_kind(&self) -> TimestampKind {
        TimestampKind::WebkitMicros
    }
}

fn parse_chromium_bookmarks(json: &Value) -> Result<Vec<BookmarkNode>, StoreError> {
    let roots = json
        .get("roots")
        .and_then(Value::as_object)
        .ok_or_else(|| StoreError::Corrupt("missing \"roots\" object".to_string()))?;

    let mut nodes = Vec::new();
    for (key, root) in roots {
        match parse_chromium_node(root) {
            Some(node) => nodes.push(node),
            None => debug!("Skipping non-bookmark root entry {:?}", key),
        }
    }
    Ok(nodes)
}

fn parse_chromium_node(node: &Value) -> Option<BookmarkNode> {
    let obj = node.as_object()?;
    let id = obj.get("id").and_then(json_id).unwrap_or_default();
    let title = obj.get("name").and_then(Value::as_str).unwrap_or("").to_string();

    match obj.get("type").and_then(Value::as_str) {
        Some("url") => {
            let url = obj.get("url").and_then(Value::as_str)?;
            Some(BookmarkNode::Url {
                id: BookmarkId::new(id),
                title,
                url: url.to_string(),
                date_added: obj.get("date_added").and_then(json_timestamp),
            })
        }
        Some("folder") | None if obj.contains_key("children") => {
            let children = obj
                .get("children")
                .and_then(Value::as_array)
                .map(|children| children.iter().filter_map(parse_chromium_node).collect())
                .unwrap_or_default();
            Some(BookmarkNode::Folder {
                id: BookmarkId::new(id),
                title,
                children,
            })
        }
        other => {
            warn!("⚠️  Unknown Chromium node type {:?} (id {})", other, id);
            None
        }
    }
}

/// Chromium writes ids and timestamps as JSON strings, older exports as numbers.
fn json_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_timestamp(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

/// Remove the url node with `id` from anywhere below `node`.
fn remove_url_node(node: &mut Value, id: &str) -> bool {
    let Some(children) = node.get_mut("children").and_then(Value::as_array_mut) else {
        return false;
    };

    let position = children.iter().position(|child| {
        child.get("type").and_then(Value::as_str) == Some("url")
            && child.get("id").and_then(json_id).as_deref() == Some(id)
    });

    if let Some(index) = position {
        children.remove(index);
        return true;
    }

    children.iter_mut().any(|child| remove_url_node(child, id))
}
