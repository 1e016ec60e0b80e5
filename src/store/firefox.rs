//! Firefox-family `places.sqlite` store (Firefox, Waterfox, LibreWolf).

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, OptionalExtension};
use tracing::{debug, warn};

use super::{BookmarkStore, TimestampKind};
use crate::bookmarks::{BookmarkId, BookmarkNode};
use crate::error::StoreError;

const TYPE_BOOKMARK: i64 = 1;
const TYPE_FOLDER: i64 = 2;

/// Root whose children are tag folders. Each tagged URL gets one extra
/// `type = 1` row per tag under it, pointing at the same place.
const TAGS_ROOT_GUID: &str = "tags________";

#[derive(Debug, Clone)]
pub struct FirefoxStore {
    path: PathBuf,
}

struct PlacesRow {
    id: i64,
    kind: i64,
    parent: i64,
    guid: Option<String>,
    title: String,
    url: Option<String>,
    date_added: Option<i64>,
}

impl FirefoxStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn run_blocking<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Path) -> Result<T, StoreError> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || operation(&path))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
    }
}

impl BookmarkStore for FirefoxStore {
    async fn enumerate(&self) -> Result<Vec<BookmarkNode>, StoreError> {
        self.run_blocking(|path| {
            check_compatibility(path)?;
            let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
            read_places_tree(&conn)
        })
        .await
    }

    async fn delete_entry(&self, id: &BookmarkId) -> Result<(), StoreError> {
        let id = id.clone();
        self.run_blocking(move |path| {
            ensure_exists(path)?;
            if is_database_locked(path) {
                return Err(StoreError::Locked(path.to_path_buf()));
            }
            let mut conn = Connection::open(path)?;
            delete_bookmark(&mut conn, &id)
        })
        .await
    }

    fn timestamp_kind(&self) -> TimestampKind {
        TimestampKind::UnixMicros
    }
}

/// Refuse databases that are missing, held by a running browser, or fail a
/// quick integrity check.
fn check_compatibility(db_path: &Path) -> Result<(), StoreError> {
    ensure_exists(db_path)?;

    if is_database_locked(db_path) {
        return Err(StoreError::Locked(db_path.to_path_buf()));
    }

    let conn = Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let integrity: String = conn.query_row("PRAGMA quick_check", [], |row| row.get(0))?;
    if integrity != "ok" {
        return Err(StoreError::Corrupt(format!("integrity check failed: {}", integrity)));
    }
    Ok(())
}

fn ensure_exists(db_path: &Path) -> Result<(), StoreError> {
    if db_path.exists() {
        return Ok(());
    }
    Err(StoreError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("places database does not exist: {:?}", db_path),
    )))
}

/// A browser holding the profile leaves a lock file next to the database and
/// keeps a write lock on it.
fn is_database_locked(db_path: &Path) -> bool {
    if let Some(parent) = db_path.parent() {
        for lock_file in ["lock", ".parentlock"] {
            let lock_path = parent.join(lock_file);
            if lock_path.exists() {
                debug!("Found lock file: {:?}", lock_path);
                return true;
            }
        }
    }

    match Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_WRITE) {
        Ok(conn) => {
            if let Err(e) = conn.execute_batch("BEGIN IMMEDIATE; ROLLBACK;") {
                debug!("Failed to begin immediate transaction (db likely locked): {}", e);
                return true;
            }
            false
        }
        Err(e) => {
            debug!("Failed to open database for locking check: {}", e);
            true
        }
    }
}

fn read_places_tree(conn: &Connection) -> Result<Vec<BookmarkNode>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT b.id, b.type, b.parent, b.guid, b.title, p.url, b.dateAdded
         FROM moz_bookmarks b
         LEFT JOIN moz_places p ON b.fk = p.id
         WHERE b.type IN (1, 2)
         ORDER BY b.parent, b.position, b.id",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(PlacesRow {
                id: row.get(0)?,
                kind: row.get(1)?,
                parent: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                guid: row.get(3)?,
                title: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                url: row.get(5)?,
                date_added: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let folder_ids: HashSet<i64> = rows
        .iter()
        .filter(|r| r.kind == TYPE_FOLDER)
        .map(|r| r.id)
        .collect();

    let mut children: HashMap<i64, Vec<&PlacesRow>> = HashMap::new();
    let mut roots = Vec::new();
    for row in &rows {
        if folder_ids.contains(&row.parent) {
            children.entry(row.parent).or_default().push(row);
        } else {
            roots.push(row);
        }
    }

    let mut visited = HashSet::new();
    let nodes: Vec<BookmarkNode> = roots
        .into_iter()
        .filter_map(|row| build_node(row, &children, &mut visited))
        .collect();

    debug!("Read {} bookmark rows from places database", rows.len());
    Ok(nodes)
}

fn build_node(
    row: &PlacesRow,
    children: &HashMap<i64, Vec<&PlacesRow>>,
    visited: &mut HashSet<i64>,
) -> Option<BookmarkNode> {
    if !visited.insert(row.id) {
        warn!("⚠️  Bookmark {} appears twice in the folder tree, skipping", row.id);
        return None;
    }

    if row.guid.as_deref() == Some(TAGS_ROOT_GUID) {
        debug!("Skipping tags root {}", row.id);
        return None;
    }

    if row.kind == TYPE_BOOKMARK {
        let Some(url) = &row.url else {
            warn!("⚠️  Bookmark {} has no place entry, skipping", row.id);
            return None;
        };
        return Some(BookmarkNode::Url {
            id: BookmarkId::new(row.id.to_string()),
            title: row.title.clone(),
            url: url.clone(),
            date_added: row.date_added,
        });
    }

    let kids = children
        .get(&row.id)
        .map(|kids| {
            kids.iter()
                .filter_map(|child| build_node(child, children, visited))
                .collect()
        })
        .unwrap_or_default();

    Some(BookmarkNode::Folder {
        id: BookmarkId::new(row.id.to_string()),
        title: row.title.clone(),
        children: kids,
    })
}

/// Delete one bookmark row, close the gap it leaves among its siblings and
/// release its reference on the place.
fn delete_bookmark(conn: &mut Connection, id: &BookmarkId) -> Result<(), StoreError> {
    let Ok(row_id) = id.as_str().parse::<i64>() else {
        return Err(StoreError::NotFound(id.clone()));
    };

    let tx = conn.transaction()?;

    let entry: Option<(i64, Option<i64>, i64, i64)> = tx
        .query_row(
            "SELECT type, fk, parent, position FROM moz_bookmarks WHERE id = ?1",
            [row_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()?;

    let Some((kind, place, parent, position)) = entry else {
        return Err(StoreError::NotFound(id.clone()));
    };
    if kind != TYPE_BOOKMARK {
        return Err(StoreError::NotFound(id.clone()));
    }

    tx.execute("DELETE FROM moz_bookmarks WHERE id = ?1", [row_id])?;
    tx.execute(
        "UPDATE moz_bookmarks SET position = position - 1 WHERE parent = ?1 AND position > ?2",
        [parent, position],
    )?;
    // Firefox keeps foreign_count up to date with TEMP triggers that only
    // exist while the browser runs.
    if let Some(place) = place {
        tx.execute(
            "UPDATE moz_places SET foreign_count = foreign_count - 1 WHERE id = ?1 AND foreign_count > 0",
            [place],
        )?;
    }
    tx.commit()?;

    debug!("Deleted bookmark {} from places database", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_places_db(path: &Path) {
        let conn = Connection::open(path).unwrap();
        conn.execute_batch(
            "CREATE TABLE moz_places (
                 id INTEGER PRIMARY KEY, url TEXT, title TEXT, foreign_count INTEGER NOT NULL DEFAULT 0
             );
             CREATE TABLE moz_bookmarks (
                 id INTEGER PRIMARY KEY, type INTEGER, fk INTEGER, parent INTEGER,
                 position INTEGER, title TEXT, dateAdded INTEGER, lastModified INTEGER, guid TEXT
             );
             INSERT INTO moz_places (id, url, foreign_count) VALUES
                 (1, 'https://a.com/', 1), (2, 'http://a.com', 1), (3, 'https://b.com', 2), (4, 'https://c.com', 2);
             INSERT INTO moz_bookmarks (id, type, fk, parent, position, title, dateAdded, guid) VALUES
                 (1, 2, NULL, 0, 0, '', 0, 'root________'),
                 (2, 2, NULL, 1, 0, 'menu', 0, 'menu________'),
                 (3, 2, NULL, 1, 1, 'toolbar', 0, 'toolbar_____'),
                 (4, 2, NULL, 1, 2, 'tags', 0, 'tags________'),
                 (5, 2, NULL, 1, 3, 'unfiled', 0, 'unfiled_____'),
                 (6, 2, NULL, 1, 4, 'mobile', 0, 'mobile______'),
                 (10, 1, 1, 3, 0, 'A', 100, 'bookmark10__'),
                 (11, 1, 2, 3, 1, 'A newer', 200, 'bookmark11__'),
                 (12, 1, 3, 3, 2, 'B', 50, 'bookmark12__'),
                 (13, 1, 3, 2, 0, 'B in menu', 10, 'bookmark13__'),
                 (14, 1, 4, 5, 0, 'C', 300, 'bookmark14__'),
                 (20, 2, NULL, 4, 0, 'lang', 400, 'tagfolder20_'),
                 (21, 1, 4, 20, 0, NULL, 500, 'tagentry21__');",
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_enumerate_builds_folder_tree() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("places.sqlite");
        create_places_db(&path);

        let roots = FirefoxStore::new(&path).enumerate().await.unwrap();
        assert_eq!(roots.len(), 1);
        let BookmarkNode::Folder { children, .. } = &roots[0] else {
            panic!("expected places root folder");
        };
        let titles: Vec<_> = children.iter().map(|c| c.title()).collect();
        assert_eq!(titles, vec!["menu", "toolbar", "unfiled", "mobile"]);

        let BookmarkNode::Folder { children: toolbar, .. } = &children[1] else {
            panic!("expected toolbar folder");
        };
        assert_eq!(toolbar[1], BookmarkNode::url("11", "A newer", "http://a.com", Some(200)));
    }

    #[tokio::test]
    async fn test_tag_entries_are_not_bookmarks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("places.sqlite");
        create_places_db(&path);

        let roots = FirefoxStore::new(&path).enumerate().await.unwrap();
        let records = crate::enumerate::flatten_bookmarks(&roots);
        assert!(records.iter().all(|r| r.id.as_str() != "21"));
        assert!(records.iter().any(|r| r.id.as_str() == "14"));

        let keys: Vec<_> = crate::grouping::find_duplicates(records)
            .into_iter()
            .map(|g| g.key)
            .collect();
        assert_eq!(keys, vec!["b.com", "a.com"]);
    }

    #[tokio::test]
    async fn test_delete_releases_place_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("places.sqlite");
        create_places_db(&path);

        FirefoxStore::new(&path).delete_entry(&BookmarkId::new("12")).await.unwrap();

        let conn = Connection::open(&path).unwrap();
        let count: i64 = conn
            .query_row("SELECT foreign_count FROM moz_places WHERE id = 3", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_delete_closes_position_gap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("places.sqlite");
        create_places_db(&path);
        let store = FirefoxStore::new(&path);

        store.delete_entry(&BookmarkId::new("10")).await.unwrap();

        let conn = Connection::open(&path).unwrap();
        let positions: Vec<(i64, i64)> = conn
            .prepare("SELECT id, position FROM moz_bookmarks WHERE parent = 3 ORDER BY position")
            .unwrap()
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(positions, vec![(11, 0), (12, 1)]);
    }

    #[tokio::test]
    async fn test_delete_folder_or_unknown_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("places.sqlite");
        create_places_db(&path);
        let store = FirefoxStore::new(&path);

        for id in ["3", "999", "not-a-number"] {
            let err = store.delete_entry(&BookmarkId::new(id)).await.unwrap_err();
            assert!(matches!(err, StoreError::NotFound(_)), "{}: {:?}", id, err);
        }
    }

    #[tokio::test]
    async fn test_lock_file_rejects_access() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("places.sqlite");
        create_places_db(&path);
        std::fs::write(dir.path().join(".parentlock"), b"").unwrap();

        let store = FirefoxStore::new(&path);
        assert!(matches!(store.enumerate().await, Err(StoreError::Locked(_))));
        assert!(matches!(
            store.delete_entry(&BookmarkId::new("10")).await,
            Err(StoreError::Locked(_))
        ));
    }
}
