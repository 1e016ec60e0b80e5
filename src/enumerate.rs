//! Flatten a bookmark tree into records annotated with their folder path.

use crate::bookmarks::{BookmarkNode, BookmarkRecord};

/// Separator between folder titles in a record's path.
pub const PATH_SEPARATOR: &str = " / ";

/// Label used when a bookmark's containing folder has no resolvable path.
pub const UNKNOWN_FOLDER: &str = "unknown folder";

/// Walk `roots` depth-first and collect every url node in tree order.
///
/// Folder paths are computed once per walk: a node's path is its parent's
/// path joined with the node title. Root nodes start from an empty parent
/// path and empty titles are skipped.
pub fn flatten_bookmarks(roots: &[BookmarkNode]) -> Vec<BookmarkRecord> {
    flatten_bookmarks_with_label(roots, UNKNOWN_FOLDER)
}

/// Same as [`flatten_bookmarks`] with a custom unknown-folder label.
pub fn flatten_bookmarks_with_label(roots: &[BookmarkNode], unknown_folder: &str) -> Vec<BookmarkRecord> {
    let mut records = Vec::new();
    collect_records(roots, "", unknown_folder, &mut records);
    records
}

fn collect_records(
    nodes: &[BookmarkNode],
    parent_path: &str,
    unknown_folder: &str,
    records: &mut Vec<BookmarkRecord>,
) {
    for node in nodes {
        match node {
            BookmarkNode::Url { id, title, url, date_added } => {
                let path = if parent_path.is_empty() {
                    unknown_folder.to_string()
                } else {
                    parent_path.to_string()
                };
                records.push(BookmarkRecord {
                    id: id.clone(),
                    title: title.clone(),
                    url: url.clone(),
                    date_added: *date_added,
                    path,
                });
            }
            BookmarkNode::Folder { title, children, .. } => {
                let path = join_path(parent_path, title);
                collect_records(children, &path, unknown_folder, records);
            }
        }
    }
}

fn join_path(parent: &str, title: &str) -> String {
    match (parent.is_empty(), title.is_empty()) {
        (_, true) => parent.to_string(),
        (true, false) => title.to_string(),
        (false, false) => format!("{}{}{}", parent, PATH_SEPARATOR, title),
    }
}
