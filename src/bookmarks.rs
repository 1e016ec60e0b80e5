use std::fmt;

/// Opaque identifier assigned by the bookmark store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BookmarkId(String);

impl BookmarkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookmarkId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BookmarkId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A node of the store's bookmark tree as handed to the enumerator.
#[derive(Debug, Clone, PartialEq)]
pub enum BookmarkNode {
    Url {
        id: BookmarkId,
        title: String,
        url: String,
        date_added: Option<i64>,
    },
    Folder {
        id: BookmarkId,
        title: String,
        children: Vec<BookmarkNode>,
    },
}

impl BookmarkNode {
    pub fn url(
        id: impl Into<BookmarkId>,
        title: impl Into<String>,
        url: impl Into<String>,
        date_added: Option<i64>,
    ) -> Self {
        BookmarkNode::Url {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            date_added,
        }
    }

    pub fn folder(
        id: impl Into<BookmarkId>,
        title: impl Into<String>,
        children: Vec<BookmarkNode>,
    ) -> Self {
        BookmarkNode::Folder {
            id: id.into(),
            title: title.into(),
            children,
        }
    }

    pub fn id(&self) -> &BookmarkId {
        match self {
            BookmarkNode::Url { id, .. } | BookmarkNode::Folder { id, .. } => id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            BookmarkNode::Url { title, .. } | BookmarkNode::Folder { title, .. } => title,
        }
    }
}

/// One leaf bookmark, flattened out of the tree with its folder path.
#[derive(Debug, Clone, PartialEq)]
pub struct BookmarkRecord {
    pub id: BookmarkId,
    pub title: String,
    pub url: String,
    /// Creation timestamp in the store's native unit. Only used for ordering.
    pub date_added: Option<i64>,
    pub path: String,
}

/// Bookmarks that share one normalized URL, newest first.
///
/// `items[0]` is the entry that survives a cleanup; everything after it is a
/// deletion candidate. Groups always hold at least two items.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup {
    pub key: String,
    pub items: Vec<BookmarkRecord>,
}

impl DuplicateGroup {
    pub fn keep(&self) -> Option<&BookmarkRecord> {
        self.items.first()
    }

    pub fn duplicates(&self) -> &[BookmarkRecord] {
        self.items.get(1..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
