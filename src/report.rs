use chrono::{DateTime, Utc};

use crate::bookmarks::{BookmarkId, DuplicateGroup};
use crate::cleanup::CleanupOutcome;
use crate::error::DeletionError;
use crate::store::TimestampKind;

/// Seconds between 1601-01-01 and 1970-01-01.
const WEBKIT_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

pub fn to_datetime(value: i64, kind: TimestampKind) -> Option<DateTime<Utc>> {
    match kind {
        TimestampKind::UnixMillis => DateTime::from_timestamp_millis(value),
        TimestampKind::UnixMicros => DateTime::from_timestamp_micros(value),
        TimestampKind::WebkitMicros => {
            let micros = value.checked_sub(WEBKIT_EPOCH_OFFSET_SECS.checked_mul(1_000_000)?)?;
            DateTime::from_timestamp_micros(micros)
        }
    }
}

pub fn format_timestamp(value: Option<i64>, kind: TimestampKind) -> String {
    match value.and_then(|v| to_datetime(v, kind)) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "unknown date".to_string(),
    }
}

/// Text rendering of a scan for the terminal.
pub struct ScanReport<'a> {
    groups: &'a [DuplicateGroup],
    timestamps: TimestampKind,
    selected: Option<&'a [BookmarkId]>,
}

impl<'a> ScanReport<'a> {
    pub fn new(groups: &'a [DuplicateGroup], timestamps: TimestampKind) -> Self {
        Self {
            groups,
            timestamps,
            selected: None,
        }
    }

    /// Badge duplicates by selection instead of marking them all for deletion.
    pub fn with_selection(mut self, selected: &'a [BookmarkId]) -> Self {
        self.selected = Some(selected);
        self
    }

    fn badge(&self, index: usize, id: &BookmarkId) -> &'static str {
        if index == 0 {
            return "[keep]";
        }
        match self.selected {
            Some(selected) if !selected.contains(id) => "[    ]",
            _ => "[delete]",
        }
    }

    pub fn format(&self, detailed: bool) -> String {
        let mut output = String::new();

        output.push_str("\n🔍 Duplicate Bookmark Report\n");
        output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

        if self.groups.is_empty() {
            output.push_str("✅ No duplicate bookmarks\n");
        }

        for (index, group) in self.groups.iter().enumerate() {
            output.push_str(&format!(
                "🔄 Duplicate group {}: {} items\n",
                index + 1,
                group.items.len()
            ));
            for (item_index, item) in group.items.iter().enumerate() {
                let title = if item.title.is_empty() { &item.url } else { &item.title };
                output.push_str(&format!(
                    "  {} {} ({})\n",
                    self.badge(item_index, &item.id),
                    title,
                    item.id
                ));
                if detailed {
                    output.push_str(&format!("      URL:    {}\n", item.url));
                    output.push_str(&format!("      Folder: {}\n", item.path));
                    output.push_str(&format!(
                        "      Added:  {}\n",
                        format_timestamp(item.date_added, self.timestamps)
                    ));
                }
            }
            output.push('\n');
        }

        output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

        let redundant: usize = self.groups.iter().map(|g| g.duplicates().len()).sum();
        output.push_str(&format!(
            "\n📊 Summary: {} duplicate groups, {} redundant bookmarks\n",
            self.groups.len(),
            redundant
        ));
        if let Some(selected) = self.selected {
            output.push_str(&format!("   Selected for deletion: {}\n", selected.len()));
        }
        output.push('\n');

        output
    }
}

pub fn format_cleanup(outcome: &CleanupOutcome) -> String {
    format!("✅ Cleanup complete: deleted {} duplicate bookmarks", outcome.deleted_count)
}

pub fn format_cleanup_failure(err: &DeletionError) -> String {
    format!(
        "❌ Cleanup failed at bookmark {}: {}\n   {} bookmarks were deleted before the failure; rescan before cleaning again",
        err.failed_id, err.source, err.deleted_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmarks::BookmarkRecord;
    use crate::error::StoreError;

    fn group() -> Vec<DuplicateGroup> {
        let record = |id: &str, title: &str, date_added| BookmarkRecord {
            id: BookmarkId::new(id),
            title: title.to_string(),
            url: "https://a.com".to_string(),
            date_added,
            path: "Bookmarks Bar / Dev".to_string(),
        };
        vec![DuplicateGroup {
            key: "a.com".to_string(),
            items: vec![
                record("2", "Newest", Some(1_700_000_000_000)),
                record("1", "", Some(1_600_000_000_000)),
                record("3", "Undated", None),
            ],
        }]
    }

    #[test]
    fn test_badges_without_selection() {
        let groups = group();
        let text = ScanReport::new(&groups, TimestampKind::UnixMillis).format(false);
        assert!(text.contains("Duplicate group 1: 3 items"));
        assert!(text.contains("[keep] Newest (2)"));
        assert!(text.contains("[delete] https://a.com (1)"));
        assert!(text.contains("2 redundant bookmarks"));
        assert!(!text.contains("Folder:"));
    }

    #[test]
    fn test_badges_follow_selection() {
        let groups = group();
        let selected = vec![BookmarkId::new("3")];
        let text = ScanReport::new(&groups, TimestampKind::UnixMillis)
            .with_selection(&selected)
            .format(true);
        assert!(text.contains("[delete] Undated (3)"));
        assert!(text.contains("[    ] https://a.com (1)"));
        assert!(text.contains("Folder: Bookmarks Bar / Dev"));
        assert!(text.contains("Added:  2023-11-14"));
        assert!(text.contains("Added:  unknown date"));
        assert!(text.contains("Selected for deletion: 1"));
    }

    #[test]
    fn test_empty_report() {
        let text = ScanReport::new(&[], TimestampKind::UnixMillis).format(false);
        assert!(text.contains("No duplicate bookmarks"));
    }

    #[test]
    fn test_timestamp_kinds() {
        let unix = format_timestamp(Some(1_700_000_000_000_000), TimestampKind::UnixMicros);
        assert_eq!(unix, "2023-11-14 22:13");
        let webkit = format_timestamp(
            Some(1_700_000_000_000_000 + WEBKIT_EPOCH_OFFSET_SECS * 1_000_000),
            TimestampKind::WebkitMicros,
        );
        assert_eq!(webkit, unix);
    }

    #[test]
    fn test_failure_message() {
        let err = DeletionError {
            deleted_count: 1,
            deleted_ids: vec![BookmarkId::new("1")],
            failed_id: BookmarkId::new("2"),
            source: StoreError::NotFound(BookmarkId::new("2")),
        };
        let text = format_cleanup_failure(&err);
        assert!(text.contains("failed at bookmark 2"));
        assert!(text.contains("1 bookmarks were deleted"));
    }
}
