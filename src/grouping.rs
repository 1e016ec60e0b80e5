//! Duplicate detection over flattened bookmark records.

use std::collections::HashMap;

use tracing::debug;

use crate::bookmarks::{BookmarkRecord, DuplicateGroup};
use crate::normalize::normalize_url;

/// Partition `records` by normalized URL and keep only keys seen more than once.
///
/// Groups come out in the order their key was first seen. Inside a group the
/// items are sorted newest first by `date_added`; the sort is stable and
/// bookmarks without a timestamp sort last, so they are never the kept entry
/// while a timestamped sibling exists.
pub fn find_duplicates(records: Vec<BookmarkRecord>) -> Vec<DuplicateGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(String, Vec<BookmarkRecord>)> = Vec::new();

    for record in records {
        let key = normalize_url(&record.url);
        match index.get(&key).copied() {
            Some(slot) => buckets[slot].1.push(record),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push((key, vec![record]));
            }
        }
    }

    let groups: Vec<DuplicateGroup> = buckets
        .into_iter()
        .filter(|(_, items)| items.len() > 1)
        .map(|(key, mut items)| {
            // None < Some(_), so descending order puts missing timestamps last.
            items.sort_by(|a, b| b.date_added.cmp(&a.date_added));
            DuplicateGroup { key, items }
        })
        .collect();

    debug!("Found {} duplicate groups", groups.len());
    groups
}

/// Total number of deletion candidates across `groups`.
pub fn duplicate_count(groups: &[DuplicateGroup]) -> usize {
    groups.iter().map(|g| g.duplicates().len()).sum()
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::bookmarks::BookmarkId;
    use proptest::prelude::*;

    fn records() -> impl Strategy<Value = Vec<BookmarkRecord>> {
        let url = prop_oneof![
            Just("https://a.com"),
            Just("http://a.com/"),
            Just("https://b.com"),
            Just("https://c.com/x"),
            Just("HTTPS://C.COM/X/"),
            Just("https://d.com"),
        ];
        prop::collection::vec((url, prop::option::of(0i64..5)), 0..30).prop_map(|entries| {
            entries
                .into_iter()
                .enumerate()
                .map(|(i, (url, date_added))| BookmarkRecord {
                    id: BookmarkId::new(i.to_string()),
                    title: String::new(),
                    url: url.to_string(),
                    date_added,
                    path: "Folder".to_string(),
                })
                .collect()
        })
    }

    fn position(input: &[BookmarkRecord], id: &BookmarkId) -> usize {
        input.iter().position(|r| &r.id == id).unwrap_or(usize::MAX)
    }

    proptest! {
        #[test]
        fn prop_groups_have_at_least_two_items(input in records()) {
            let groups = find_duplicates(input.clone());
            for group in &groups {
                prop_assert!(group.items.len() >= 2);
            }
            for record in &input {
                let key = normalize_url(&record.url);
                let multiplicity = input.iter().filter(|r| normalize_url(&r.url) == key).count();
                let grouped = groups.iter().any(|g| g.key == key);
                prop_assert_eq!(grouped, multiplicity > 1);
            }
        }

        #[test]
        fn prop_items_sorted_and_stable(input in records()) {
            for group in find_duplicates(input.clone()) {
                for pair in group.items.windows(2) {
                    prop_assert!(pair[0].date_added >= pair[1].date_added);
                    if pair[0].date_added == pair[1].date_added {
                        prop_assert!(position(&input, &pair[0].id) < position(&input, &pair[1].id));
                    }
                }
            }
        }

        #[test]
        fn prop_regrouping_a_group_is_identity(input in records()) {
            for group in find_duplicates(input) {
                let regrouped = find_duplicates(group.items.clone());
                prop_assert_eq!(regrouped, vec![group]);
            }
        }
    }
}
