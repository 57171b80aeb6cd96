use crate::feed::{EntryProperties, PropertyName};
use std::collections::HashSet;

/// A canonical sender-to-folder mapping ready for synchronization.
///
/// Two entries are equivalent iff both fields are equal, exactly as emitted
/// by the feed (case-sensitive). That identity drives deduplication and the
/// already-exists check during synchronization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterEntry {
    pub sender: String,
    pub destination_label: String,
}

/// The canonical entries of one feed, plus the number of entry groups that
/// were discarded as incomplete.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Reduction {
    pub entries: Vec<FilterEntry>,
    pub discarded: usize,
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Reduces raw per-entry property groups to the canonical entry set.
///
/// Within one group the last occurrence of each property wins, matching
/// feeds where a later property overrides an earlier one for the same
/// logical field. A group missing a usable sender or label is discarded and
/// counted. Duplicate mappings across groups collapse to one entry,
/// preserving first-seen order.
pub fn reduce_entries(groups: Vec<EntryProperties>) -> Reduction {
    let mut seen = HashSet::new();
    let mut reduction = Reduction::default();
    for group in groups {
        let mut sender = None;
        let mut label = None;
        for property in group {
            match property.name {
                PropertyName::From => sender = Some(property.value),
                PropertyName::Label => label = Some(property.value),
            }
        }
        let entry = match (sender, label) {
            (Some(sender), Some(label)) if !is_blank(&sender) && !is_blank(&label) => {
                FilterEntry {
                    sender,
                    destination_label: label,
                }
            }
            _ => {
                reduction.discarded += 1;
                continue;
            }
        };
        if seen.insert(entry.clone()) {
            reduction.entries.push(entry);
        }
    }
    reduction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::RawProperty;

    fn from(value: &str) -> RawProperty {
        RawProperty {
            name: PropertyName::From,
            value: value.to_string(),
        }
    }

    fn label(value: &str) -> RawProperty {
        RawProperty {
            name: PropertyName::Label,
            value: value.to_string(),
        }
    }

    fn entry(sender: &str, destination_label: &str) -> FilterEntry {
        FilterEntry {
            sender: sender.to_string(),
            destination_label: destination_label.to_string(),
        }
    }

    #[test]
    fn test_last_occurrence_wins_within_group() {
        let reduction = reduce_entries(vec![vec![
            from("a@x.com"),
            label("Work"),
            from("b@x.com"),
        ]]);
        assert_eq!(reduction.entries, vec![entry("b@x.com", "Work")]);
        assert_eq!(reduction.discarded, 0);
    }

    #[test]
    fn test_incomplete_groups_are_discarded_and_counted() {
        let reduction = reduce_entries(vec![
            vec![label("Work")],
            vec![from("a@x.com"), label("Work")],
            vec![from("b@x.com")],
            vec![],
        ]);
        assert_eq!(reduction.entries, vec![entry("a@x.com", "Work")]);
        assert_eq!(reduction.discarded, 3);
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let reduction = reduce_entries(vec![
            vec![from("a@x.com"), label("  ")],
            vec![from(""), label("Work")],
            // The blank later occurrence wins, then fails validation.
            vec![from("a@x.com"), from(""), label("Work")],
        ]);
        assert_eq!(reduction.entries, Vec::new());
        assert_eq!(reduction.discarded, 3);
    }

    #[test]
    fn test_duplicate_mappings_collapse_preserving_order() {
        let reduction = reduce_entries(vec![
            vec![from("a@x.com"), label("Work")],
            vec![from("b@x.com"), label("Archive")],
            vec![from("a@x.com"), label("Work")],
        ]);
        assert_eq!(
            reduction.entries,
            vec![entry("a@x.com", "Work"), entry("b@x.com", "Archive")]
        );
        assert_eq!(reduction.discarded, 0);
    }

    #[test]
    fn test_same_sender_different_label_stays_distinct() {
        let reduction = reduce_entries(vec![
            vec![from("a@x.com"), label("Work")],
            vec![from("a@x.com"), label("Archive")],
        ]);
        assert_eq!(
            reduction.entries,
            vec![entry("a@x.com", "Work"), entry("a@x.com", "Archive")]
        );
    }
}
