use crate::reduce::FilterEntry;
use crate::report::Reporter;
use crate::store::{RuleStore, StoreError};

/// Result of synchronizing one filter entry against the rule store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A rule (and, if needed, its destination folder) was created.
    Created,
    /// An equivalent rule already routes this sender to this folder.
    SkippedAlreadyExists,
    /// The store rejected this entry; the rest of the batch continues.
    Failed(StoreError),
}

/// Applies the canonical entries to the store, one at a time, in order.
///
/// Per entry: resolve the destination folder (get-or-create), skip if an
/// equivalent rule already exists, otherwise create the rule and save the
/// rule set. A store failure degrades that entry's outcome to `Failed` and
/// never aborts the batch. Each outcome is reported as it is produced, and
/// the full outcome sequence is returned in input order.
///
/// Entries are processed strictly sequentially: rule-set saves are not safe
/// to interleave, so the loop must not be parallelized.
pub fn synchronize<S: RuleStore>(
    entries: &[FilterEntry],
    store: &mut S,
    reporter: &mut dyn Reporter,
) -> Vec<SyncOutcome> {
    let mut outcomes = Vec::with_capacity(entries.len());
    for entry in entries {
        let outcome = match synchronize_entry(entry, store) {
            Ok(outcome) => outcome,
            Err(e) => SyncOutcome::Failed(e),
        };
        reporter.entry_outcome(entry, &outcome);
        outcomes.push(outcome);
    }
    outcomes
}

fn synchronize_entry<S: RuleStore>(
    entry: &FilterEntry,
    store: &mut S,
) -> Result<SyncOutcome, StoreError> {
    let folder = match store.find_folder(&entry.destination_label)? {
        Some(folder) => folder,
        None => store.create_folder(&entry.destination_label)?,
    };
    let exists = store
        .list_rules()?
        .iter()
        .any(|rule| store.rule_matches(rule, &entry.sender, &folder));
    if exists {
        return Ok(SyncOutcome::SkippedAlreadyExists);
    }
    store.create_rule(&entry.sender, &folder)?;
    store.persist()?;
    Ok(SyncOutcome::Created)
}
