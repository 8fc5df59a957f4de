//! Duplicate reconciliation keyed by document filename.
//!
//! The first occurrence of a filename in read order is the one that survives.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::info;

use crate::data::Record;
use crate::errors::DatasetError;
use crate::types::Filename;

/// Deduplicated records plus the audit trail of what was dropped.
#[derive(Clone, Debug, Default)]
pub struct Deduplicated {
    /// One record per filename, first occurrence kept, original order.
    pub records: Vec<Record>,
    /// Filenames seen more than once, in first-seen order.
    pub duplicated: Vec<Filename>,
    /// Record count before deduplication.
    pub original_len: usize,
}

impl Deduplicated {
    /// Number of records dropped.
    pub fn removed(&self) -> usize {
        self.original_len - self.records.len()
    }

    /// Sanity gate: fail unless exactly `expected` unique documents remain.
    pub fn ensure_unique_count(&self, expected: usize) -> Result<(), DatasetError> {
        if self.records.len() != expected {
            return Err(DatasetError::UnexpectedCount {
                what: "unique annotated documents after deduplication".to_string(),
                expected,
                found: self.records.len(),
            });
        }
        Ok(())
    }
}

/// Keep the first record for every filename and report the duplicated ones.
pub fn drop_duplicate_filenames(records: Vec<Record>) -> Deduplicated {
    let original_len = records.len();
    let mut counts: IndexMap<Filename, usize> = IndexMap::new();
    for record in &records {
        *counts.entry(record.filename.clone()).or_insert(0) += 1;
    }
    let duplicated: Vec<Filename> = counts
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(filename, _)| filename.clone())
        .collect();

    let mut seen: HashSet<Filename> = HashSet::with_capacity(counts.len());
    let records: Vec<Record> = records
        .into_iter()
        .filter(|record| seen.insert(record.filename.clone()))
        .collect();

    info!(
        "[edema:dedup] {} records with {} duplicated filenames; {} remain after removal",
        original_len,
        duplicated.len(),
        records.len()
    );
    Deduplicated {
        records,
        duplicated,
        original_len,
    }
}

/// Records whose filename also appears in a held-out set, split off for audit.
#[derive(Clone, Debug, Default)]
pub struct OverlapRemoval {
    /// Records not present in the held-out set, original order.
    pub records: Vec<Record>,
    /// Filenames removed because the held-out set already has them.
    pub removed: Vec<Filename>,
}

/// Remove records whose filename is in `held_out`.
///
/// Keeps annotated documents out of the keyword-labeled pool so they cannot
/// leak from test into train or dev.
pub fn remove_held_out(records: Vec<Record>, held_out: &[Record]) -> OverlapRemoval {
    let held_out: HashSet<&str> = held_out.iter().map(|r| r.filename.as_str()).collect();
    let (removed, records): (Vec<Record>, Vec<Record>) = records
        .into_iter()
        .partition(|record| held_out.contains(record.filename.as_str()));
    let removed: Vec<Filename> = removed.into_iter().map(|record| record.filename).collect();
    if !removed.is_empty() {
        info!(
            "[edema:dedup] removed {} keyword-labeled records that are also annotated",
            removed.len()
        );
    }
    OverlapRemoval { records, removed }
}

/// Fail on the first filename that occurs twice.
pub fn ensure_unique_filenames<'a, I>(filenames: I) -> Result<(), DatasetError>
where
    I: IntoIterator<Item = &'a Filename>,
{
    let mut seen: HashSet<&Filename> = HashSet::new();
    for filename in filenames {
        if !seen.insert(filename) {
            return Err(DatasetError::DuplicateFilename(filename.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::RecordMetadata;

    fn record(filename: &str, severity: i64) -> Record {
        Record::new(filename, severity, RecordMetadata::default())
    }

    #[test]
    fn first_occurrence_survives_and_duplicates_are_listed() {
        let records = vec![record("a", 1), record("b", 2), record("a", 3)];
        let dedup = drop_duplicate_filenames(records);
        assert_eq!(dedup.records.len(), 2);
        assert_eq!(dedup.records[0], record("a", 1));
        assert_eq!(dedup.records[1], record("b", 2));
        assert_eq!(dedup.duplicated, vec!["a".to_string()]);
        assert_eq!(dedup.original_len, 3);
        assert_eq!(dedup.removed(), 1);
    }

    #[test]
    fn duplicates_are_listed_once_in_first_seen_order() {
        let records = vec![
            record("c", 0),
            record("a", 0),
            record("c", 0),
            record("a", 0),
            record("c", 0),
        ];
        let dedup = drop_duplicate_filenames(records);
        assert_eq!(dedup.duplicated, vec!["c".to_string(), "a".to_string()]);
        assert_eq!(dedup.records.len(), 2);
        assert_eq!(dedup.removed(), 3);
    }

    #[test]
    fn sanity_gate_rejects_unexpected_counts() {
        let dedup = drop_duplicate_filenames(vec![record("a", 0), record("a", 0)]);
        assert!(dedup.ensure_unique_count(1).is_ok());
        assert!(matches!(
            dedup.ensure_unique_count(178),
            Err(DatasetError::UnexpectedCount { expected: 178, found: 1, .. })
        ));
    }

    #[test]
    fn held_out_filenames_are_removed_from_the_pool() {
        let pool = vec![record("a", 0), record("b", 1), record("c", 2)];
        let held_out = vec![record("b", 3)];
        let overlap = remove_held_out(pool, &held_out);
        assert_eq!(overlap.removed, vec!["b".to_string()]);
        let kept: Vec<&str> = overlap.records.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(kept, vec!["a", "c"]);
    }

    #[test]
    fn unique_filename_check_names_the_offender() {
        let names = vec!["x".to_string(), "y".to_string(), "x".to_string()];
        assert!(matches!(
            ensure_unique_filenames(&names),
            Err(DatasetError::DuplicateFilename(name)) if name == "x"
        ));
        assert!(ensure_unique_filenames(&names[..2]).is_ok());
    }
}
