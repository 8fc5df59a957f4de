//! Stratified re-split of a labeled pool against a held-out set.
//!
//! Each severity is handled on its own: the pool's rows of that severity are
//! divided so that `train : dev` mirrors `pool : held_out` for the same label.

use std::collections::HashSet;

use indexmap::IndexMap;
use rand::seq::index;
use tracing::info;

use crate::errors::DatasetError;
use crate::rng::{DeterministicRng, stratum_seed};
use crate::table::{Dataset, DatasetRow};
use crate::types::Severity;

/// Per-label sizes computed before sampling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitTargets {
    pub severity: Severity,
    /// Rows of this label in the pool.
    pub train_len: usize,
    /// Rows of this label in the held-out set.
    pub test_len: usize,
    pub new_train_len: usize,
    pub new_dev_len: usize,
}

/// Compute `new_train_len = round(train_len / (1 + test_len / train_len))`.
///
/// Ties round to even. A label with no pool rows cannot be split.
pub fn split_targets(
    severity: Severity,
    train_len: usize,
    test_len: usize,
) -> Result<SplitTargets, DatasetError> {
    if train_len == 0 {
        return Err(DatasetError::EmptyStratum {
            severity,
            held_out: test_len,
        });
    }
    let ratio = test_len as f64 / train_len as f64;
    let new_train_len = (train_len as f64 / (1.0 + ratio)).round_ties_even() as usize;
    Ok(SplitTargets {
        severity,
        train_len,
        test_len,
        new_train_len,
        new_dev_len: train_len - new_train_len,
    })
}

/// New train and dev partitions drawn from the pool.
#[derive(Clone, Debug)]
pub struct StratifiedSplit {
    pub train: Dataset,
    pub dev: Dataset,
    /// Targets per label, in first-appearance order in the pool.
    pub targets: Vec<SplitTargets>,
}

/// Re-split `train` into train and dev so each label's dev share matches its
/// held-out share in `test`.
///
/// Same inputs and same `seed` give the same partitions. Rows keep their
/// original relative order inside each partition.
pub fn stratified_resplit(
    train: &Dataset,
    test: &Dataset,
    seed: u64,
) -> Result<StratifiedSplit, DatasetError> {
    train.ensure_same_columns(test)?;

    let mut strata: IndexMap<Severity, Vec<usize>> = IndexMap::new();
    for (idx, row) in train.rows().iter().enumerate() {
        strata.entry(row.edema_severity).or_default().push(idx);
    }
    let test_counts = test.severity_counts();
    if let Some((&severity, &held_out)) = test_counts
        .iter()
        .find(|(severity, _)| !strata.contains_key(*severity))
    {
        return Err(DatasetError::EmptyStratum { severity, held_out });
    }

    let targets = strata
        .iter()
        .map(|(&severity, rows)| {
            split_targets(
                severity,
                rows.len(),
                test_counts.get(&severity).copied().unwrap_or(0),
            )
        })
        .collect::<Result<Vec<_>, _>>()?;
    for target in &targets {
        info!(
            "[edema:split] label {}: pool {} held-out {} -> train {} dev {}",
            target.severity,
            target.train_len,
            target.test_len,
            target.new_train_len,
            target.new_dev_len
        );
    }

    let mut dev_rows: HashSet<usize> = HashSet::new();
    for (target, rows) in targets.iter().zip(strata.values()) {
        let mut rng = DeterministicRng::new(stratum_seed(seed, target.severity));
        let picked = index::sample(&mut rng, rows.len(), target.new_dev_len);
        dev_rows.extend(picked.iter().map(|pos| rows[pos]));
    }

    let (mut new_train, mut new_dev): (Vec<DatasetRow>, Vec<DatasetRow>) = (Vec::new(), Vec::new());
    for (idx, row) in train.rows().iter().enumerate() {
        if dev_rows.contains(&idx) {
            new_dev.push(row.clone());
        } else {
            new_train.push(row.clone());
        }
    }
    info!(
        "[edema:split] re-split {} rows into train {} / dev {} (seed {})",
        train.len(),
        new_train.len(),
        new_dev.len(),
        seed
    );

    Ok(StratifiedSplit {
        train: train.with_rows(new_train),
        dev: train.with_rows(new_dev),
        targets,
    })
}
