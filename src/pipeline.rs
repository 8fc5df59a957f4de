//! End-to-end dataset build.
//!
//! Stages run in order and each returns a new value; nothing is written until
//! the train, dev and test tables are complete in memory. The tables are then
//! staged and verified together before any destination file is replaced.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{ExtractionMode, LabelDictionary, PipelineConfig, PipelinePaths};
use crate::constants::pipeline::{DEV_FILENAME, TEST_FILENAME, TRAIN_FILENAME};
use crate::duplicates::{drop_duplicate_filenames, remove_held_out};
use crate::errors::DatasetError;
use crate::ingestion::{read_annotations, read_class_files, read_unlabeled_list};
use crate::merge::merge_reports;
use crate::reports::ReportCorpus;
use crate::sections::ExtractionStats;
use crate::splits::{SplitTargets, stratified_resplit};
use crate::table::{Dataset, StagedTable};
use crate::types::Filename;

/// Diagnostics from every stage of a build.
#[derive(Clone, Debug, Default)]
pub struct BuildSummary {
    /// Records read from the class files, before deduplication.
    pub keyword_records: usize,
    /// Severity `-1` records read from the unlabeled list, before deduplication.
    pub unlabeled_records: usize,
    /// Filenames listed more than once across the class files.
    pub keyword_duplicates: Vec<Filename>,
    /// Annotated records read, before deduplication.
    pub annotated_records: usize,
    /// Annotation rows skipped for having no label.
    pub annotated_unlabeled: Vec<Filename>,
    pub annotated_duplicates: Vec<Filename>,
    /// Keyword-labeled filenames dropped because they are also annotated.
    pub overlap_removed: Vec<Filename>,
    pub keyword_extraction: ExtractionStats,
    pub annotated_extraction: ExtractionStats,
    pub split_targets: Vec<SplitTargets>,
    pub train_len: usize,
    pub dev_len: usize,
    pub test_len: usize,
    /// Tables written, in train, dev, test order.
    pub outputs: Vec<PathBuf>,
}

/// Run every stage and write `train.tsv`, `dev.tsv` and `test.tsv`.
pub fn build_dataset(
    paths: &PipelinePaths,
    config: &PipelineConfig,
) -> Result<BuildSummary, DatasetError> {
    let mut summary = BuildSummary::default();
    let labels = LabelDictionary::from_json_path(&paths.label_dictionary)?;

    let mut keyword = read_class_files(&paths.class_dir)?;
    summary.keyword_records = keyword.len();
    if let Some(unlabeled) = &paths.unlabeled {
        let unlabeled = read_unlabeled_list(unlabeled)?;
        summary.unlabeled_records = unlabeled.len();
        keyword.extend(unlabeled);
    }
    let keyword = drop_duplicate_filenames(keyword);
    summary.keyword_duplicates = keyword.duplicated;

    let annotated = read_annotations(&paths.annotations, &labels)?;
    summary.annotated_records = annotated.records.len();
    summary.annotated_unlabeled = annotated.unlabeled;
    let annotated = drop_duplicate_filenames(annotated.records);
    if let Some(expected) = config.expected_annotated {
        annotated.ensure_unique_count(expected)?;
    }
    summary.annotated_duplicates = annotated.duplicated;

    let pool = remove_held_out(keyword.records, &annotated.records);
    summary.overlap_removed = pool.removed;

    let corpus = ReportCorpus::from_tsv_path(&paths.reports)?;
    let pool = merge_reports(pool.records, &corpus, config.mode)?;
    summary.keyword_extraction = pool.stats;
    let test = merge_reports(annotated.records, &corpus, ExtractionMode::Supervised)?;
    summary.annotated_extraction = test.stats;

    let pool = pool.into_dataset();
    let test = test.into_dataset();
    let split = stratified_resplit(&pool, &test, config.seed)?;
    summary.split_targets = split.targets;
    summary.train_len = split.train.len();
    summary.dev_len = split.dev.len();
    summary.test_len = test.len();

    let tables = [
        (TRAIN_FILENAME, &split.train),
        (DEV_FILENAME, &split.dev),
        (TEST_FILENAME, &test),
    ];
    summary.outputs = write_tables(&paths.output_dir, &tables)?;

    info!(
        "[edema:build] wrote train {} / dev {} / test {} to {}",
        summary.train_len,
        summary.dev_len,
        summary.test_len,
        paths.output_dir.display()
    );
    Ok(summary)
}

/// Stage every table, verify each by reading it back, then replace the destinations.
///
/// A failure while staging or verifying leaves every existing file in
/// `output_dir` untouched.
pub fn write_tables(
    output_dir: &Path,
    tables: &[(&str, &Dataset)],
) -> Result<Vec<PathBuf>, DatasetError> {
    let mut staged = Vec::with_capacity(tables.len());
    for (name, table) in tables {
        let table_file = table.stage_tsv(output_dir.join(name))?;
        verify_staged(&table_file, table)?;
        staged.push(table_file);
    }
    let mut written = Vec::with_capacity(staged.len());
    for table_file in staged {
        let target = table_file.target().to_path_buf();
        table_file.persist()?;
        written.push(target);
    }
    Ok(written)
}

fn verify_staged(staged: &StagedTable, table: &Dataset) -> Result<(), DatasetError> {
    let read_back = Dataset::read_tsv(staged.staged_path())?;
    if let Some(difference) = table.first_difference(&read_back) {
        return Err(DatasetError::Malformed {
            location: staged.target().display().to_string(),
            reason: format!("table read back differs from what was written: {difference:?}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::RecordMetadata;
    use crate::table::{Column, DatasetRow};
    use std::fs;
    use tempfile::tempdir;

    fn one_row(filename: &str) -> Dataset {
        Dataset::new(
            vec![
                Column::Filename,
                Column::EdemaSeverity,
                Column::OriginalReport,
                Column::Metadata,
            ],
            vec![DatasetRow {
                filename: filename.to_string(),
                edema_severity: 1,
                original_report: Some("mild congestion.".to_string()),
                metadata: RecordMetadata::with_keywords(vec!["congestion".to_string()]),
                normalized_report: None,
            }],
        )
        .unwrap()
    }

    #[test]
    fn tables_are_written_together_and_listed_in_order() {
        let dir = tempdir().unwrap();
        let (train, dev) = (one_row("s1.txt"), one_row("s2.txt"));
        let written = write_tables(dir.path(), &[("train.tsv", &train), ("dev.tsv", &dev)]).unwrap();
        assert_eq!(written, vec![dir.path().join("train.tsv"), dir.path().join("dev.tsv")]);
        let read = Dataset::read_tsv(&written[1]).unwrap();
        assert_eq!(dev.first_difference(&read), None);
    }

    #[test]
    fn late_staging_failure_keeps_earlier_tables_unchanged() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("train.tsv"), "previous build\n").unwrap();
        // A regular file where the third table's directory should be.
        fs::write(dir.path().join("blocked"), "").unwrap();

        let (train, dev, test) = (one_row("s1.txt"), one_row("s2.txt"), one_row("s3.txt"));
        let tables = [
            ("train.tsv", &train),
            ("dev.tsv", &dev),
            ("blocked/test.tsv", &test),
        ];
        assert!(write_tables(dir.path(), &tables).is_err());
        assert_eq!(
            fs::read_to_string(dir.path().join("train.tsv")).unwrap(),
            "previous build\n"
        );
        assert!(!dir.path().join("dev.tsv").exists());
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 2);
    }
}
