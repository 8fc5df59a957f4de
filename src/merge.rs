//! Join labeled records with their extracted report text.

use tracing::info;

use crate::config::ExtractionMode;
use crate::data::{EnrichedRecord, Record};
use crate::duplicates::ensure_unique_filenames;
use crate::errors::DatasetError;
use crate::reports::ReportCorpus;
use crate::sections::{ExtractionStats, ReportExtraction, extract_reports};
use crate::table::Dataset;

/// Enriched records plus the extraction diagnostics that produced them.
#[derive(Clone, Debug, Default)]
pub struct MergedDataset {
    pub records: Vec<EnrichedRecord>,
    pub stats: ExtractionStats,
}

impl MergedDataset {
    /// Table with `original_report` as the third column.
    pub fn into_dataset(self) -> Dataset {
        Dataset::from_enriched(self.records)
    }
}

/// Extract the report for every record and attach text and provenance.
///
/// Records must already be unique by filename; a repeat is rejected before any
/// report is looked up.
pub fn merge_reports(
    records: Vec<Record>,
    corpus: &ReportCorpus,
    mode: ExtractionMode,
) -> Result<MergedDataset, DatasetError> {
    ensure_unique_filenames(records.iter().map(|record| &record.filename))?;
    let outcome = extract_reports(&records, corpus, mode)?;

    // Unique filenames: extraction order is record order.
    let merged: Vec<EnrichedRecord> = records
        .into_iter()
        .zip(outcome.reports)
        .map(|(record, extraction)| enrich(record, extraction))
        .collect();

    info!(
        "[edema:merge] merged {} records with their reports",
        merged.len()
    );
    Ok(MergedDataset {
        records: merged,
        stats: outcome.stats,
    })
}

fn enrich(record: Record, extraction: ReportExtraction) -> EnrichedRecord {
    debug_assert_eq!(record.filename, extraction.filename);
    EnrichedRecord {
        filename: record.filename,
        edema_severity: record.edema_severity,
        original_report: extraction.original_report,
        metadata: record.metadata.with_origin_section(extraction.origin_section),
    }
}
