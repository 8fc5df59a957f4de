#![doc = include_str!("../README.md")]

/// CLI runners behind the `build_dataset` and `export_classifier` binaries.
pub mod apps;
/// Build configuration, extraction modes and the label dictionary.
pub mod config;
/// Centralized constants for inputs, sections, labels and tables.
pub mod constants;
/// Record and nested report types.
pub mod data;
/// Duplicate and overlap reconciliation.
pub mod duplicates;
/// Severity encodings and classifier export.
pub mod encoding;
/// Class-file and annotation-table ingestion.
pub mod ingestion;
/// Joins records with their extracted reports.
pub mod merge;
/// Metadata keys and the structured metadata cell.
pub mod metadata;
/// End-to-end dataset build.
pub mod pipeline;
/// Report corpus lookup.
pub mod reports;
mod rng;
/// Section extraction from nested reports.
pub mod sections;
/// Stratified train/dev re-split.
pub mod splits;
/// Dataset tables and their persistence.
pub mod table;
/// Shared type aliases.
pub mod types;
/// Text normalization helpers.
pub mod utils;

mod errors;

pub use config::{ExtractionMode, LabelDictionary, OutputEncoding, PipelineConfig, PipelinePaths};
pub use data::{EnrichedRecord, NestedReport, NormalizedReport, Record, SectionValue};
pub use duplicates::{Deduplicated, OverlapRemoval, drop_duplicate_filenames, remove_held_out};
pub use encoding::{ClassifierRow, encode_severity, report_id_from_filename};
pub use errors::DatasetError;
pub use ingestion::{AnnotationIngest, read_annotations, read_class_files, read_unlabeled_list};
pub use merge::{MergedDataset, merge_reports};
pub use metadata::RecordMetadata;
pub use pipeline::{BuildSummary, build_dataset, write_tables};
pub use reports::ReportCorpus;
pub use sections::{ExtractionOutcome, ExtractionStats, ReportExtraction, extract_report, extract_reports};
pub use splits::{SplitTargets, StratifiedSplit, split_targets, stratified_resplit};
pub use table::{Column, Dataset, DatasetDifference, DatasetRow, StagedTable};
pub use types::{Filename, Severity};
