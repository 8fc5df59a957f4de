//! Dataset tables and their tab-separated persistence.
//!
//! Structured columns (`metadata`, `normalized_report`) are stored as JSON text
//! and parsed back on read, so `read_tsv(write_tsv(d)) == d` holds value by value.
//! Files are written to a temporary sibling and renamed into place.

use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Writer, WriterBuilder};
use indexmap::IndexMap;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::constants::table::{
    COL_EDEMA_SEVERITY, COL_FILENAME, COL_METADATA, COL_NORMALIZED_REPORT, COL_ORIGINAL_REPORT,
    TABLE_DELIMITER,
};
use crate::data::{EnrichedRecord, NormalizedReport, Record};
use crate::duplicates::ensure_unique_filenames;
use crate::errors::DatasetError;
use crate::metadata::RecordMetadata;
use crate::types::{ColumnName, Filename, Severity};

/// Columns a dataset table may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Column {
    Filename,
    EdemaSeverity,
    OriginalReport,
    Metadata,
    NormalizedReport,
}

impl Column {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Filename => COL_FILENAME,
            Self::EdemaSeverity => COL_EDEMA_SEVERITY,
            Self::OriginalReport => COL_ORIGINAL_REPORT,
            Self::Metadata => COL_METADATA,
            Self::NormalizedReport => COL_NORMALIZED_REPORT,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            Self::Filename,
            Self::EdemaSeverity,
            Self::OriginalReport,
            Self::Metadata,
            Self::NormalizedReport,
        ]
        .into_iter()
        .find(|column| column.as_str() == name)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const REQUIRED_COLUMNS: [Column; 3] = [Column::Filename, Column::EdemaSeverity, Column::Metadata];

/// One row of a dataset table. Optional fields are `Some` exactly when the column exists.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetRow {
    pub filename: Filename,
    pub edema_severity: Severity,
    pub original_report: Option<String>,
    pub metadata: RecordMetadata,
    pub normalized_report: Option<NormalizedReport>,
}

impl From<Record> for DatasetRow {
    fn from(record: Record) -> Self {
        Self {
            filename: record.filename,
            edema_severity: record.edema_severity,
            original_report: None,
            metadata: record.metadata,
            normalized_report: None,
        }
    }
}

impl From<EnrichedRecord> for DatasetRow {
    fn from(record: EnrichedRecord) -> Self {
        Self {
            filename: record.filename,
            edema_severity: record.edema_severity,
            original_report: Some(record.original_report),
            metadata: record.metadata,
            normalized_report: None,
        }
    }
}

impl DatasetRow {
    fn has(&self, column: Column) -> bool {
        match column {
            Column::OriginalReport => self.original_report.is_some(),
            Column::NormalizedReport => self.normalized_report.is_some(),
            Column::Filename | Column::EdemaSeverity | Column::Metadata => true,
        }
    }

    fn cell_eq(&self, other: &Self, column: Column) -> bool {
        match column {
            Column::Filename => self.filename == other.filename,
            Column::EdemaSeverity => self.edema_severity == other.edema_severity,
            Column::OriginalReport => self.original_report == other.original_report,
            Column::Metadata => self.metadata == other.metadata,
            Column::NormalizedReport => self.normalized_report == other.normalized_report,
        }
    }

    fn encode_cell(&self, column: Column) -> Result<String, DatasetError> {
        Ok(match column {
            Column::Filename => self.filename.clone(),
            Column::EdemaSeverity => self.edema_severity.to_string(),
            Column::OriginalReport => self.original_report.clone().unwrap_or_default(),
            Column::Metadata => serde_json::to_string(&self.metadata.to_json())?,
            Column::NormalizedReport => match &self.normalized_report {
                Some(report) => serde_json::to_string(report)?,
                None => String::new(),
            },
        })
    }
}

/// First point at which two datasets disagree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatasetDifference {
    Columns {
        left: Vec<ColumnName>,
        right: Vec<ColumnName>,
    },
    Length {
        left: usize,
        right: usize,
    },
    Cell {
        row: usize,
        column: Column,
    },
}

/// Ordered rows under a fixed column schema.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<DatasetRow>,
}

impl Dataset {
    /// Build a dataset, checking that the schema is well formed and every row fits it.
    pub fn new(columns: Vec<Column>, rows: Vec<DatasetRow>) -> Result<Self, DatasetError> {
        for (idx, column) in columns.iter().enumerate() {
            if columns[..idx].contains(column) {
                return Err(schema_error(format!("column '{column}' appears twice")));
            }
        }
        for required in REQUIRED_COLUMNS {
            if !columns.contains(&required) {
                return Err(schema_error(format!("missing required column '{required}'")));
            }
        }
        for (idx, row) in rows.iter().enumerate() {
            for column in [Column::OriginalReport, Column::NormalizedReport] {
                if row.has(column) != columns.contains(&column) {
                    return Err(schema_error(format!(
                        "row {idx} ({}) does not match the '{column}' column layout",
                        row.filename
                    )));
                }
            }
        }
        Ok(Self { columns, rows })
    }

    /// `filename, edema_severity, metadata` table of plain records.
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            columns: vec![Column::Filename, Column::EdemaSeverity, Column::Metadata],
            rows: records.into_iter().map(DatasetRow::from).collect(),
        }
    }

    /// `filename, edema_severity, original_report, metadata` table of enriched records.
    pub fn from_enriched(records: Vec<EnrichedRecord>) -> Self {
        Self {
            columns: vec![
                Column::Filename,
                Column::EdemaSeverity,
                Column::OriginalReport,
                Column::Metadata,
            ],
            rows: records.into_iter().map(DatasetRow::from).collect(),
        }
    }

    /// A dataset with this schema and different rows (rows must come from a same-schema table).
    pub(crate) fn with_rows(&self, rows: Vec<DatasetRow>) -> Self {
        Self {
            columns: self.columns.clone(),
            rows,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<ColumnName> {
        self.columns.iter().map(|c| c.as_str().to_string()).collect()
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(&column)
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<DatasetRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fail unless both tables have the same columns in the same order.
    pub fn ensure_same_columns(&self, other: &Dataset) -> Result<(), DatasetError> {
        if self.columns != other.columns {
            return Err(DatasetError::SchemaMismatch {
                left: self.column_names(),
                right: other.column_names(),
            });
        }
        Ok(())
    }

    /// Fail on the first repeated filename.
    pub fn ensure_unique_filenames(&self) -> Result<(), DatasetError> {
        ensure_unique_filenames(self.rows.iter().map(|row| &row.filename))
    }

    /// Row count per severity, in first-appearance order.
    pub fn severity_counts(&self) -> IndexMap<Severity, usize> {
        let mut counts = IndexMap::new();
        for row in &self.rows {
            *counts.entry(row.edema_severity).or_insert(0) += 1;
        }
        counts
    }

    /// Compare column layout, then length, then every cell in row order.
    pub fn first_difference(&self, other: &Dataset) -> Option<DatasetDifference> {
        if self.columns != other.columns {
            return Some(DatasetDifference::Columns {
                left: self.column_names(),
                right: other.column_names(),
            });
        }
        if self.rows.len() != other.rows.len() {
            return Some(DatasetDifference::Length {
                left: self.rows.len(),
                right: other.rows.len(),
            });
        }
        for (row, (left, right)) in self.rows.iter().zip(&other.rows).enumerate() {
            for &column in &self.columns {
                if !left.cell_eq(right, column) {
                    return Some(DatasetDifference::Cell { row, column });
                }
            }
        }
        None
    }

    /// Write as a tab-separated table with a header row.
    pub fn write_tsv(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        self.stage_tsv(path)?.persist()
    }

    /// Write to a temporary sibling of `path` without touching `path` itself.
    pub fn stage_tsv(&self, path: impl AsRef<Path>) -> Result<StagedTable, DatasetError> {
        let staged = stage_tsv(path.as_ref(), |writer| {
            writer.write_record(self.columns.iter().map(|c| c.as_str()))?;
            for row in &self.rows {
                let cells = self
                    .columns
                    .iter()
                    .map(|&column| row.encode_cell(column))
                    .collect::<Result<Vec<String>, DatasetError>>()?;
                writer.write_record(&cells)?;
            }
            Ok(())
        })?;
        debug!(
            "[edema:table] staged {} rows for {}",
            self.rows.len(),
            staged.target.display()
        );
        Ok(staged)
    }

    /// Read a table written by [`Dataset::write_tsv`].
    pub fn read_tsv(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new()
            .delimiter(TABLE_DELIMITER)
            .has_headers(true)
            .from_path(path)?;

        let mut columns = Vec::new();
        for name in reader.headers()?.iter() {
            let column = Column::from_name(name).ok_or_else(|| DatasetError::Malformed {
                location: path.display().to_string(),
                reason: format!("unknown column '{name}'"),
            })?;
            columns.push(column);
        }
        if let Some(missing) = REQUIRED_COLUMNS
            .into_iter()
            .find(|column| !columns.contains(column))
        {
            return Err(DatasetError::Malformed {
                location: path.display().to_string(),
                reason: format!("missing required column '{missing}'"),
            });
        }

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            let row = decode_row(&columns, &record).map_err(|reason| DatasetError::Malformed {
                location: format!("{}:{}", path.display(), idx + 2),
                reason,
            })?;
            rows.push(row);
        }
        Self::new(columns, rows)
    }
}

fn decode_row(columns: &[Column], record: &StringRecord) -> Result<DatasetRow, String> {
    let mut row = DatasetRow {
        filename: String::new(),
        edema_severity: 0,
        original_report: None,
        metadata: RecordMetadata::default(),
        normalized_report: None,
    };
    for (&column, cell) in columns.iter().zip(record.iter()) {
        match column {
            Column::Filename => row.filename = cell.to_string(),
            Column::EdemaSeverity => {
                row.edema_severity = cell
                    .trim()
                    .parse()
                    .map_err(|_| format!("'{cell}' is not an integer severity"))?;
            }
            Column::OriginalReport => row.original_report = Some(cell.to_string()),
            Column::Metadata => {
                let value = serde_json::from_str(cell)
                    .map_err(|err| format!("metadata is not valid JSON: {err}"))?;
                row.metadata = RecordMetadata::from_json(value).map_err(|err| err.to_string())?;
            }
            Column::NormalizedReport => {
                let report = serde_json::from_str(cell)
                    .map_err(|err| format!("normalized_report is not valid JSON: {err}"))?;
                row.normalized_report = Some(report);
            }
        }
    }
    Ok(row)
}

fn schema_error(reason: String) -> DatasetError {
    DatasetError::Malformed {
        location: "dataset schema".to_string(),
        reason,
    }
}

/// A fully written table waiting in a temporary sibling of its destination.
///
/// Dropping it without [`StagedTable::persist`] removes the temporary file.
#[derive(Debug)]
pub struct StagedTable {
    file: NamedTempFile,
    target: PathBuf,
}

impl StagedTable {
    /// Where the staged contents can be read before they are persisted.
    pub fn staged_path(&self) -> &Path {
        self.file.path()
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Rename the staged file onto its destination.
    pub fn persist(self) -> Result<(), DatasetError> {
        self.file
            .persist(&self.target)
            .map_err(|err| DatasetError::Io(err.error))?;
        Ok(())
    }
}

/// Write a tab-separated file into a temporary sibling of `path`.
pub(crate) fn stage_tsv<F>(path: &Path, write: F) -> Result<StagedTable, DatasetError>
where
    F: FnOnce(&mut Writer<&File>) -> Result<(), DatasetError>,
{
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    let file = NamedTempFile::new_in(parent)?;
    {
        let mut writer = WriterBuilder::new()
            .delimiter(TABLE_DELIMITER)
            .from_writer(file.as_file());
        write(&mut writer)?;
        writer.flush()?;
    }
    Ok(StagedTable {
        file,
        target: path.to_path_buf(),
    })
}

/// Write a tab-separated file through a temporary sibling, renamed into place on success.
pub(crate) fn write_tsv_atomically<F>(path: &Path, write: F) -> Result<(), DatasetError>
where
    F: FnOnce(&mut Writer<&File>) -> Result<(), DatasetError>,
{
    stage_tsv(path, write)?.persist()
}
