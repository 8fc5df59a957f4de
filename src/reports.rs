//! Per-filename nested report lookup.

use std::path::Path;

use csv::ReaderBuilder;
use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::constants::table::{COL_FILENAME, COL_REPORT, TABLE_DELIMITER};
use crate::data::NestedReport;
use crate::errors::DatasetError;
use crate::types::Filename;

/// Contents of one `report` cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub final_report: NestedReport,
}

/// Nested reports keyed by filename.
#[derive(Clone, Debug, Default)]
pub struct ReportCorpus {
    reports: IndexMap<Filename, NestedReport>,
}

impl ReportCorpus {
    /// Build a corpus in memory. Later entries for a filename are ignored.
    pub fn from_entries<I, F>(entries: I) -> Self
    where
        I: IntoIterator<Item = (F, NestedReport)>,
        F: Into<Filename>,
    {
        let mut reports = IndexMap::new();
        for (filename, report) in entries {
            reports.entry(filename.into()).or_insert(report);
        }
        Self { reports }
    }

    /// Load a tab-separated table with `filename` and `report` columns.
    ///
    /// `report` cells hold `{"final_report": ...}` JSON. Other columns are ignored.
    pub fn from_tsv_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new()
            .delimiter(TABLE_DELIMITER)
            .has_headers(true)
            .from_path(path)?;
        let headers = reader.headers()?.clone();
        let position = |name: &str| {
            headers
                .iter()
                .position(|header| header == name)
                .ok_or_else(|| DatasetError::Malformed {
                    location: path.display().to_string(),
                    reason: format!("missing '{name}' column"),
                })
        };
        let filename_col = position(COL_FILENAME)?;
        let report_col = position(COL_REPORT)?;

        let mut reports = IndexMap::new();
        for (idx, row) in reader.records().enumerate() {
            let row = row?;
            let location = || format!("{}:{}", path.display(), idx + 2);
            let (Some(filename), Some(cell)) = (row.get(filename_col), row.get(report_col)) else {
                return Err(DatasetError::Malformed {
                    location: location(),
                    reason: "row is missing the filename or report cell".to_string(),
                });
            };
            let entry: ReportEntry =
                serde_json::from_str(cell).map_err(|err| DatasetError::Malformed {
                    location: location(),
                    reason: format!("report cell is not valid report JSON: {err}"),
                })?;
            match reports.entry(filename.to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(entry.final_report);
                }
                Entry::Occupied(_) => {
                    warn!(
                        "[edema:reports] {} appears more than once; keeping the first report",
                        filename
                    );
                }
            }
        }
        info!(
            "[edema:reports] loaded {} reports from {}",
            reports.len(),
            path.display()
        );
        Ok(Self { reports })
    }

    /// Report for `filename`; a miss is fatal.
    pub fn get(&self, filename: &str) -> Result<&NestedReport, DatasetError> {
        self.reports
            .get(filename)
            .ok_or_else(|| DatasetError::MissingReport(filename.to_string()))
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}
