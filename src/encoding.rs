//! Severity encodings and the classifier export table.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::config::OutputEncoding;
use crate::constants::labels::ORDINAL_CODES;
use crate::constants::table::CLASSIFIER_ALPHA;
use crate::errors::DatasetError;
use crate::table::{Column, Dataset, write_tsv_atomically};
use crate::types::{ReportId, Severity};

/// Ordinal multi-hot code for `severity`.
pub fn ordinal_code(severity: Severity) -> Result<&'static str, DatasetError> {
    ORDINAL_CODES
        .iter()
        .find(|(candidate, _)| *candidate == severity)
        .map(|(_, code)| *code)
        .ok_or(DatasetError::InvalidSeverity(severity))
}

/// Render `severity` for the classifier. Out-of-range values fail in both encodings.
pub fn encode_severity(severity: Severity, encoding: OutputEncoding) -> Result<String, DatasetError> {
    let code = ordinal_code(severity)?;
    Ok(match encoding {
        OutputEncoding::Multilabel => code.to_string(),
        OutputEncoding::Multiclass => severity.to_string(),
    })
}

/// Numeric document id: text before the first `.`, minus the one-character prefix.
///
/// ```
/// use edema_dataset::encoding::report_id_from_filename;
///
/// assert_eq!(report_id_from_filename("s50414267.txt"), "50414267");
/// ```
pub fn report_id_from_filename(filename: &str) -> &str {
    let stem = filename.split('.').next().unwrap_or_default();
    match stem.char_indices().nth(1) {
        Some((offset, _)) => &stem[offset..],
        None => "",
    }
}

/// One row of the classifier input table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClassifierRow {
    pub id: usize,
    pub label: String,
    pub report_id: ReportId,
    pub alpha: &'static str,
    pub text: String,
}

/// Convert a dataset with a `normalized_report` column into classifier rows.
pub fn classifier_rows(
    dataset: &Dataset,
    encoding: OutputEncoding,
) -> Result<Vec<ClassifierRow>, DatasetError> {
    if !dataset.has_column(Column::NormalizedReport) {
        return Err(DatasetError::Malformed {
            location: "classifier export".to_string(),
            reason: format!("dataset has no '{}' column", Column::NormalizedReport),
        });
    }
    dataset
        .rows()
        .iter()
        .enumerate()
        .map(|(id, row)| -> Result<ClassifierRow, DatasetError> {
            let text = row
                .normalized_report
                .as_ref()
                .map(|report| report.text())
                .unwrap_or_default();
            Ok(ClassifierRow {
                id,
                label: encode_severity(row.edema_severity, encoding)?,
                report_id: report_id_from_filename(&row.filename).to_string(),
                alpha: CLASSIFIER_ALPHA,
                text,
            })
        })
        .collect()
}

/// Write classifier rows as a tab-separated table with an `id, label, report_id, alpha, text` header.
pub fn write_classifier_tsv(path: impl AsRef<Path>, rows: &[ClassifierRow]) -> Result<(), DatasetError> {
    let path = path.as_ref();
    write_tsv_atomically(path, |writer| {
        for row in rows {
            writer.serialize(row)?;
        }
        Ok(())
    })?;
    info!(
        "[edema:export] wrote {} classifier rows to {}",
        rows.len(),
        path.display()
    );
    Ok(())
}
