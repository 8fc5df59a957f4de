//! Label ingestion: keyword-labeled class files and the human annotation table.
//!
//! Both inputs are turned into [`Record`]s with `keywords_found` metadata. The
//! class files give every line the fixed severity of its file; the annotation
//! table maps label text through a caller-supplied [`LabelDictionary`].

use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{debug, info, warn};

use crate::config::LabelDictionary;
use crate::constants::labels::UNLABELED_SEVERITY;
use crate::constants::ingestion::{
    ANNOTATION_COL_ID, ANNOTATION_COL_KEYWORD_LABEL, ANNOTATION_COL_KEYWORDS,
    ANNOTATION_COL_LABEL, ANNOTATION_ID_PREFIX, CLASS_FILES, FILENAME_SEPARATOR,
};
use crate::data::Record;
use crate::errors::DatasetError;
use crate::metadata::RecordMetadata;
use crate::types::{Filename, Severity};
use crate::utils::split_keywords;

/// Result of reading the human annotation table.
#[derive(Clone, Debug, Default)]
pub struct AnnotationIngest {
    /// One record per labeled row, in table order (duplicates included).
    pub records: Vec<Record>,
    /// Documents skipped because the annotator left the label empty.
    pub unlabeled: Vec<Filename>,
}

/// Parse one `filename:kw1;kw2;...;` line.
pub fn parse_class_line(line: &str, severity: Severity) -> Result<Record, String> {
    let mut parts = line.split(FILENAME_SEPARATOR);
    let (Some(filename), Some(keywords), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!(
            "expected exactly one '{FILENAME_SEPARATOR}' between filename and keywords"
        ));
    };
    let filename = filename.trim();
    if filename.is_empty() {
        return Err("filename is empty".to_string());
    }
    Ok(Record::new(
        filename,
        severity,
        RecordMetadata::with_keywords(split_keywords(keywords)),
    ))
}

/// Read every line of one class file, tagging records with `severity`.
///
/// Blank lines are skipped; any other unparseable line aborts the read.
pub fn read_class_file(path: impl AsRef<Path>, severity: Severity) -> Result<Vec<Record>, DatasetError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let mut records = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_class_line(line, severity).map_err(|reason| DatasetError::Malformed {
            location: format!("{}:{}", path.display(), idx + 1),
            reason,
        })?;
        records.push(record);
    }
    debug!(
        "[edema:ingest] {} -> {} records (severity {})",
        path.display(),
        records.len(),
        severity
    );
    Ok(records)
}

/// Read `class0.txt` .. `class3.txt` from `dir` and concatenate in class order.
pub fn read_class_files(dir: impl AsRef<Path>) -> Result<Vec<Record>, DatasetError> {
    let dir = dir.as_ref();
    let mut records = Vec::new();
    for (name, severity) in CLASS_FILES {
        records.extend(read_class_file(dir.join(name), severity)?);
    }
    info!(
        "[edema:ingest] read {} keyword-labeled records from {}",
        records.len(),
        dir.display()
    );
    Ok(records)
}

/// Read a list of unlabeled documents, one per line, as severity `-1` records.
///
/// A line is either a bare filename or a class-file style `filename:kw1;kw2;` entry.
pub fn read_unlabeled_list(path: impl AsRef<Path>) -> Result<Vec<Record>, DatasetError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let mut records = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = if line.contains(FILENAME_SEPARATOR) {
            parse_class_line(line, UNLABELED_SEVERITY).map_err(|reason| DatasetError::Malformed {
                location: format!("{}:{}", path.display(), idx + 1),
                reason,
            })?
        } else {
            Record::new(line, UNLABELED_SEVERITY, RecordMetadata::default())
        };
        records.push(record);
    }
    info!(
        "[edema:ingest] read {} unlabeled records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Read the comma-separated annotation table (header row skipped).
///
/// Rows with an empty annotated label are skipped and reported. Label text is
/// lower-cased and trimmed before the dictionary lookup; a miss is fatal.
pub fn read_annotations(
    path: impl AsRef<Path>,
    labels: &LabelDictionary,
) -> Result<AnnotationIngest, DatasetError> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut ingest = AnnotationIngest::default();
    for (idx, row) in reader.records().enumerate() {
        let row = row?;
        // Header is line 1.
        let location = || format!("{}:{}", path.display(), idx + 2);
        let column = |col: usize| {
            row.get(col).ok_or_else(|| DatasetError::Malformed {
                location: location(),
                reason: format!("missing column {col} (row has {} columns)", row.len()),
            })
        };

        let filename = format!("{ANNOTATION_ID_PREFIX}{}", column(ANNOTATION_COL_ID)?.trim());
        let label = column(ANNOTATION_COL_LABEL)?.trim().to_lowercase();
        if label.is_empty() {
            warn!("[edema:ingest] annotator did not label report {}", filename);
            ingest.unlabeled.push(filename);
            continue;
        }

        let edema_severity = labels.lookup(&label, &filename)?;
        let keyword_label = column(ANNOTATION_COL_KEYWORD_LABEL)?.trim().to_lowercase();
        let keyword_severity = labels.lookup(&keyword_label, &filename)?;
        let keywords = split_keywords(column(ANNOTATION_COL_KEYWORDS)?);

        ingest.records.push(Record::new(
            filename,
            edema_severity,
            RecordMetadata::with_keywords(keywords).with_keyword_search_severity(keyword_severity),
        ));
    }

    info!(
        "[edema:ingest] read {} annotated records from {} ({} unlabeled rows skipped)",
        ingest.records.len(),
        path.display(),
        ingest.unlabeled.len()
    );
    Ok(ingest)
}
