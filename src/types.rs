/// Unique document identifier (stable across runs).
/// Example: `s50414267.txt`
pub type Filename = String;
/// Ordinal edema severity label; `-1` marks an unlabeled document.
/// Examples: `-1`, `0`, `3`
pub type Severity = i64;
/// Keyword matched by the upstream keyword-search labeler.
/// Examples: `edema`, `vascular congestion`
pub type Keyword = String;
/// Name of a report section that contributed extracted text.
/// Examples: `finding`, `impression`, `final_report`
pub type SectionName = String;
/// Raw section key as stored in a nested report.
/// Examples: `findings`, `impression2`, `FINAL REPORT`
pub type SectionKey = String;
/// Human-readable label name used by annotation tables.
/// Examples: `no edema`, `moderate edema`
pub type LabelName = String;
/// Column name in a persisted dataset table.
/// Examples: `filename`, `metadata`
pub type ColumnName = String;
/// Sentence text from an upstream normalized report.
/// Example: `Mild pulmonary vascular congestion.`
pub type Sentence = String;
/// Numeric document id derived from a filename.
/// Example: `50414267`
pub type ReportId = String;
