use crate::types::Severity;

/// Constants used by label ingestion.
pub mod ingestion {
    use super::Severity;

    /// Class-partitioned keyword label files and the severity each one carries, in read order.
    pub const CLASS_FILES: [(&str, Severity); 4] = [
        ("class0.txt", 0),
        ("class1.txt", 1),
        ("class2.txt", 2),
        ("class3.txt", 3),
    ];
    /// Separator between the filename and the keyword list in class files.
    pub const FILENAME_SEPARATOR: char = ':';
    /// Separator between keywords (class files and annotation tables).
    pub const KEYWORD_SEPARATOR: char = ';';
    /// Prefix prepended to annotation id suffixes to form document filenames.
    pub const ANNOTATION_ID_PREFIX: &str = "s";
    /// Annotation column holding the id suffix.
    pub const ANNOTATION_COL_ID: usize = 0;
    /// Annotation column holding the human severity label text.
    pub const ANNOTATION_COL_LABEL: usize = 1;
    /// Annotation column holding the keyword-search severity label text.
    pub const ANNOTATION_COL_KEYWORD_LABEL: usize = 4;
    /// Annotation column holding the semicolon-delimited keywords.
    pub const ANNOTATION_COL_KEYWORDS: usize = 5;
}

/// Constants used by the section extractor.
pub mod sections {
    /// Canonical section names in priority order. Keys match by substring.
    pub const SECTION_PRIORITY: [&str; 4] = ["finding", "impression", "conclusion", "recommendation"];
    /// Provenance marker for reports rebuilt from every section.
    pub const FALLBACK_SECTION: &str = "final_report";
}

/// Constants used by severity labels and their encodings.
pub mod labels {
    use super::Severity;

    /// Severity carried by unlabeled (semi-supervised) documents.
    pub const UNLABELED_SEVERITY: Severity = -1;
    /// Ordinal multi-hot codes for each valid severity.
    pub const ORDINAL_CODES: [(Severity, &str); 5] = [
        (-1, "-1"),
        (0, "000"),
        (1, "100"),
        (2, "110"),
        (3, "111"),
    ];
}

/// Constants used by persisted tables.
pub mod table {
    /// Field delimiter for persisted dataset tables.
    pub const TABLE_DELIMITER: u8 = b'\t';
    /// Column name for document identifiers.
    pub const COL_FILENAME: &str = "filename";
    /// Column name for severity labels.
    pub const COL_EDEMA_SEVERITY: &str = "edema_severity";
    /// Column name for extracted report text.
    pub const COL_ORIGINAL_REPORT: &str = "original_report";
    /// Column name for structured record metadata.
    pub const COL_METADATA: &str = "metadata";
    /// Column name for upstream normalized reports.
    pub const COL_NORMALIZED_REPORT: &str = "normalized_report";
    /// Column name for nested reports in the report corpus table.
    pub const COL_REPORT: &str = "report";
    /// Constant `alpha` column value expected by the classifier input format.
    pub const CLASSIFIER_ALPHA: &str = "a";
}

/// Constants used by the end-to-end build.
pub mod pipeline {
    /// Default seed for the stratified re-split.
    pub const DEFAULT_SPLIT_SEED: u64 = 42;
    /// Output file for the re-split training partition.
    pub const TRAIN_FILENAME: &str = "train.tsv";
    /// Output file for the re-split validation partition.
    pub const DEV_FILENAME: &str = "dev.tsv";
    /// Output file for the human-annotated held-out set.
    pub const TEST_FILENAME: &str = "test.tsv";
}
