//! Section extraction from nested radiology reports.
//!
//! A nested report maps free-form section keys (`findings`, `impression2`,
//! `FINAL REPORT` ...) to text. Extraction walks the canonical sections in
//! priority order, matches keys by substring, and concatenates each distinct
//! value once:
//!
//! 1. A report stored as a plain string is used whole.
//! 2. Otherwise every key containing `finding`, then `impression`, then
//!    `conclusion`, then `recommendation` contributes its value.
//! 3. In semi-supervised mode an unlabeled document with no canonical section
//!    is rebuilt from every section and tagged `final_report`.
//!
//! Empty reports are valid output; they are logged, counted, and kept.

use indexmap::IndexMap;
use tracing::{error, info, warn};

use crate::config::ExtractionMode;
use crate::constants::labels::UNLABELED_SEVERITY;
use crate::constants::sections::{FALLBACK_SECTION, SECTION_PRIORITY};
use crate::data::{NestedReport, Record, SectionValue};
use crate::errors::DatasetError;
use crate::reports::ReportCorpus;
use crate::types::{Filename, SectionKey, SectionName, Severity};
use crate::utils::normalize_inline_whitespace;

/// How the text of one report was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractionSource {
    /// The report was a plain string.
    Plain,
    /// At least one canonical section matched.
    Sections,
    /// Rebuilt from every section (semi-supervised fallback).
    Fallback,
    /// Nested report with no usable canonical section.
    NoSections,
}

/// Extracted text and provenance for one document.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportExtraction {
    pub filename: Filename,
    pub original_report: String,
    /// Canonical section names (or `final_report`) that contributed text.
    pub origin_section: Vec<SectionName>,
    pub source: ExtractionSource,
    /// Section keys whose value was neither text nor a list of text.
    pub anomalies: Vec<SectionKey>,
}

impl ReportExtraction {
    pub fn is_empty(&self) -> bool {
        self.original_report.trim().is_empty()
    }
}

/// Counters describing one extraction run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Reports whose final text is empty.
    pub empty_reports: usize,
    /// Nested reports with no canonical text: no key matched a canonical
    /// section, or every matched value was empty. Includes fallback reports.
    pub section_misses: usize,
    /// Reports rebuilt by the semi-supervised fallback.
    pub fallback_reports: usize,
    /// Total section values skipped for having an unexpected shape.
    pub shape_anomalies: usize,
}

/// Extraction results for a record set plus run diagnostics.
#[derive(Clone, Debug, Default)]
pub struct ExtractionOutcome {
    /// One extraction per distinct filename, first-seen order.
    pub reports: Vec<ReportExtraction>,
    pub stats: ExtractionStats,
}

/// Extract the report text for one document.
pub fn extract_report(
    filename: &str,
    report: &NestedReport,
    severity: Severity,
    mode: ExtractionMode,
) -> ReportExtraction {
    let sections = match report {
        NestedReport::Plain(text) => {
            let original_report = normalize_inline_whitespace(text);
            if original_report.is_empty() {
                warn!("[edema:extract] report {} is empty", filename);
            }
            return ReportExtraction {
                filename: filename.to_string(),
                original_report,
                origin_section: Vec::new(),
                source: ExtractionSource::Plain,
                anomalies: Vec::new(),
            };
        }
        NestedReport::Sections(sections) => sections,
    };

    let mut anomalies = Vec::new();
    let (values, origin_section) = collect_canonical_sections(sections);
    let mut text = String::new();
    for (key, value) in values {
        match value {
            SectionValue::Text(body) => text.push_str(body),
            SectionValue::Sentences(parts) => text.push_str(&parts.join(" ")),
            SectionValue::Other(_) => {
                error!(
                    "[edema:extract] report {} section '{}' is neither text nor a list of text",
                    filename, key
                );
                anomalies.push(key.clone());
                continue;
            }
        }
        text.push(' ');
    }
    let original_report = normalize_inline_whitespace(&text);
    if !original_report.is_empty() {
        return ReportExtraction {
            filename: filename.to_string(),
            original_report,
            origin_section,
            source: ExtractionSource::Sections,
            anomalies,
        };
    }

    if mode.is_semi_supervised() && severity == UNLABELED_SEVERITY && !sections.is_empty() {
        let (original_report, fallback_anomalies) = flatten_all_sections(filename, sections);
        for key in fallback_anomalies {
            if !anomalies.contains(&key) {
                anomalies.push(key);
            }
        }
        if original_report.trim().is_empty() {
            warn!("[edema:extract] report {} is empty", filename);
        }
        return ReportExtraction {
            filename: filename.to_string(),
            original_report,
            origin_section: vec![FALLBACK_SECTION.to_string()],
            source: ExtractionSource::Fallback,
            anomalies,
        };
    }

    warn!("[edema:extract] report {} is empty", filename);
    ReportExtraction {
        filename: filename.to_string(),
        original_report,
        origin_section,
        source: ExtractionSource::NoSections,
        anomalies,
    }
}

/// Distinct values of every key matching a canonical section, in discovery order,
/// and the canonical names that matched.
fn collect_canonical_sections(
    sections: &IndexMap<SectionKey, SectionValue>,
) -> (Vec<(&SectionKey, &SectionValue)>, Vec<SectionName>) {
    let mut values: Vec<(&SectionKey, &SectionValue)> = Vec::new();
    let mut used: Vec<SectionName> = Vec::new();
    for canonical in SECTION_PRIORITY {
        for (key, value) in sections {
            if !key.contains(canonical) {
                continue;
            }
            if !values.iter().any(|(_, seen)| *seen == value) {
                values.push((key, value));
            }
            if !used.iter().any(|name| name == canonical) {
                used.push(canonical.to_string());
            }
        }
    }
    (values, used)
}

/// Join every section value with single spaces, in mapping order.
fn flatten_all_sections(
    filename: &str,
    sections: &IndexMap<SectionKey, SectionValue>,
) -> (String, Vec<SectionKey>) {
    let mut parts: Vec<String> = Vec::with_capacity(sections.len());
    let mut anomalies = Vec::new();
    for (key, value) in sections {
        match value {
            SectionValue::Text(body) => parts.push(body.clone()),
            SectionValue::Sentences(sentences) => parts.push(sentences.join(" ")),
            SectionValue::Other(_) => {
                error!(
                    "[edema:extract] report {} has a final_report value under '{}' that is neither text nor a list",
                    filename, key
                );
                anomalies.push(key.clone());
            }
        }
    }
    (parts.join(" "), anomalies)
}

/// Extract reports for every distinct filename in `records`, first-seen order.
///
/// The severity consulted by the fallback is the first record's for each filename.
/// A filename missing from `corpus` aborts the run.
pub fn extract_reports(
    records: &[Record],
    corpus: &ReportCorpus,
    mode: ExtractionMode,
) -> Result<ExtractionOutcome, DatasetError> {
    let mut severities: IndexMap<&str, Severity> = IndexMap::with_capacity(records.len());
    for record in records {
        severities
            .entry(record.filename.as_str())
            .or_insert(record.edema_severity);
    }

    let mut outcome = ExtractionOutcome::default();
    for (filename, severity) in severities {
        let report = corpus.get(filename)?;
        let extraction = extract_report(filename, report, severity, mode);
        let stats = &mut outcome.stats;
        match extraction.source {
            ExtractionSource::Fallback => {
                stats.section_misses += 1;
                stats.fallback_reports += 1;
            }
            ExtractionSource::NoSections => stats.section_misses += 1,
            ExtractionSource::Plain | ExtractionSource::Sections => {}
        }
        if extraction.is_empty() {
            stats.empty_reports += 1;
        }
        stats.shape_anomalies += extraction.anomalies.len();
        outcome.reports.push(extraction);
    }

    info!(
        "[edema:extract] extracted {} reports ({} empty, {} without canonical text, {} fallback)",
        outcome.reports.len(),
        outcome.stats.empty_reports,
        outcome.stats.section_misses,
        outcome.stats.fallback_reports
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::RecordMetadata;
    use serde_json::json;

    fn nested(value: serde_json::Value) -> NestedReport {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn duplicate_values_are_used_once_in_priority_order() {
        let report = nested(json!({"findings": "A", "findings2": "A", "impression": "B"}));
        let extraction = extract_report("s1.txt", &report, 2, ExtractionMode::Supervised);
        assert_eq!(extraction.original_report, "A B");
        assert_eq!(extraction.origin_section, vec!["finding", "impression"]);
        assert_eq!(extraction.source, ExtractionSource::Sections);
    }

    #[test]
    fn priority_order_beats_mapping_order() {
        let report = nested(json!({
            "recommendation": "Follow up.",
            "impression": ["Mild", "edema."],
            "history": "Dyspnea.",
            "findings": "Enlarged   heart.\n"
        }));
        let extraction = extract_report("s1.txt", &report, 1, ExtractionMode::Supervised);
        assert_eq!(extraction.original_report, "Enlarged heart. Mild edema. Follow up.");
        assert_eq!(
            extraction.origin_section,
            vec!["finding", "impression", "recommendation"]
        );
    }

    #[test]
    fn substring_matching_is_case_sensitive() {
        let report = nested(json!({"FINDINGS": "upper", "conclusions": "lower"}));
        let extraction = extract_report("s1.txt", &report, 0, ExtractionMode::Supervised);
        assert_eq!(extraction.original_report, "lower");
        assert_eq!(extraction.origin_section, vec!["conclusion"]);
    }

    #[test]
    fn section_name_is_recorded_even_when_its_value_was_already_used() {
        let report = nested(json!({"findings": "Same text.", "impression": "Same text."}));
        let extraction = extract_report("s1.txt", &report, 0, ExtractionMode::Supervised);
        assert_eq!(extraction.original_report, "Same text.");
        assert_eq!(extraction.origin_section, vec!["finding", "impression"]);
    }

    #[test]
    fn plain_string_report_is_normalized_without_provenance() {
        let report = NestedReport::Plain("  FINAL REPORT\n  chest   clear ".into());
        let extraction = extract_report("s1.txt", &report, -1, ExtractionMode::SemiSupervised);
        assert_eq!(extraction.original_report, "FINAL REPORT chest clear");
        assert!(extraction.origin_section.is_empty());
        assert_eq!(extraction.source, ExtractionSource::Plain);

        let blank = NestedReport::Plain(" \n ".into());
        let extraction = extract_report("s2.txt", &blank, -1, ExtractionMode::SemiSupervised);
        assert!(extraction.is_empty());
        assert_eq!(extraction.source, ExtractionSource::Plain);
    }

    #[test]
    fn fallback_only_applies_to_unlabeled_documents_in_semi_supervised_mode() {
        let report = nested(json!({"history": "Cough.", "technique": ["PA", "lateral"]}));

        let unlabeled = extract_report("s1.txt", &report, -1, ExtractionMode::SemiSupervised);
        assert_eq!(unlabeled.original_report, "Cough. PA lateral");
        assert_eq!(unlabeled.origin_section, vec![FALLBACK_SECTION]);
        assert_eq!(unlabeled.source, ExtractionSource::Fallback);

        let labeled = extract_report("s2.txt", &report, 0, ExtractionMode::SemiSupervised);
        assert!(labeled.is_empty());
        assert!(labeled.origin_section.is_empty());
        assert_eq!(labeled.source, ExtractionSource::NoSections);

        let supervised = extract_report("s3.txt", &report, -1, ExtractionMode::Supervised);
        assert!(supervised.is_empty());
        assert_eq!(supervised.source, ExtractionSource::NoSections);
    }

    #[test]
    fn empty_nested_report_never_falls_back() {
        let report = nested(json!({}));
        let extraction = extract_report("s1.txt", &report, -1, ExtractionMode::SemiSupervised);
        assert!(extraction.is_empty());
        assert_eq!(extraction.source, ExtractionSource::NoSections);
    }

    #[test]
    fn unexpected_value_shapes_are_reported_not_used() {
        let report = nested(json!({"findings": {"nested": true}, "impression": "Clear."}));
        let extraction = extract_report("s1.txt", &report, 0, ExtractionMode::Supervised);
        assert_eq!(extraction.original_report, "Clear.");
        assert_eq!(extraction.anomalies, vec!["findings".to_string()]);

        let report = nested(json!({"history": 7, "technique": "AP"}));
        let extraction = extract_report("s2.txt", &report, -1, ExtractionMode::SemiSupervised);
        assert_eq!(extraction.original_report, "AP");
        assert_eq!(extraction.anomalies, vec!["history".to_string()]);
    }

    #[test]
    fn extract_reports_follows_first_seen_filename_order_and_counts() {
        let records = vec![
            Record::new("s2.txt", -1, RecordMetadata::default()),
            Record::new("s1.txt", 0, RecordMetadata::default()),
            Record::new("s2.txt", 3, RecordMetadata::default()),
            Record::new("s3.txt", 1, RecordMetadata::default()),
        ];
        let corpus = ReportCorpus::from_entries([
            ("s1.txt", nested(json!({"impression": "Edema."}))),
            ("s2.txt", nested(json!({"history": "Fever."}))),
            ("s3.txt", NestedReport::Plain(String::new())),
        ]);

        let outcome = extract_reports(&records, &corpus, ExtractionMode::SemiSupervised).unwrap();
        let order: Vec<&str> = outcome.reports.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(order, vec!["s2.txt", "s1.txt", "s3.txt"]);
        // s2 keeps the first record's severity (-1) and falls back.
        assert_eq!(outcome.reports[0].original_report, "Fever.");
        assert_eq!(outcome.stats.fallback_reports, 1);
        assert_eq!(outcome.stats.section_misses, 1);
        assert_eq!(outcome.stats.empty_reports, 1);

        let outcome = extract_reports(&records, &corpus, ExtractionMode::Supervised).unwrap();
        assert_eq!(outcome.stats.fallback_reports, 0);
        assert_eq!(outcome.stats.section_misses, 1);
        assert_eq!(outcome.stats.empty_reports, 2);
    }

    #[test]
    fn matched_but_empty_sections_count_as_misses() {
        let records = vec![Record::new("s4.txt", 2, RecordMetadata::default())];
        let corpus = ReportCorpus::from_entries([("s4.txt", nested(json!({"findings": ""})))]);
        let outcome = extract_reports(&records, &corpus, ExtractionMode::Supervised).unwrap();
        assert_eq!(outcome.reports[0].origin_section, vec!["finding".to_string()]);
        assert_eq!(outcome.stats.section_misses, 1);
        assert_eq!(outcome.stats.empty_reports, 1);
        assert_eq!(outcome.stats.fallback_reports, 0);
    }

    #[test]
    fn extract_reports_fails_on_missing_report() {
        let records = vec![Record::new("s9.txt", 0, RecordMetadata::default())];
        let corpus = ReportCorpus::default();
        assert!(matches!(
            extract_reports(&records, &corpus, ExtractionMode::Supervised),
            Err(DatasetError::MissingReport(_))
        ));
    }
}
