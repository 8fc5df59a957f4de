//! Record and nested report types.
//!
//! A [`Record`] is one labeled document; a [`NestedReport`] is the parsed
//! `report` cell of the corpus, either plain text or a section mapping.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::metadata::RecordMetadata;

pub use crate::types::{Filename, Keyword, SectionKey, SectionName, Sentence, Severity};

/// One document's classification unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Unique document identifier.
    pub filename: Filename,
    /// Ordinal severity label; `-1` means unlabeled.
    pub edema_severity: Severity,
    /// Stage-accumulated metadata.
    pub metadata: RecordMetadata,
}

impl Record {
    pub fn new(filename: impl Into<Filename>, edema_severity: Severity, metadata: RecordMetadata) -> Self {
        Self {
            filename: filename.into(),
            edema_severity,
            metadata,
        }
    }
}

/// A record joined with its extracted report text.
///
/// Provenance lives in `metadata.origin_section`.
#[derive(Clone, Debug, PartialEq)]
pub struct EnrichedRecord {
    pub filename: Filename,
    pub edema_severity: Severity,
    pub original_report: String,
    pub metadata: RecordMetadata,
}

/// Value stored under one section key of a nested report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionValue {
    /// A single block of text.
    Text(String),
    /// Text already split into pieces (joined with single spaces on use).
    Sentences(Vec<String>),
    /// Any other JSON shape; reported as a data-shape anomaly and never used as text.
    Other(Value),
}

/// Nested report as produced by upstream report digitization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NestedReport {
    /// Degenerate report stored as one plain string.
    Plain(String),
    /// Section key to value, in source order.
    Sections(IndexMap<SectionKey, SectionValue>),
}

/// Upstream sentence-split report consumed at export time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReport {
    pub sentences: Vec<Sentence>,
    /// Any further keys the normalizer emitted.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NormalizedReport {
    /// Report text as the classifier sees it.
    pub fn text(&self) -> String {
        self.sentences.join(" ")
    }
}
