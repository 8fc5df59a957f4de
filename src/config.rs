use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::constants::pipeline::DEFAULT_SPLIT_SEED;
use crate::errors::DatasetError;
use crate::types::{Filename, LabelName, Severity};

/// Controls whether unlabeled documents get the full-report fallback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Documents without a canonical section keep an empty report.
    #[default]
    Supervised,
    /// Unlabeled documents without a canonical section are rebuilt from every section.
    SemiSupervised,
}

impl ExtractionMode {
    pub fn is_semi_supervised(self) -> bool {
        matches!(self, Self::SemiSupervised)
    }
}

/// How severities are rendered in classifier exports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputEncoding {
    /// Ordinal multi-hot code (`0 -> "000"`, `3 -> "111"`).
    #[default]
    Multilabel,
    /// Plain decimal class string.
    Multiclass,
}

impl OutputEncoding {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Multilabel => "multilabel",
            Self::Multiclass => "multiclass",
        }
    }
}

impl fmt::Display for OutputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputEncoding {
    type Err = DatasetError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "multilabel" => Ok(Self::Multilabel),
            "multiclass" => Ok(Self::Multiclass),
            other => Err(DatasetError::Configuration(format!(
                "unknown output encoding '{other}' (expected multilabel or multiclass)"
            ))),
        }
    }
}

/// Top-level build configuration.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Seed that fixes the stratified re-split.
    pub seed: u64,
    /// Extraction mode applied to the keyword-labeled branch.
    pub mode: ExtractionMode,
    /// Expected number of unique annotated documents after deduplication, if known.
    pub expected_annotated: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SPLIT_SEED,
            mode: ExtractionMode::Supervised,
            expected_annotated: None,
        }
    }
}

/// Input and output locations for a build.
#[derive(Clone, Debug)]
pub struct PipelinePaths {
    /// Directory holding `class0.txt` .. `class3.txt`.
    pub class_dir: PathBuf,
    /// Comma-separated human annotation table.
    pub annotations: PathBuf,
    /// JSON object mapping label names to severities.
    pub label_dictionary: PathBuf,
    /// Tab-separated report corpus with `filename` and `report` columns.
    pub reports: PathBuf,
    /// Optional list of unlabeled documents added to the pool with severity `-1`.
    pub unlabeled: Option<PathBuf>,
    /// Directory receiving `train.tsv`, `dev.tsv` and `test.tsv`.
    pub output_dir: PathBuf,
}

/// Label-name to severity mapping supplied by the caller.
///
/// Lookups are exact; callers lower-case annotation text before looking it up.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelDictionary {
    labels: HashMap<LabelName, Severity>,
}

impl LabelDictionary {
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Severity)>,
        K: Into<LabelName>,
    {
        Self {
            labels: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Load a `{"label name": severity}` JSON object.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let raw = fs::read_to_string(path.as_ref())?;
        let labels: HashMap<LabelName, Severity> = serde_json::from_str(&raw)?;
        if labels.is_empty() {
            return Err(DatasetError::Configuration(format!(
                "label dictionary {} is empty",
                path.as_ref().display()
            )));
        }
        Ok(Self { labels })
    }

    /// Severity for `label`, or a lookup failure naming the document it came from.
    pub fn lookup(&self, label: &str, filename: &Filename) -> Result<Severity, DatasetError> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| DatasetError::UnknownLabel {
                label: label.to_string(),
                filename: filename.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
