use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, ValueEnum, error::ErrorKind};

use crate::config::{ExtractionMode, OutputEncoding, PipelineConfig, PipelinePaths};
use crate::constants::pipeline::DEFAULT_SPLIT_SEED;
use crate::encoding::{classifier_rows, write_classifier_tsv};
use crate::pipeline::{BuildSummary, build_dataset};
use crate::table::Dataset;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Supervised,
    SemiSupervised,
}

impl From<ModeArg> for ExtractionMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Supervised => ExtractionMode::Supervised,
            ModeArg::SemiSupervised => ExtractionMode::SemiSupervised,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "build_dataset",
    disable_help_subcommand = true,
    about = "Build train/dev/test tables from labels and reports",
    long_about = "Read keyword-labeled class files and the human annotation table, extract report text, and write a stratified train/dev re-split plus the annotated test set.",
    after_help = "Set RUST_LOG=info to see per-stage diagnostics."
)]
/// CLI for `build_dataset`.
///
/// Common usage:
/// - `build_dataset --class-dir labels/ --annotations report_label.csv --labels labels.json --reports reports.tsv --output-dir out/`
/// - Add `--expected-annotated 485` to fail when deduplication leaves a different count
/// - Add `--unlabeled unlabeled.txt --mode semi-supervised` to keep unlabeled reports with no canonical section
struct BuildDatasetCli {
    #[arg(long = "class-dir", value_name = "DIR", help = "Directory holding class0.txt .. class3.txt")]
    class_dir: PathBuf,
    #[arg(long, value_name = "CSV", help = "Human annotation table")]
    annotations: PathBuf,
    #[arg(long = "labels", value_name = "JSON", help = "Label name to severity dictionary")]
    label_dictionary: PathBuf,
    #[arg(long, value_name = "TSV", help = "Report corpus with filename and report columns")]
    reports: PathBuf,
    #[arg(
        long,
        value_name = "TXT",
        help = "Unlabeled documents (one filename per line) added to the pool with severity -1"
    )]
    unlabeled: Option<PathBuf>,
    #[arg(long = "output-dir", value_name = "DIR", help = "Directory for train.tsv, dev.tsv and test.tsv")]
    output_dir: PathBuf,
    #[arg(long, default_value_t = DEFAULT_SPLIT_SEED, help = "Seed for the stratified re-split")]
    seed: u64,
    #[arg(long, value_enum, default_value = "supervised", help = "Extraction mode for the keyword-labeled pool")]
    mode: ModeArg,
    #[arg(
        long = "expected-annotated",
        value_name = "COUNT",
        help = "Expected unique annotated documents after deduplication"
    )]
    expected_annotated: Option<usize>,
}

#[derive(Debug, Parser)]
#[command(
    name = "export_classifier",
    disable_help_subcommand = true,
    about = "Convert a normalized dataset table into classifier input",
    long_about = "Read a dataset table with a normalized_report column and write id, label, report_id, alpha, text rows."
)]
struct ExportClassifierCli {
    #[arg(long, value_name = "TSV", help = "Dataset table with a normalized_report column")]
    input: PathBuf,
    #[arg(long, value_name = "TSV", help = "Classifier table to write")]
    output: PathBuf,
    #[arg(
        long,
        default_value = "multilabel",
        value_parser = parse_encoding_arg,
        help = "Label encoding: multilabel (ordinal code) or multiclass (plain class)"
    )]
    encoding: OutputEncoding,
}

pub fn run_build_dataset<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) = parse_cli::<BuildDatasetCli, _>(
        std::iter::once("build_dataset".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let paths = PipelinePaths {
        class_dir: cli.class_dir,
        annotations: cli.annotations,
        label_dictionary: cli.label_dictionary,
        reports: cli.reports,
        unlabeled: cli.unlabeled,
        output_dir: cli.output_dir,
    };
    let config = PipelineConfig {
        seed: cli.seed,
        mode: cli.mode.into(),
        expected_annotated: cli.expected_annotated,
    };
    let summary = build_dataset(&paths, &config)?;
    print_build_summary(&summary);
    Ok(())
}

pub fn run_export_classifier<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) = parse_cli::<ExportClassifierCli, _>(
        std::iter::once("export_classifier".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let dataset = Dataset::read_tsv(&cli.input)?;
    let rows = classifier_rows(&dataset, cli.encoding)?;
    write_classifier_tsv(&cli.output, &rows)?;
    println!(
        "wrote {} {} rows to {}",
        rows.len(),
        cli.encoding,
        cli.output.display()
    );
    Ok(())
}

fn print_build_summary(summary: &BuildSummary) {
    println!("=== keyword-labeled pool ===");
    println!("records read          : {}", summary.keyword_records);
    println!("unlabeled records     : {}", summary.unlabeled_records);
    println!("duplicated filenames  : {}", summary.keyword_duplicates.len());
    println!("also annotated        : {}", summary.overlap_removed.len());
    println!(
        "empty / fallback      : {} / {}",
        summary.keyword_extraction.empty_reports, summary.keyword_extraction.fallback_reports
    );
    println!("=== annotated set ===");
    println!("records read          : {}", summary.annotated_records);
    println!("unlabeled rows        : {}", summary.annotated_unlabeled.len());
    println!("duplicated filenames  : {}", summary.annotated_duplicates.len());
    println!("empty reports         : {}", summary.annotated_extraction.empty_reports);
    println!("=== split targets ===");
    for target in &summary.split_targets {
        println!(
            "label {:>2}: pool={} held-out={} -> train={} dev={}",
            target.severity, target.train_len, target.test_len, target.new_train_len, target.new_dev_len
        );
    }
    println!(
        "train={} dev={} test={}",
        summary.train_len, summary.dev_len, summary.test_len
    );
    for path in &summary.outputs {
        println!("wrote {}", path.display());
    }
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

fn parse_encoding_arg(raw: &str) -> Result<OutputEncoding, String> {
    raw.trim().parse().map_err(|err: crate::DatasetError| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_cli_applies_defaults() {
        let cli = parse_cli::<BuildDatasetCli, _>([
            "build_dataset",
            "--class-dir",
            "labels",
            "--annotations",
            "a.csv",
            "--labels",
            "labels.json",
            "--reports",
            "r.tsv",
            "--output-dir",
            "out",
        ])
        .unwrap()
        .unwrap();
        assert_eq!(cli.seed, DEFAULT_SPLIT_SEED);
        assert!(matches!(cli.mode, ModeArg::Supervised));
        assert!(cli.expected_annotated.is_none());
        assert!(cli.unlabeled.is_none());
    }

    #[test]
    fn build_cli_accepts_semi_supervised_mode() {
        let cli = parse_cli::<BuildDatasetCli, _>([
            "build_dataset",
            "--class-dir",
            "labels",
            "--annotations",
            "a.csv",
            "--labels",
            "labels.json",
            "--reports",
            "r.tsv",
            "--output-dir",
            "out",
            "--mode",
            "semi-supervised",
            "--expected-annotated",
            "12",
            "--unlabeled",
            "unlabeled.txt",
        ])
        .unwrap()
        .unwrap();
        assert!(ExtractionMode::from(cli.mode).is_semi_supervised());
        assert_eq!(cli.expected_annotated, Some(12));
        assert_eq!(cli.unlabeled, Some(PathBuf::from("unlabeled.txt")));
    }

    #[test]
    fn export_cli_rejects_unknown_encoding() {
        let result = parse_cli::<ExportClassifierCli, _>([
            "export_classifier",
            "--input",
            "in.tsv",
            "--output",
            "out.tsv",
            "--encoding",
            "ordinal",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn help_is_not_an_error() {
        let result = parse_cli::<ExportClassifierCli, _>(["export_classifier", "--help"]).unwrap();
        assert!(result.is_none());
    }
}
