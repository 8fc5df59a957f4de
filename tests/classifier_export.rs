use std::fs;

use serde_json::json;
use tempfile::tempdir;

use edema_dataset::apps::run_export_classifier;
use edema_dataset::{Column, Dataset, DatasetRow, NormalizedReport, RecordMetadata};

fn normalized_row(filename: &str, severity: i64, sentences: &[&str]) -> DatasetRow {
    DatasetRow {
        filename: filename.to_string(),
        edema_severity: severity,
        original_report: Some(sentences.join(" ")),
        metadata: RecordMetadata::with_keywords(vec!["edema".to_string()])
            .with_origin_section(vec!["impression".to_string()]),
        normalized_report: Some(NormalizedReport {
            sentences: sentences.iter().map(|s| s.to_string()).collect(),
            extra: serde_json::from_value(json!({"tokenizer": "scispacy"})).unwrap(),
        }),
    }
}

fn normalized_dataset() -> Dataset {
    Dataset::new(
        vec![
            Column::Filename,
            Column::EdemaSeverity,
            Column::OriginalReport,
            Column::Metadata,
            Column::NormalizedReport,
        ],
        vec![
            normalized_row("s500.txt", 3, &["alveolar edema .", "bilateral effusions ."]),
            normalized_row("s501.txt", 0, &["no acute process ."]),
            normalized_row("s502.txt", -1, &["unchanged ."]),
        ],
    )
    .unwrap()
}

#[test]
fn normalized_table_round_trips_through_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("train_normalized.tsv");
    let dataset = normalized_dataset();
    dataset.write_tsv(&path).unwrap();
    let read = Dataset::read_tsv(&path).unwrap();
    assert_eq!(dataset.first_difference(&read), None);
    assert_eq!(
        read.rows()[0].normalized_report.as_ref().unwrap().extra["tokenizer"],
        json!("scispacy")
    );
}

#[test]
fn export_runner_writes_multilabel_rows() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("train_normalized.tsv");
    let output = dir.path().join("bert").join("train.tsv");
    normalized_dataset().write_tsv(&input).unwrap();

    let args = vec![
        "--input".to_string(),
        input.display().to_string(),
        "--output".to_string(),
        output.display().to_string(),
    ];
    run_export_classifier(args.into_iter()).unwrap();

    let written = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(
        lines,
        vec![
            "id\tlabel\treport_id\talpha\ttext",
            "0\t111\t500\ta\talveolar edema . bilateral effusions .",
            "1\t000\t501\ta\tno acute process .",
            "2\t-1\t502\ta\tunchanged .",
        ]
    );
}

#[test]
fn export_runner_rejects_out_of_range_severity() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("bad.tsv");
    let output = dir.path().join("out.tsv");
    let dataset = Dataset::new(
        vec![
            Column::Filename,
            Column::EdemaSeverity,
            Column::Metadata,
            Column::NormalizedReport,
        ],
        vec![DatasetRow {
            original_report: None,
            ..normalized_row("s9.txt", 4, &["x ."])
        }],
    )
    .unwrap();
    dataset.write_tsv(&input).unwrap();

    let args = vec![
        "--input".to_string(),
        input.display().to_string(),
        "--output".to_string(),
        output.display().to_string(),
        "--encoding".to_string(),
        "multiclass".to_string(),
    ];
    let err = run_export_classifier(args.into_iter()).unwrap_err();
    assert!(err.to_string().contains("severity 4"));
    assert!(!output.exists());
}
