use std::sync::Arc;

use polars::prelude::*;
use salesflow_core::{
    pipeline::process, DataProcessor, EventLevel, MeasureColumns, PipelineError,
    RecordingObserver,
};

fn mock_data() -> DataFrame {
    df!(
        "Country" => &[Some("usa"), Some("  Canada "), Some("UK"), None, Some("Australia")],
        "2000 Sales" => &[Some("1,000"), Some("2,000"), None, Some("500"), Some("1,500")],
        "2001 Sales" => &[Some("1,200"), Some("2,100"), Some("3,000"), Some("600"), Some("1,800")],
    )
    .expect("mock data")
}

fn sales_columns() -> MeasureColumns {
    MeasureColumns::from_names(["2000 Sales", "2001 Sales"])
}

fn strings(df: &DataFrame, column: &str) -> Vec<Option<String>> {
    df.column(column)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect()
}

fn floats(df: &DataFrame, column: &str) -> Vec<f64> {
    df.column(column)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .map(|v| v.expect("no nulls after validation"))
        .collect()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn sanitize_drops_null_countries_and_title_cases() {
    let processor = DataProcessor::default();
    let sanitized = processor.sanitize(&mock_data()).unwrap();

    assert_eq!(sanitized.height(), 4);
    assert_eq!(
        strings(&sanitized, "Country"),
        vec![
            Some("Usa".to_string()),
            Some("Canada".to_string()),
            Some("Uk".to_string()),
            Some("Australia".to_string()),
        ]
    );
}

#[test]
fn sanitize_requires_country_column() {
    let processor = DataProcessor::default();
    let without_country = mock_data().drop("Country").unwrap();

    let err = processor.sanitize(&without_country).unwrap_err();
    assert!(matches!(&err, PipelineError::MissingColumn { column } if column == "Country"));
    assert_eq!(err.to_string(), "Missing required column: Country");
}

#[test]
fn sanitize_returns_empty_dataset_with_warning() {
    let observer = RecordingObserver::new();
    let processor = DataProcessor::with_observer(Arc::new(observer.clone()));

    let sanitized = processor.sanitize(&DataFrame::empty()).unwrap();

    assert_eq!(sanitized.height(), 0);
    assert_eq!(sanitized.width(), 0);
    assert!(observer.contains(EventLevel::Warn, "Empty dataset"));
}

#[test]
fn sanitize_is_idempotent() {
    let processor = DataProcessor::default();
    let once = processor.sanitize(&mock_data()).unwrap();
    let twice = processor.sanitize(&once).unwrap();

    assert!(once.equals_missing(&twice));
}

#[test]
fn sanitize_trims_before_deduplicating() {
    let df = df!(
        " Country " => &["usa ", "USA", " Usa", "Canada"],
        "2000 Sales" => &["1,000", "1,000 ", "1,000", "2,000"],
    )
    .unwrap();

    let sanitized = DataProcessor::default().sanitize(&df).unwrap();

    assert_eq!(sanitized.height(), 2);
    assert!(sanitized.column("Country").is_ok());
    assert_eq!(
        strings(&sanitized, "2000 Sales"),
        vec![Some("1,000".to_string()), Some("2,000".to_string())]
    );
}

#[test]
fn sanitize_leaves_input_untouched() {
    let raw = mock_data();
    let _ = DataProcessor::default().sanitize(&raw).unwrap();

    assert_eq!(raw.height(), 5);
    assert_eq!(strings(&raw, "Country")[1], Some("  Canada ".to_string()));
}

#[test]
fn sanitize_reports_completion() {
    let observer = RecordingObserver::new();
    let processor = DataProcessor::with_observer(Arc::new(observer.clone()));

    processor.sanitize(&mock_data()).unwrap();

    assert!(observer.contains(EventLevel::Info, "Data sanitation completed."));
}

#[test]
fn sanitize_failure_is_reported_then_returned() {
    let observer = RecordingObserver::new();
    let processor = DataProcessor::with_observer(Arc::new(observer.clone()));

    let result = processor.sanitize(&mock_data().drop("Country").unwrap());

    assert!(result.is_err());
    assert!(observer.contains(EventLevel::Error, "Missing required column: Country"));
}

#[test]
fn validate_coerces_sales_columns() {
    let processor = DataProcessor::default();
    let sanitized = processor.sanitize(&mock_data()).unwrap();
    let validated = processor.validate(&sanitized, &sales_columns()).unwrap();

    assert_eq!(validated.column("2000 Sales").unwrap().dtype(), &DataType::Float64);
    assert_eq!(
        floats(&validated, "2000 Sales"),
        vec![1000.0, 2000.0, 0.0, 1500.0]
    );
    assert_eq!(
        floats(&validated, "2001 Sales"),
        vec![1200.0, 2100.0, 3000.0, 1800.0]
    );
    // Source frame keeps its text columns.
    assert_eq!(sanitized.column("2000 Sales").unwrap().dtype(), &DataType::String);
}

#[test]
fn validate_rejects_non_numeric_text() {
    let mut df = mock_data();
    df.with_column(Series::new(
        "2000 Sales".into(),
        &[Some("abc"), Some("def"), None, Some("500"), Some("1,500")],
    ))
    .unwrap();

    let err = DataProcessor::default()
        .validate(&df, &sales_columns())
        .unwrap_err();

    match err {
        PipelineError::TypeConversion { column, row, value } => {
            assert_eq!(column, "2000 Sales");
            assert_eq!(row, 0);
            assert_eq!(value, "abc");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn validate_rejects_nan_and_infinity_text() {
    for word in ["nan", "inf", "NaN", "-Infinity", "1e3"] {
        let df = df!(
            "Country" => &["Usa", "Canada"],
            "2000 Sales" => &["1,000", word],
            "2001 Sales" => &["1,200", "2,100"],
        )
        .unwrap();

        let err = DataProcessor::default()
            .validate(&df, &sales_columns())
            .unwrap_err();

        match err {
            PipelineError::TypeConversion { column, row, value } => {
                assert_eq!(column, "2000 Sales");
                assert_eq!(row, 1);
                assert_eq!(value, word);
            }
            other => panic!("unexpected error for {word}: {other}"),
        }
    }
}

#[test]
fn validate_treats_all_null_temporal_column_as_zero() {
    let df = DataFrame::new(vec![
        Series::new("Country".into(), &["Usa", "Canada"]).into(),
        Series::full_null("2000 Sales".into(), 2, &DataType::Date).into(),
        Series::new("2001 Sales".into(), &[1.0f64, 2.0]).into(),
    ])
    .unwrap();

    let validated = DataProcessor::default()
        .validate(&df, &sales_columns())
        .unwrap();

    assert_eq!(floats(&validated, "2000 Sales"), vec![0.0, 0.0]);
}

#[test]
fn validate_rejects_populated_temporal_column() {
    let dates = Series::new("2000 Sales".into(), &[None, Some(10_957i32)])
        .cast(&DataType::Date)
        .unwrap();
    let df = DataFrame::new(vec![
        Series::new("Country".into(), &["Usa", "Canada"]).into(),
        dates.into(),
        Series::new("2001 Sales".into(), &[1.0f64, 2.0]).into(),
    ])
    .unwrap();

    let err = DataProcessor::default()
        .validate(&df, &sales_columns())
        .unwrap_err();

    assert!(matches!(err, PipelineError::TypeConversion { row: 1, .. }));
}

#[test]
fn validate_accepts_numeric_and_null_columns() {
    let df = df!(
        "Country" => &["Usa", "Canada"],
        "2000 Sales" => &[Some(10i64), None],
        "2001 Sales" => &[Some(1.5f64), Some(-2.5f64)],
    )
    .unwrap();

    let validated = DataProcessor::default()
        .validate(&df, &sales_columns())
        .unwrap();

    assert_eq!(floats(&validated, "2000 Sales"), vec![10.0, 0.0]);
    assert_eq!(floats(&validated, "2001 Sales"), vec![1.5, -2.5]);
}

#[test]
fn validate_requires_named_columns() {
    let df = df!("Country" => &["Usa"], "2000 Sales" => &["1"]).unwrap();

    let err = DataProcessor::default()
        .validate(&df, &sales_columns())
        .unwrap_err();

    assert!(matches!(err, PipelineError::MissingColumn { column } if column == "2001 Sales"));
}

#[test]
fn totals_and_averages_are_appended() {
    let processor = DataProcessor::default();
    let sanitized = processor.sanitize(&mock_data()).unwrap();
    let validated = processor.validate(&sanitized, &sales_columns()).unwrap();
    let transformed = processor
        .total_and_average(&validated, &sales_columns())
        .unwrap();

    assert_eq!(transformed.width(), validated.width() + 2);
    let totals = floats(&transformed, "Total Sales");
    let averages = floats(&transformed, "Average Sales");
    assert_close(totals[0], 2200.0);
    assert_close(averages[0], 1100.0);
    assert_close(totals[2], 3000.0);
    assert_close(averages[2], 1500.0);

    for (total, average) in totals.iter().zip(&averages) {
        assert_close(*average, total / 2.0);
    }
}

#[test]
fn totals_require_measure_columns() {
    let df = df!("Country" => &["Usa"]).unwrap();

    let err = DataProcessor::default()
        .total_and_average(&df, &MeasureColumns::default())
        .unwrap_err();

    assert!(matches!(err, PipelineError::EmptyMeasureColumns));
}

#[test]
fn totals_reject_existing_total_column() {
    let df = df!(
        "Country" => &["Usa"],
        "2000 Sales" => &[1.0f64],
        "2001 Sales" => &[2.0f64],
        "Total Sales" => &[3.0f64],
    )
    .unwrap();

    let err = DataProcessor::default()
        .total_and_average(&df, &sales_columns())
        .unwrap_err();

    assert!(matches!(&err, PipelineError::DuplicateColumn { column } if column == "Total Sales"));
    assert_eq!(err.to_string(), "column 'Total Sales' already exists in the dataset");
}

#[test]
fn growth_rejects_existing_growth_column() {
    let df = df!(
        "Country" => &["Usa"],
        "2000 Sales" => &[1.0f64],
        "2001 Sales" => &[2.0f64],
        "Growth 2000-2001" => &[100.0f64],
    )
    .unwrap();

    let err = DataProcessor::default()
        .growth(&df, &sales_columns())
        .unwrap_err();

    assert!(
        matches!(&err, PipelineError::DuplicateColumn { column } if column == "Growth 2000-2001")
    );
}

#[test]
fn growth_names_stay_distinct_for_dashed_labels() {
    let df = df!(
        "Country" => &["Usa"],
        "a-b" => &[1.0f64],
        "c" => &[2.0f64],
        "a" => &[4.0f64],
        "b-c" => &[8.0f64],
    )
    .unwrap();
    let measures = MeasureColumns::from_names(["a-b", "c", "a", "b-c"]);

    let transformed = DataProcessor::default().growth(&df, &measures).unwrap();

    assert_eq!(transformed.width(), df.width() + 3);
    assert_close(floats(&transformed, "Growth a-b-c")[0], 100.0);
    assert_close(floats(&transformed, "Growth c-a")[0], 100.0);
    assert_close(floats(&transformed, "Growth a-b-c (2)")[0], 100.0);
}

#[test]
fn growth_columns_follow_adjacent_pairs() {
    let processor = DataProcessor::default();
    let sanitized = processor.sanitize(&mock_data()).unwrap();
    let validated = processor.validate(&sanitized, &sales_columns()).unwrap();
    let transformed = processor.growth(&validated, &sales_columns()).unwrap();

    assert_eq!(transformed.width(), validated.width() + 1);
    let growth = floats(&transformed, "Growth 2000-2001");
    assert_close(growth[0], 20.0);
    assert_close(growth[1], 5.0);
    // UK had no 2000 sales, so the baseline is divided as 1.
    assert_close(growth[2], 300_000.0);
    assert_close(growth[3], 20.0);
}

#[test]
fn growth_uses_caller_order() {
    let df = df!(
        "Country" => &["Usa"],
        "2000 Sales" => &[100.0f64],
        "2001 Sales" => &[150.0f64],
        "2002 Sales" => &[0.0f64],
    )
    .unwrap();
    let measures = MeasureColumns::from_names(["2002 Sales", "2000 Sales", "2001 Sales"]);

    let transformed = DataProcessor::default().growth(&df, &measures).unwrap();

    assert_close(floats(&transformed, "Growth 2002-2000")[0], 10_000.0);
    assert_close(floats(&transformed, "Growth 2000-2001")[0], 50.0);
    assert_eq!(transformed.width(), 6);
}

#[test]
fn growth_with_single_measure_adds_nothing() {
    let df = df!("Country" => &["Usa"], "2000 Sales" => &[1.0f64]).unwrap();
    let measures = MeasureColumns::from_names(["2000 Sales"]);

    let transformed = DataProcessor::default().growth(&df, &measures).unwrap();

    assert!(transformed.equals(&df));
}

#[test]
fn process_runs_every_stage() {
    let observer = RecordingObserver::new();
    let processor = DataProcessor::with_observer(Arc::new(observer.clone()));

    let output = process(&processor, &mock_data(), "Sales").unwrap();

    assert_eq!(output.sanitized_rows, 4);
    assert_eq!(output.measures.names(), vec!["2000 Sales", "2001 Sales"]);
    assert!(output.totals.column("Total Sales").is_ok());
    assert!(output.totals.column("Growth 2000-2001").is_err());
    assert!(output.growth.column("Growth 2000-2001").is_ok());
    assert!(output.growth.column("Total Sales").is_err());

    for message in [
        "Data sanitation completed.",
        "Data validation and cleaning completed.",
        "Total and average sales calculated.",
        "Year-over-year growth calculated.",
    ] {
        assert!(observer.contains(EventLevel::Info, message), "missing {message}");
    }
}

#[test]
fn process_ignores_derived_columns_when_detecting_measures() {
    let mut raw = mock_data();
    raw.with_column(Series::new(
        "Growth 1999-2000 Sales".into(),
        &["n/a", "n/a", "n/a", "n/a", "n/a"],
    ))
    .unwrap();

    let output = process(&DataProcessor::default(), &raw, "Sales").unwrap();

    assert_eq!(output.measures.names(), vec!["2000 Sales", "2001 Sales"]);
    assert!(output.growth.column("Growth 2000-2001").is_ok());
}

#[test]
fn process_rejects_already_processed_input() {
    let processor = DataProcessor::default();
    let first = process(&processor, &mock_data(), "Sales").unwrap();

    let err = process(&processor, &first.totals, "Sales").unwrap_err();

    assert!(matches!(&err, PipelineError::DuplicateColumn { column } if column == "Total Sales"));
}
