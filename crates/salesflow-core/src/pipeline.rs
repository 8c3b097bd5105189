use std::sync::Arc;

use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::observer::PipelineObserver;
use crate::processing::{DataProcessor, ProcessorConfig};
use crate::schema::MeasureColumns;
use crate::sink::{CsvSink, DatasetSink, SqliteSink};
use crate::source;

/// Result tables of one run, before anything is written.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub measures: MeasureColumns,
    pub sanitized_rows: usize,
    pub totals: DataFrame,
    pub growth: DataFrame,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub input_rows: usize,
    pub sanitized_rows: usize,
    pub measure_columns: Vec<String>,
    pub growth_columns: Vec<String>,
    pub outputs: Vec<String>,
}

/// Runs the in-memory part of the pipeline: sanitize, describe the measure
/// columns, validate, then build the totals and growth tables.
pub fn process(
    processor: &DataProcessor,
    raw: &DataFrame,
    measure_marker: &str,
) -> Result<PipelineOutput> {
    let sanitized = processor.sanitize(raw)?;
    let measures = MeasureColumns::detect(&sanitized, measure_marker);
    let validated = processor.validate(&sanitized, &measures)?;
    let totals = processor.total_and_average(&validated, &measures)?;
    let growth = processor.growth(&validated, &measures)?;

    Ok(PipelineOutput {
        measures,
        sanitized_rows: sanitized.height(),
        totals,
        growth,
    })
}

/// Reads the configured input, processes it and writes every output.
///
/// Any failure is reported to `observer` and returned; outputs written before
/// the failure are left in place.
pub async fn run(
    config: &PipelineConfig,
    observer: Arc<dyn PipelineObserver>,
) -> Result<RunSummary> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let result = execute(config, observer.clone(), run_id, started_at)
        .instrument(tracing::info_span!("pipeline_run", %run_id))
        .await;
    match &result {
        Ok(summary) => observer.info(
            "pipeline",
            &format!(
                "Pipeline execution completed successfully ({} rows, {} outputs).",
                summary.sanitized_rows,
                summary.outputs.len()
            ),
        ),
        Err(err) => observer.error("pipeline", &format!("Pipeline execution failed: {err}")),
    }
    result
}

async fn execute(
    config: &PipelineConfig,
    observer: Arc<dyn PipelineObserver>,
    run_id: Uuid,
    started_at: DateTime<Utc>,
) -> Result<RunSummary> {
    config.validate()?;

    let raw = source::read_csv(&config.input_path)?;
    observer.info("source", "Successfully read raw data.");

    let processor = DataProcessor::new(
        ProcessorConfig {
            key_column: config.key_column.clone(),
        },
        observer.clone(),
    );
    let output = process(&processor, &raw, &config.measure_marker)?;

    let totals_csv: Box<dyn DatasetSink> = Box::new(CsvSink::new(config.totals_path()));
    let growth_csv: Box<dyn DatasetSink> = Box::new(CsvSink::new(config.growth_path()));
    let growth_table: Box<dyn DatasetSink> = Box::new(SqliteSink::new(
        config.database_path(),
        config.table_name.as_str(),
    ));
    let writes = [
        (totals_csv, &output.totals),
        (growth_csv, &output.growth),
        (growth_table, &output.growth),
    ];

    let mut outputs = Vec::with_capacity(writes.len());
    for (sink, df) in writes {
        sink.write(df).await?;
        let target = sink.describe();
        observer.info("sink", &format!("Data successfully saved to {target}"));
        outputs.push(target);
    }

    Ok(RunSummary {
        run_id,
        started_at,
        finished_at: Utc::now(),
        input_rows: raw.height(),
        sanitized_rows: output.sanitized_rows,
        measure_columns: output
            .measures
            .names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        growth_columns: output.measures.growth_column_names(),
        outputs,
    })
}
