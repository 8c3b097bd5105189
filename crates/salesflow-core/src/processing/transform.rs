use polars::prelude::*;

use super::DataProcessor;
use crate::error::{PipelineError, Result};
use crate::schema::{MeasureColumns, AVERAGE_COLUMN, TOTAL_COLUMN};

const TOTALS_STAGE: &str = "total_and_average";
const GROWTH_STAGE: &str = "growth";

impl DataProcessor {
    /// Appends `Total Sales` and `Average Sales`, the row-wise sum and mean of
    /// the measure columns. Expects validated (`Float64`) measures.
    pub fn total_and_average(
        &self,
        df: &DataFrame,
        measures: &MeasureColumns,
    ) -> Result<DataFrame> {
        let result = append_totals(df, measures);
        self.report(
            TOTALS_STAGE,
            "Total and average sales calculated.",
            "Error during total and average transformation",
            result,
        )
    }

    /// Appends one `Growth <Y1>-<Y2>` column per adjacent pair of measures, in
    /// the order given.
    ///
    /// Growth is `(next - prev) / prev * 100`, except that a `prev` of zero is
    /// divided as if it were one. A year with no prior sales therefore reports
    /// `next * 100` rather than an infinite or undefined change. That figure is
    /// not a true percentage.
    pub fn growth(&self, df: &DataFrame, measures: &MeasureColumns) -> Result<DataFrame> {
        let result = append_growth(df, measures);
        self.report(
            GROWTH_STAGE,
            "Year-over-year growth calculated.",
            "Error during growth transformation",
            result,
        )
    }
}

fn append_totals(df: &DataFrame, measures: &MeasureColumns) -> Result<DataFrame> {
    if measures.is_empty() {
        return Err(PipelineError::EmptyMeasureColumns);
    }

    let len = df.height();
    let mut totals = vec![0.0f64; len];
    for measure in measures {
        let values = df.column(measure.name())?.f64()?;
        for (idx, total) in totals.iter_mut().enumerate() {
            *total += values.get(idx).unwrap_or(0.0);
        }
    }

    for name in [TOTAL_COLUMN, AVERAGE_COLUMN] {
        ensure_absent(df, name)?;
    }

    let count = measures.len() as f64;
    let averages: Vec<f64> = totals.iter().map(|total| total / count).collect();

    let mut output = df.clone();
    output.hstack_mut(&mut [
        Series::new(TOTAL_COLUMN.into(), totals).into(),
        Series::new(AVERAGE_COLUMN.into(), averages).into(),
    ])?;

    Ok(output)
}

fn append_growth(df: &DataFrame, measures: &MeasureColumns) -> Result<DataFrame> {
    let names = measures.names();
    let growth_names = measures.growth_column_names();

    let mut columns: Vec<Column> = Vec::with_capacity(growth_names.len());
    for (pair, growth_name) in names.windows(2).zip(growth_names) {
        ensure_absent(df, &growth_name)?;
        let previous = df.column(pair[0])?.f64()?;
        let next = df.column(pair[1])?.f64()?;

        let values: Vec<Option<f64>> = previous
            .into_iter()
            .zip(next)
            .map(|(prev, next)| match (prev, next) {
                (Some(prev), Some(next)) => Some(growth_rate(prev, next)),
                _ => None,
            })
            .collect();

        columns.push(Series::new(growth_name.into(), values).into());
    }

    let mut output = df.clone();
    output.hstack_mut(columns.as_mut_slice())?;
    Ok(output)
}

fn ensure_absent(df: &DataFrame, name: &str) -> Result<()> {
    if df.column(name).is_ok() {
        return Err(PipelineError::DuplicateColumn {
            column: name.to_string(),
        });
    }
    Ok(())
}

fn growth_rate(previous: f64, next: f64) -> f64 {
    let denominator = if previous == 0.0 { 1.0 } else { previous };
    (next - previous) / denominator * 100.0
}
