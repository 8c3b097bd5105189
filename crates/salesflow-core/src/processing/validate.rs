use polars::prelude::*;

use super::DataProcessor;
use crate::error::{PipelineError, Result};
use crate::schema::MeasureColumns;

const STAGE: &str = "validate";
const THOUSANDS_SEPARATOR: char = ',';

impl DataProcessor {
    /// Coerces every measure column to `Float64`.
    ///
    /// Thousands separators are stripped from text cells and missing cells
    /// become `0.0`. The first cell that still is not a number aborts the step
    /// with [`PipelineError::TypeConversion`].
    pub fn validate(&self, df: &DataFrame, measures: &MeasureColumns) -> Result<DataFrame> {
        let result = coerce_measures(df, measures);
        self.report(
            STAGE,
            "Data validation and cleaning completed.",
            "Error during data validation",
            result,
        )
    }
}

fn coerce_measures(df: &DataFrame, measures: &MeasureColumns) -> Result<DataFrame> {
    let mut output = df.clone();
    for measure in measures {
        let column = df
            .column(measure.name())
            .map_err(|_| PipelineError::MissingColumn {
                column: measure.name().to_string(),
            })?;
        let values = coerce_column(column)?;
        output.with_column(Series::new(column.name().clone(), values))?;
    }
    Ok(output)
}

fn coerce_column(column: &Column) -> Result<Vec<f64>> {
    match column.dtype() {
        DataType::String => column
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, cell)| match cell {
                Some(raw) => parse_amount(raw).ok_or_else(|| PipelineError::TypeConversion {
                    column: column.name().to_string(),
                    row,
                    value: raw.to_string(),
                }),
                None => Ok(0.0),
            })
            .collect(),
        DataType::Null
        | DataType::Boolean
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float32
        | DataType::Float64 => {
            let floats = column.cast(&DataType::Float64)?;
            Ok(floats
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(0.0))
                .collect())
        }
        other => match first_present_cell(column)? {
            Some((row, value)) => Err(PipelineError::TypeConversion {
                column: column.name().to_string(),
                row,
                value: format!("{value} ({other})"),
            }),
            None => Ok(vec![0.0; column.len()]),
        },
    }
}

/// Parses `"1,000"`-style text. Blank text counts as a missing value.
///
/// Only an optional sign, digits and a single decimal point are accepted, so
/// words such as `nan` or `inf` and exponent forms are rejected.
fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|ch| *ch != THOUSANDS_SEPARATOR).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Some(0.0);
    }

    let unsigned = cleaned.strip_prefix(['+', '-']).unwrap_or(cleaned);
    let digits = unsigned.chars().filter(char::is_ascii_digit).count();
    let points = unsigned.chars().filter(|ch| *ch == '.').count();
    if digits == 0 || points > 1 || digits + points != unsigned.len() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn first_present_cell(column: &Column) -> Result<Option<(usize, String)>> {
    for row in 0..column.len() {
        let value = column.get(row)?;
        if !value.is_null() {
            return Ok(Some((row, value.to_string())));
        }
    }
    Ok(None)
}
