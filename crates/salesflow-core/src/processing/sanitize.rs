use polars::prelude::*;

use super::DataProcessor;
use crate::error::{PipelineError, Result};

const STAGE: &str = "sanitize";

impl DataProcessor {
    /// Normalizes a raw dataset.
    ///
    /// Column names and string cells are trimmed, the key column is title-cased,
    /// exact duplicate rows are dropped (first one kept) and finally rows without
    /// a key are removed. An empty dataset is returned as-is with a warning.
    pub fn sanitize(&self, df: &DataFrame) -> Result<DataFrame> {
        if df.height() == 0 {
            self.observer.warn(STAGE, "Empty dataset provided to sanitize.");
            return Ok(df.clone());
        }

        let result = self.sanitize_rows(df);
        self.report(
            STAGE,
            "Data sanitation completed.",
            "Error during data sanitation",
            result,
        )
    }

    fn sanitize_rows(&self, df: &DataFrame) -> Result<DataFrame> {
        let key = self.key_column();

        let trimmed = trim_frame(df)?;
        if trimmed.column(key).is_err() {
            return Err(PipelineError::MissingColumn {
                column: key.to_string(),
            });
        }

        let mut cased = trimmed;
        let key_column = title_case_column(cased.column(key)?)?;
        cased.with_column(key_column)?;

        let deduped = drop_duplicate_rows(&cased)?;

        let has_key = deduped.column(key)?.as_materialized_series().is_not_null();
        Ok(deduped.filter(&has_key)?)
    }
}

/// Trims every column name and every cell of the string-typed columns.
fn trim_frame(df: &DataFrame) -> Result<DataFrame> {
    let columns = df
        .get_columns()
        .iter()
        .map(|column| {
            let name: PlSmallStr = column.name().as_str().trim().into();
            if column.dtype() == &DataType::String {
                let values: Vec<Option<&str>> =
                    column.str()?.into_iter().map(|v| v.map(str::trim)).collect();
                Ok(Column::from(Series::new(name, values)))
            } else {
                Ok(column.clone().with_name(name))
            }
        })
        .collect::<PolarsResult<Vec<Column>>>()?;

    Ok(DataFrame::new(columns)?)
}

fn title_case_column(column: &Column) -> Result<Series> {
    let as_text = column.cast(&DataType::String)?;
    let values: Vec<Option<String>> = as_text
        .str()?
        .into_iter()
        .map(|v| v.map(title_case))
        .collect();
    Ok(Series::new(column.name().clone(), values))
}

/// Uppercases the first letter of every word and lowercases the rest. Any
/// non-alphabetic character starts a new word, so `"o'neil"` becomes `"O'Neil"`.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_word = false;

    for ch in value.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                // Multi-char uppercase forms (e.g. 'ß' -> "SS") keep only the
                // first char capital so the result is stable when re-applied.
                let mut upper = ch.to_uppercase();
                if let Some(first) = upper.next() {
                    out.push(first);
                }
                for rest in upper {
                    out.extend(rest.to_lowercase());
                }
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }

    out
}

/// Keeps the first occurrence of every row, comparing all columns. Nulls
/// compare equal to each other.
fn drop_duplicate_rows(df: &DataFrame) -> Result<DataFrame> {
    Ok(df
        .clone()
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?)
}
