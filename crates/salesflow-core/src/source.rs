use std::path::Path;

use polars::prelude::*;

use crate::error::{PipelineError, Result};

/// Reads a headed CSV file into a DataFrame.
///
/// Quoted amounts such as `"1,000"` stay text; the validator converts them.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(PipelineError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    tracing::debug!(path = %path.display(), rows = df.height(), "read source csv");
    Ok(df)
}
