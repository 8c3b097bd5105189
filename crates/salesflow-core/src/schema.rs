use std::collections::{HashMap, HashSet};
use std::fmt;

use polars::prelude::DataFrame;

pub const DEFAULT_KEY_COLUMN: &str = "Country";
pub const DEFAULT_MEASURE_MARKER: &str = "Sales";
pub const TOTAL_COLUMN: &str = "Total Sales";
pub const AVERAGE_COLUMN: &str = "Average Sales";
pub const GROWTH_PREFIX: &str = "Growth ";

const YEAR_PREFIX_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MeasureColumn(String);

impl MeasureColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// The leading four-digit year of the column name, e.g. `"2000 Sales"` -> `"2000"`.
    pub fn year_prefix(&self) -> Option<&str> {
        let prefix = self.0.get(..YEAR_PREFIX_LEN)?;
        prefix
            .bytes()
            .all(|b| b.is_ascii_digit())
            .then_some(prefix)
    }
}

impl fmt::Display for MeasureColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered list of the numeric measure columns of a dataset.
///
/// Order matters: growth is computed between neighbours in this order, which
/// callers treat as chronological.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasureColumns {
    columns: Vec<MeasureColumn>,
}

impl MeasureColumns {
    /// Selects every column whose name contains `marker` (case-sensitive), in
    /// schema order. Columns this crate derives (totals, averages and growth)
    /// are never measures.
    pub fn detect(df: &DataFrame, marker: &str) -> Self {
        let columns = df
            .get_columns()
            .iter()
            .map(|column| column.name().as_str())
            .filter(|name| name.contains(marker) && !is_derived_column(name))
            .map(MeasureColumn::new)
            .collect();
        Self { columns }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: names.into_iter().map(MeasureColumn::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MeasureColumn> {
        self.columns.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(MeasureColumn::name).collect()
    }

    /// Labels used when naming growth columns. A column contributes its year
    /// prefix when it has one that no other measure column shares, and its full
    /// name otherwise, so labels never collide.
    pub fn year_labels(&self) -> Vec<String> {
        let mut prefix_counts: HashMap<&str, usize> = HashMap::new();
        for column in &self.columns {
            if let Some(prefix) = column.year_prefix() {
                *prefix_counts.entry(prefix).or_default() += 1;
            }
        }

        self.columns
            .iter()
            .map(|column| match column.year_prefix() {
                Some(prefix) if prefix_counts.get(prefix) == Some(&1) => prefix.to_string(),
                _ => column.name().to_string(),
            })
            .collect()
    }

    /// Names of the growth columns produced for each adjacent pair.
    ///
    /// Labels may themselves contain `-`, so two pairs can join to the same
    /// text. Later repeats get a ` (n)` suffix, keeping every name unique.
    pub fn growth_column_names(&self) -> Vec<String> {
        let mut used: HashSet<String> = HashSet::new();
        self.year_labels()
            .windows(2)
            .map(|pair| {
                let base = format!("{GROWTH_PREFIX}{}-{}", pair[0], pair[1]);
                let mut name = base.clone();
                let mut n = 2;
                while used.contains(&name) {
                    name = format!("{base} ({n})");
                    n += 1;
                }
                used.insert(name.clone());
                name
            })
            .collect()
    }
}

fn is_derived_column(name: &str) -> bool {
    name == TOTAL_COLUMN || name == AVERAGE_COLUMN || name.starts_with(GROWTH_PREFIX)
}

impl<'a> IntoIterator for &'a MeasureColumns {
    type Item = &'a MeasureColumn;
    type IntoIter = std::slice::Iter<'a, MeasureColumn>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.iter()
    }
}
