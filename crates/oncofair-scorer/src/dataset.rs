//! Uploaded record tables and their preparation for scoring.
//!
//! A [`RecordTable`] is the raw CSV upload kept as strings. [`prepare`] turns
//! it into a [`PreparedTable`] for one task: unlabelled rows are dropped,
//! labels and ancestry are encoded to integers and biomarker columns are
//! filled (and scaled, for tasks that ask for it). Columns the task does not
//! name, such as `case_id`, never reach the prepared table.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use tracing::debug;

use crate::error::ScoreError;
use crate::normalise::{mean, minmax_scale_column};
use crate::task::{FeaturePrep, TaskDescriptor, ANCESTRY_COLUMN, RACE_COLUMN};

/// Cell values treated as missing, in addition to the empty string.
const NA_TOKENS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "<NA>", "#N/A", "#NA",
];

/// Category assigned to rows without a race/ancestry value.
pub const UNKNOWN_GROUP: &str = "Unknown";

pub fn is_missing(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || NA_TOKENS.contains(&cell)
}

/// Raw tabular upload. Header row required, every row the same width.
#[derive(Debug, Clone)]
pub struct RecordTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RecordTable {
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, ScoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        debug!(columns = headers.len(), rows = rows.len(), "parsed record table");
        Ok(Self { headers, rows })
    }

    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, ScoreError> {
        Self::from_csv_reader(bytes)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// All cells of a column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Count of each distinct value in a column, missing values counted as
    /// `Unknown`. Empty when the column is absent.
    pub fn value_counts(&self, name: &str) -> BTreeMap<String, u64> {
        let mut counts = BTreeMap::new();
        if let Some(values) = self.column(name) {
            for v in values {
                let key = if is_missing(v) { UNKNOWN_GROUP } else { v };
                *counts.entry(key.to_string()).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// Numeric view of a record table for a single task.
#[derive(Debug, Clone)]
pub struct PreparedTable {
    /// Encoded target labels.
    pub labels: Vec<i64>,
    /// Encoded ancestry group per row.
    pub ancestry: Vec<i64>,
    /// Prepared feature columns plus `ancestry`, keyed by column name.
    pub columns: BTreeMap<String, Vec<f64>>,
    /// Mean of each task feature after preparation, in task order.
    pub feature_means: Vec<(String, f64)>,
}

impl PreparedTable {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Row-major feature matrix in the given column order.
    pub fn feature_matrix(&self, names: &[String]) -> Result<Vec<Vec<f64>>, ScoreError> {
        let cols = names
            .iter()
            .map(|n| {
                self.columns
                    .get(n)
                    .ok_or_else(|| ScoreError::MissingColumn(n.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((0..self.len())
            .map(|row| cols.iter().map(|c| c[row]).collect())
            .collect())
    }
}

/// Prepare an upload for the given task.
pub fn prepare(table: &RecordTable, task: &TaskDescriptor) -> Result<PreparedTable, ScoreError> {
    let target = table
        .column(task.target_column)
        .ok_or_else(|| ScoreError::MissingTargetColumn(task.target_column.to_string()))?;

    let kept: Vec<usize> = target
        .iter()
        .enumerate()
        .filter(|(_, v)| !is_missing(v))
        .map(|(i, _)| i)
        .collect();

    // Fall back to race when no explicit ancestry column exists.
    let ancestry_raw = table
        .column(ANCESTRY_COLUMN)
        .or_else(|| table.column(RACE_COLUMN))
        .ok_or_else(|| ScoreError::MissingColumn(ANCESTRY_COLUMN.to_string()))?;

    let mut columns = BTreeMap::new();
    let mut feature_means = Vec::with_capacity(task.feature_columns.len());
    for &name in task.feature_columns {
        let raw = table
            .column(name)
            .ok_or_else(|| ScoreError::MissingColumn(name.to_string()))?;
        let mut values = kept
            .iter()
            .map(|&i| parse_feature(name, i, raw[i]))
            .collect::<Result<Vec<_>, _>>()?;
        if task.feature_prep == FeaturePrep::MinMaxScaled {
            minmax_scale_column(&mut values);
        }
        feature_means.push((name.to_string(), mean(&values)));
        columns.insert(name.to_string(), values);
    }

    let labels = encode_categorical(kept.iter().map(|&i| target[i]));
    let ancestry = encode_categorical(kept.iter().map(|&i| {
        let v = ancestry_raw[i];
        if is_missing(v) { UNKNOWN_GROUP } else { v }
    }));
    columns.insert(
        ANCESTRY_COLUMN.to_string(),
        ancestry.iter().map(|&a| a as f64).collect(),
    );

    debug!(
        task = task.name,
        rows = table.len(),
        kept = kept.len(),
        "prepared table"
    );

    Ok(PreparedTable { labels, ancestry, columns, feature_means })
}

fn parse_feature(column: &str, row: usize, cell: &str) -> Result<f64, ScoreError> {
    if is_missing(cell) {
        return Ok(0.0);
    }
    cell.trim().parse::<f64>().map_err(|_| ScoreError::InvalidValue {
        column: column.to_string(),
        row: row + 1,
        value: cell.to_string(),
    })
}

/// Encode a categorical column to integers.
/// Fully numeric columns are truncated to integers; anything else is label
/// encoded by the sorted position of each distinct string.
pub fn encode_categorical<'a>(values: impl Iterator<Item = &'a str>) -> Vec<i64> {
    let values: Vec<&str> = values.map(str::trim).collect();
    let numeric: Option<Vec<f64>> = values.iter().map(|v| v.parse::<f64>().ok()).collect();

    match numeric {
        Some(nums) => nums.into_iter().map(|n| n.trunc() as i64).collect(),
        None => {
            let classes: BTreeSet<&str> = values.iter().copied().collect();
            let index: BTreeMap<&str, i64> = classes
                .into_iter()
                .enumerate()
                .map(|(i, c)| (c, i as i64))
                .collect();
            values.iter().map(|v| index[v]).collect()
        }
    }
}
