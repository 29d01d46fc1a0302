//! Tabular dataset types.
//!
//! ## Invariants
//!
//! 1. **Rectangularity**: every row of a `FeatureTable` has exactly one cell
//!    per column
//! 2. **Alignment**: `Dataset` labels are 1:1 with feature rows;
//!    `PredictionSet` labels are 1:1 with dataset labels
//! 3. **Sensitive subset**: resolved sensitive columns are a subset of the
//!    feature columns (possibly empty — downstream stages must tolerate that)

use serde::{Deserialize, Serialize};

/// Error type for feature table construction.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TableError {
    /// A row's width disagrees with the column count.
    #[error("Row {row} has {got} cells, expected {expected}")]
    RaggedRow {
        /// Row index.
        row: usize,
        /// Cell count observed.
        got: usize,
        /// Cell count expected.
        expected: usize,
    },
    /// Duplicate column name.
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),
}

/// Error type for dataset construction.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DatasetError {
    /// Label vector length disagrees with row count.
    #[error("Label count {labels} does not match row count {rows}")]
    LabelMismatch {
        /// Number of labels.
        labels: usize,
        /// Number of feature rows.
        rows: usize,
    },
    /// A sensitive column name is not a feature column.
    #[error("Sensitive column not present in features: {0}")]
    UnknownSensitiveColumn(String),
}

/// An ordered, named, rectangular table of f64 features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    /// Create a table, validating rectangularity and column uniqueness.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, TableError> {
        for (i, a) in columns.iter().enumerate() {
            if columns[i + 1..].contains(a) {
                return Err(TableError::DuplicateColumn(a.clone()));
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::RaggedRow {
                    row: i,
                    got: row.len(),
                    expected: columns.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Column names, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows, in order.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Index of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of one column, copied in row order.
    pub fn column_values(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r[index]).collect()
    }

    /// A table containing at most the first `n` rows.
    pub fn head(&self, n: usize) -> FeatureTable {
        FeatureTable {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Per-column mean over all rows (0.0 for an empty table).
    pub fn column_means(&self) -> Vec<f64> {
        if self.rows.is_empty() {
            return vec![0.0; self.columns.len()];
        }
        let n = self.rows.len() as f64;
        let mut means = vec![0.0; self.columns.len()];
        for row in &self.rows {
            for (j, v) in row.iter().enumerate() {
                means[j] += v;
            }
        }
        for m in &mut means {
            *m /= n;
        }
        means
    }
}

/// How the dataset backing an audit was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataOrigin {
    /// Loaded from a caller-supplied tabular file.
    File,
    /// Deterministically synthesized by the kernel.
    Synthetic,
}

/// A labeled tabular dataset with resolved sensitive columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Feature table.
    pub features: FeatureTable,
    /// Binary labels, aligned 1:1 with feature rows.
    pub labels: Vec<u8>,
    /// Resolved sensitive column names (subset of feature columns).
    pub sensitive_columns: Vec<String>,
    /// Where the data came from.
    pub origin: DataOrigin,
}

impl Dataset {
    /// Create a dataset, validating label alignment and sensitive-column
    /// membership.
    pub fn new(
        features: FeatureTable,
        labels: Vec<u8>,
        sensitive_columns: Vec<String>,
        origin: DataOrigin,
    ) -> Result<Self, DatasetError> {
        if labels.len() != features.num_rows() {
            return Err(DatasetError::LabelMismatch {
                labels: labels.len(),
                rows: features.num_rows(),
            });
        }
        for name in &sensitive_columns {
            if features.column_index(name).is_none() {
                return Err(DatasetError::UnknownSensitiveColumn(name.clone()));
            }
        }
        Ok(Self {
            features,
            labels,
            sensitive_columns,
            origin,
        })
    }

    /// First resolved sensitive column, if any. Bias/fairness stages use
    /// only this one; additional sensitive columns are a known limitation.
    pub fn primary_sensitive_column(&self) -> Option<&str> {
        self.sensitive_columns.first().map(String::as_str)
    }
}

/// Predicted labels, aligned 1:1 with the dataset's label vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionSet {
    labels: Vec<u8>,
}

impl PredictionSet {
    /// Wrap a predicted label vector.
    pub fn new(labels: Vec<u8>) -> Self {
        Self { labels }
    }

    /// Predicted labels in row order.
    pub fn labels(&self) -> &[u8] {
        &self.labels
    }

    /// Number of predictions.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether there are no predictions.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
