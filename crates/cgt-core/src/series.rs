//! Dense node × time series storage.
//!
//! Every generated chronic (load, renewable ceiling, dispatched production)
//! is a [`SeriesTable`]: an ordered set of named columns, one per node or
//! generator, all with the same number of samples. Column order is the
//! emission order of the CSV artifacts.

use serde::{Deserialize, Serialize};

use crate::error::{CgtError, CgtResult};

/// A node × time numeric table with stable column order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeriesTable {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl SeriesTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named column. All columns must share the same length.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> CgtResult<()> {
        if let Some(first) = self.columns.first() {
            if first.len() != values.len() {
                return Err(CgtError::Validation(format!(
                    "series length mismatch: table has {} samples, column has {}",
                    first.len(),
                    values.len()
                )));
            }
        }
        self.names.push(name.into());
        self.columns.push(values);
        Ok(())
    }

    /// Build a table from parallel name/column vectors.
    pub fn from_columns(
        names: Vec<String>,
        columns: Vec<Vec<f64>>,
    ) -> CgtResult<Self> {
        if names.len() != columns.len() {
            return Err(CgtError::Validation(format!(
                "{} names for {} columns",
                names.len(),
                columns.len()
            )));
        }
        let mut table = Self::new();
        for (name, column) in names.into_iter().zip(columns) {
            table.push_column(name, column)?;
        }
        Ok(table)
    }

    /// Number of time samples (0 for an empty table).
    pub fn len_time(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.index_of(name).map(|i| self.columns[i].as_slice())
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Vec<f64>> {
        let idx = self.index_of(name)?;
        Some(&mut self.columns[idx])
    }

    pub fn column_at(&self, idx: usize) -> &[f64] {
        &self.columns[idx]
    }

    pub fn column_at_mut(&mut self, idx: usize) -> &mut Vec<f64> {
        &mut self.columns[idx]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Per-timestep sum across all columns.
    pub fn total(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.len_time()];
        for column in &self.columns {
            for (acc, v) in out.iter_mut().zip(column) {
                *acc += v;
            }
        }
        out
    }

    /// Sub-table keeping only the named columns, in the order given.
    pub fn select(&self, names: &[String]) -> CgtResult<SeriesTable> {
        let mut table = SeriesTable::new();
        for name in names {
            let column = self
                .column(name)
                .ok_or_else(|| CgtError::Validation(format!("unknown column '{name}'")))?;
            table.push_column(name.clone(), column.to_vec())?;
        }
        Ok(table)
    }

    /// Clamp every value to `[min, max]` in place.
    pub fn clip(&mut self, min: f64, max: f64) {
        for column in &mut self.columns {
            for v in column.iter_mut() {
                *v = v.clamp(min, max);
            }
        }
    }

    /// Maximum absolute difference against another table with identical
    /// shape and column order.
    pub fn max_abs_diff(&self, other: &SeriesTable) -> CgtResult<f64> {
        if self.names != other.names || self.len_time() != other.len_time() {
            return Err(CgtError::Validation(
                "cannot diff tables with different shapes".into(),
            ));
        }
        let mut max = 0.0f64;
        for (a, b) in self.columns.iter().zip(&other.columns) {
            for (x, y) in a.iter().zip(b) {
                max = max.max((x - y).abs());
            }
        }
        Ok(max)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .map(|n| n.as_str())
            .zip(self.columns.iter().map(|c| c.as_slice()))
    }
}
