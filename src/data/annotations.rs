//! Per-cell annotation table (observation metadata).

use crate::error::{Result, SubsetError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// An annotation value that can be categorical or continuous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Variable {
    /// Categorical label (e.g. a cell type).
    Categorical(String),
    /// Continuous numeric value (e.g. a QC metric).
    Continuous(f64),
    /// Missing value.
    Missing,
}

impl Variable {
    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Variable::Missing)
    }

    /// Try to get as categorical string.
    pub fn as_categorical(&self) -> Option<&str> {
        match self {
            Variable::Categorical(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as continuous f64.
    pub fn as_continuous(&self) -> Option<f64> {
        match self {
            Variable::Continuous(v) => Some(*v),
            _ => None,
        }
    }

    fn to_field(&self) -> String {
        match self {
            Variable::Categorical(s) => s.clone(),
            Variable::Continuous(v) => v.to_string(),
            Variable::Missing => "NA".to_string(),
        }
    }
}

/// Inferred type of an annotation column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    Categorical,
    Continuous,
}

fn is_missing_field(raw: &str) -> bool {
    raw.is_empty() || raw == "NA" || raw == "na"
}

/// Annotations for each cell, stored column-wise and aligned by row position.
#[derive(Debug, Clone, Default)]
pub struct CellAnnotations {
    /// Cell IDs in row order.
    cell_ids: Vec<String>,
    /// Column names in file order.
    column_names: Vec<String>,
    /// Column name -> one value per cell.
    columns: HashMap<String, Vec<Variable>>,
    /// Inferred type of each column.
    column_types: HashMap<String, VariableType>,
}

impl CellAnnotations {
    /// Create an annotation table with cell IDs and no columns.
    pub fn new(cell_ids: Vec<String>) -> Self {
        Self {
            cell_ids,
            ..Self::default()
        }
    }

    /// Add (or replace) a categorical column.
    pub fn with_categorical<S: AsRef<str>>(self, name: &str, labels: &[S]) -> Result<Self> {
        let values = labels
            .iter()
            .map(|s| {
                let raw = s.as_ref();
                if is_missing_field(raw) {
                    Variable::Missing
                } else {
                    Variable::Categorical(raw.to_string())
                }
            })
            .collect();
        self.with_column(name, values, VariableType::Categorical)
    }

    /// Add (or replace) a continuous column.
    pub fn with_continuous(self, name: &str, values: &[f64]) -> Result<Self> {
        let values = values.iter().map(|&v| Variable::Continuous(v)).collect();
        self.with_column(name, values, VariableType::Continuous)
    }

    fn with_column(
        mut self,
        name: &str,
        values: Vec<Variable>,
        var_type: VariableType,
    ) -> Result<Self> {
        if values.len() != self.n_cells() {
            return Err(SubsetError::ShapeMismatch {
                expected: self.n_cells(),
                actual: values.len(),
            });
        }
        if !self.columns.contains_key(name) {
            self.column_names.push(name.to_string());
        }
        self.columns.insert(name.to_string(), values);
        self.column_types.insert(name.to_string(), var_type);
        Ok(self)
    }

    /// Load annotations from a TSV file.
    ///
    /// Expected format:
    /// - First row: header with column names (first column is the cell ID)
    /// - Subsequent rows: cell ID followed by annotation values
    ///
    /// Columns are inferred as continuous if every non-missing value parses as a
    /// number, otherwise categorical. Short rows are padded with missing values.
    /// A header-only file yields a table with zero cells.
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_path(path)?;

        let header: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        if header.len() < 2 {
            return Err(SubsetError::EmptyData(
                "Annotations must have at least one column besides the cell ID".to_string(),
            ));
        }
        let column_names: Vec<String> = header[1..].to_vec();

        let mut cell_ids = Vec::new();
        let mut raw_columns: Vec<Vec<String>> = vec![Vec::new(); column_names.len()];
        for record in reader.records() {
            let record = record?;
            let Some(cell_id) = record.get(0) else {
                continue;
            };
            if cell_id.trim().is_empty() && record.len() <= 1 {
                continue;
            }
            cell_ids.push(cell_id.trim().to_string());
            for (col_idx, column) in raw_columns.iter_mut().enumerate() {
                let raw = record.get(col_idx + 1).unwrap_or("").trim();
                column.push(raw.to_string());
            }
        }

        let mut columns = HashMap::new();
        let mut column_types = HashMap::new();
        for (name, raw) in column_names.iter().zip(raw_columns) {
            let all_numeric = raw
                .iter()
                .all(|v| is_missing_field(v) || v.parse::<f64>().is_ok());
            let var_type = if all_numeric {
                VariableType::Continuous
            } else {
                VariableType::Categorical
            };
            let values = raw
                .into_iter()
                .map(|v| {
                    if is_missing_field(&v) {
                        return Variable::Missing;
                    }
                    match var_type {
                        VariableType::Continuous => v
                            .parse::<f64>()
                            .map(Variable::Continuous)
                            .unwrap_or(Variable::Missing),
                        VariableType::Categorical => Variable::Categorical(v),
                    }
                })
                .collect();
            columns.insert(name.clone(), values);
            column_types.insert(name.clone(), var_type);
        }

        Ok(Self {
            cell_ids,
            column_names,
            columns,
            column_types,
        })
    }

    /// Write the annotations to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "cell_id")?;
        for name in &self.column_names {
            write!(writer, "\t{}", name)?;
        }
        writeln!(writer)?;

        for (row, cell_id) in self.cell_ids.iter().enumerate() {
            write!(writer, "{}", cell_id)?;
            for name in &self.column_names {
                write!(writer, "\t{}", self.columns[name][row].to_field())?;
            }
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Cell IDs in row order.
    pub fn cell_ids(&self) -> &[String] {
        &self.cell_ids
    }

    /// Column names.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Number of cells.
    pub fn n_cells(&self) -> usize {
        self.cell_ids.len()
    }

    /// Number of annotation columns.
    pub fn n_columns(&self) -> usize {
        self.column_names.len()
    }

    /// All values for a column, in row order.
    pub fn column(&self, column: &str) -> Result<&[Variable]> {
        self.columns
            .get(column)
            .map(Vec::as_slice)
            .ok_or_else(|| SubsetError::missing_annotation(column))
    }

    /// Get the type of a column.
    pub fn column_type(&self, column: &str) -> Option<VariableType> {
        self.column_types.get(column).copied()
    }

    /// Check if a column exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Sorted distinct labels of a categorical column.
    pub fn levels(&self, column: &str) -> Result<Vec<String>> {
        let levels: BTreeSet<&str> = self
            .column(column)?
            .iter()
            .filter_map(Variable::as_categorical)
            .collect();
        Ok(levels.into_iter().map(String::from).collect())
    }

    /// Subset to the given rows (by index), keeping every column.
    pub fn subset_cells(&self, indices: &[usize]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_cells()) {
            return Err(SubsetError::InvalidParameter(format!(
                "Cell index {} out of bounds",
                bad
            )));
        }

        let cell_ids = indices.iter().map(|&i| self.cell_ids[i].clone()).collect();
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| {
                let picked = indices.iter().map(|&i| values[i].clone()).collect();
                (name.clone(), picked)
            })
            .collect();

        Ok(Self {
            cell_ids,
            column_names: self.column_names.clone(),
            columns,
            column_types: self.column_types.clone(),
        })
    }
}
