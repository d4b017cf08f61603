//! Expression matrix with sparse storage for single-cell data.

use crate::error::{Result, SubsetError};
use rayon::prelude::*;
use sprs::{CsMat, TriMat};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// A sparse expression matrix storing gene expression across cells.
///
/// Rows represent cells (observations), columns represent genes (features).
/// Uses CSR (Compressed Sparse Row) format so that row subsetting stays cheap.
#[derive(Debug, Clone)]
pub struct ExpressionMatrix {
    /// Sparse matrix in CSR format (cells × genes)
    data: CsMat<f64>,
    /// Cell identifiers (row names)
    cell_ids: Vec<String>,
    /// Gene identifiers (column names)
    gene_ids: Vec<String>,
    /// Gene name -> column position
    gene_index: HashMap<String, usize>,
}

impl ExpressionMatrix {
    /// Create a new ExpressionMatrix from a sparse matrix and identifiers.
    pub fn new(data: CsMat<f64>, cell_ids: Vec<String>, gene_ids: Vec<String>) -> Result<Self> {
        let (nrows, ncols) = data.shape();
        if nrows != cell_ids.len() {
            return Err(SubsetError::ShapeMismatch {
                expected: nrows,
                actual: cell_ids.len(),
            });
        }
        if ncols != gene_ids.len() {
            return Err(SubsetError::ShapeMismatch {
                expected: ncols,
                actual: gene_ids.len(),
            });
        }

        let mut gene_index = HashMap::with_capacity(gene_ids.len());
        for (idx, gene) in gene_ids.iter().enumerate() {
            if gene_index.insert(gene.clone(), idx).is_some() {
                return Err(SubsetError::InvalidParameter(format!(
                    "Duplicate gene '{}' in expression matrix",
                    gene
                )));
            }
        }

        // Row selection hands out outer views, so keep the storage row-major.
        let data = if data.is_csr() { data } else { data.to_csr() };

        Ok(Self {
            data,
            cell_ids,
            gene_ids,
            gene_index,
        })
    }

    /// Build from dense rows (one `Vec` per cell).
    pub fn from_rows(rows: &[Vec<f64>], cell_ids: Vec<String>, gene_ids: Vec<String>) -> Result<Self> {
        let n_genes = gene_ids.len();
        let mut tri_mat = TriMat::new((rows.len(), n_genes));
        for (row, values) in rows.iter().enumerate() {
            if values.len() != n_genes {
                return Err(SubsetError::ShapeMismatch {
                    expected: n_genes,
                    actual: values.len(),
                });
            }
            for (col, &val) in values.iter().enumerate() {
                if val != 0.0 {
                    tri_mat.add_triplet(row, col, val);
                }
            }
        }
        Self::new(tri_mat.to_csr(), cell_ids, gene_ids)
    }

    /// Load an expression matrix from a TSV file.
    ///
    /// Expected format:
    /// - First row: header with gene IDs (first column is the cell ID header)
    /// - Subsequent rows: cell ID followed by exactly one value per gene
    pub fn from_tsv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = lines
            .next()
            .ok_or_else(|| SubsetError::EmptyData("Empty TSV file".to_string()))??;
        let header: Vec<&str> = header_line.split('\t').collect();
        if header.len() < 2 {
            return Err(SubsetError::EmptyData(
                "TSV must have at least one gene".to_string(),
            ));
        }
        let gene_ids: Vec<String> = header[1..].iter().map(|s| s.trim().to_string()).collect();
        let n_genes = gene_ids.len();

        let mut triplets: Vec<(usize, usize, f64)> = Vec::new();
        let mut cell_ids: Vec<String> = Vec::new();

        for line_result in lines {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }
            let row_idx = cell_ids.len();
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() - 1 != n_genes {
                return Err(SubsetError::ShapeMismatch {
                    expected: n_genes,
                    actual: fields.len() - 1,
                });
            }
            cell_ids.push(fields[0].trim().to_string());

            for (col_idx, value_str) in fields[1..].iter().enumerate() {
                let value: f64 = value_str.trim().parse().map_err(|_| SubsetError::InvalidValue {
                    value: value_str.to_string(),
                    row: row_idx,
                    col: col_idx,
                })?;
                if value != 0.0 {
                    triplets.push((row_idx, col_idx, value));
                }
            }
        }

        // Header-only files load as zero cells.
        let n_cells = cell_ids.len();
        let mut tri_mat = TriMat::new((n_cells, n_genes));
        for (row, col, val) in triplets {
            tri_mat.add_triplet(row, col, val);
        }

        Self::new(tri_mat.to_csr(), cell_ids, gene_ids)
    }

    /// Write the expression matrix to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        write!(writer, "cell_id")?;
        for gene_id in &self.gene_ids {
            write!(writer, "\t{}", gene_id)?;
        }
        writeln!(writer)?;

        for (row_idx, cell_id) in self.cell_ids.iter().enumerate() {
            write!(writer, "{}", cell_id)?;
            for value in self.row_dense(row_idx) {
                write!(writer, "\t{}", value)?;
            }
            writeln!(writer)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Get the value at (row, col), returning 0 for missing entries.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data.get(row, col).copied().unwrap_or(0.0)
    }

    /// Number of cells (rows).
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.data.rows()
    }

    /// Number of genes (columns).
    #[inline]
    pub fn n_genes(&self) -> usize {
        self.data.cols()
    }

    /// Total number of non-zero entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.data.nnz()
    }

    /// Cell identifiers.
    #[inline]
    pub fn cell_ids(&self) -> &[String] {
        &self.cell_ids
    }

    /// Gene identifiers.
    #[inline]
    pub fn gene_ids(&self) -> &[String] {
        &self.gene_ids
    }

    /// Column position of a gene, if present.
    pub fn gene_position(&self, gene: &str) -> Option<usize> {
        self.gene_index.get(gene).copied()
    }

    /// Check if a gene exists.
    pub fn has_gene(&self, gene: &str) -> bool {
        self.gene_index.contains_key(gene)
    }

    /// Dense values of one cell (row).
    pub fn row_dense(&self, row: usize) -> Vec<f64> {
        let mut dense = vec![0.0; self.n_genes()];
        if let Some(row_vec) = self.data.outer_view(row) {
            for (col, &val) in row_vec.iter() {
                dense[col] = val;
            }
        }
        dense
    }

    /// Per-cell expression of a named gene, in row order.
    pub fn feature(&self, gene: &str) -> Result<Vec<f64>> {
        let col = self
            .gene_position(gene)
            .ok_or_else(|| SubsetError::missing_feature(gene))?;
        Ok((0..self.n_cells())
            .into_par_iter()
            .map(|row| self.get(row, col))
            .collect())
    }

    /// Subset the matrix to include only specified cells (by index), keeping every gene.
    pub fn subset_cells(&self, indices: &[usize]) -> Result<Self> {
        let n_cells = indices.len();
        let n_genes = self.n_genes();

        let mut tri_mat = TriMat::new((n_cells, n_genes));
        let mut new_cell_ids = Vec::with_capacity(n_cells);

        for (new_row, &old_row) in indices.iter().enumerate() {
            if old_row >= self.n_cells() {
                return Err(SubsetError::InvalidParameter(format!(
                    "Cell index {} out of bounds",
                    old_row
                )));
            }
            new_cell_ids.push(self.cell_ids[old_row].clone());

            if let Some(row_vec) = self.data.outer_view(old_row) {
                for (col, &val) in row_vec.iter() {
                    tri_mat.add_triplet(new_row, col, val);
                }
            }
        }

        Ok(Self {
            data: tri_mat.to_csr(),
            cell_ids: new_cell_ids,
            gene_ids: self.gene_ids.clone(),
            gene_index: self.gene_index.clone(),
        })
    }
}
