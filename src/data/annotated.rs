//! Expression matrix paired with its per-cell annotations.

use super::{CellAnnotations, ExpressionMatrix, Variable};
use crate::error::{Result, SubsetError};
use crate::mask::Mask;
use std::path::Path;

/// An expression matrix and its annotation table, aligned row by row.
///
/// Construction guarantees that both halves have the same cells in the same
/// order, so a mask computed from either side addresses the same rows.
#[derive(Debug, Clone)]
pub struct AnnotatedMatrix {
    matrix: ExpressionMatrix,
    obs: CellAnnotations,
}

impl AnnotatedMatrix {
    /// Pair a matrix with its annotations.
    pub fn new(matrix: ExpressionMatrix, obs: CellAnnotations) -> Result<Self> {
        if matrix.n_cells() != obs.n_cells() {
            return Err(SubsetError::ShapeMismatch {
                expected: matrix.n_cells(),
                actual: obs.n_cells(),
            });
        }
        if let Some((row, (m, o))) = matrix
            .cell_ids()
            .iter()
            .zip(obs.cell_ids())
            .enumerate()
            .find(|(_, (m, o))| m != o)
        {
            return Err(SubsetError::CellMismatch(format!(
                "row {} is '{}' in the matrix but '{}' in the annotations",
                row, m, o
            )));
        }
        Ok(Self { matrix, obs })
    }

    /// Load both halves from TSV files.
    pub fn from_tsv<P: AsRef<Path>, Q: AsRef<Path>>(matrix_path: P, obs_path: Q) -> Result<Self> {
        let matrix = ExpressionMatrix::from_tsv(matrix_path)?;
        let obs = CellAnnotations::from_tsv(obs_path)?;
        Self::new(matrix, obs)
    }

    /// Write both halves to TSV files.
    pub fn to_tsv<P: AsRef<Path>, Q: AsRef<Path>>(&self, matrix_path: P, obs_path: Q) -> Result<()> {
        self.matrix.to_tsv(matrix_path)?;
        self.obs.to_tsv(obs_path)
    }

    /// Number of cells (rows).
    pub fn n_cells(&self) -> usize {
        self.matrix.n_cells()
    }

    /// Number of genes (columns).
    pub fn n_genes(&self) -> usize {
        self.matrix.n_genes()
    }

    /// Cell identifiers.
    pub fn cell_ids(&self) -> &[String] {
        self.matrix.cell_ids()
    }

    /// The expression half.
    pub fn matrix(&self) -> &ExpressionMatrix {
        &self.matrix
    }

    /// The annotation half.
    pub fn obs(&self) -> &CellAnnotations {
        &self.obs
    }

    /// Per-cell expression of a gene.
    pub fn feature(&self, gene: &str) -> Result<Vec<f64>> {
        self.matrix.feature(gene)
    }

    /// Per-cell values of an annotation column.
    pub fn annotation(&self, column: &str) -> Result<&[Variable]> {
        self.obs.column(column)
    }

    /// Keep the rows where `mask` is true; every gene and annotation column is retained.
    pub fn select(&self, mask: &Mask) -> Result<Self> {
        mask.check_len(self.n_cells())?;
        let indices = mask.indices();
        self.subset_cells(&indices)
    }

    /// Keep the given rows, in the given order.
    pub fn subset_cells(&self, indices: &[usize]) -> Result<Self> {
        Ok(Self {
            matrix: self.matrix.subset_cells(indices)?,
            obs: self.obs.subset_cells(indices)?,
        })
    }
}
