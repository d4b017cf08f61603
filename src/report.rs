//! Writing selected subsets and their summary to disk.

use crate::data::AnnotatedMatrix;
use crate::error::Result;
use crate::select::{overlap, SubsetResult, SubsetSummary};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Number of cells shared by two subsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapSummary {
    pub a: String,
    pub b: String,
    pub n_shared: usize,
}

/// Everything written to `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionReport {
    pub name: String,
    pub n_cells: usize,
    pub n_genes: usize,
    pub subsets: Vec<SubsetSummary>,
    /// One entry per unordered pair of subsets.
    pub overlaps: Vec<OverlapSummary>,
}

impl SelectionReport {
    pub fn new(name: &str, source: &AnnotatedMatrix, results: &[SubsetResult]) -> Self {
        let mut overlaps = Vec::new();
        for (i, a) in results.iter().enumerate() {
            for b in &results[i + 1..] {
                overlaps.push(OverlapSummary {
                    a: a.rule.clone(),
                    b: b.rule.clone(),
                    n_shared: overlap(a, b).len(),
                });
            }
        }

        Self {
            name: name.to_string(),
            n_cells: source.n_cells(),
            n_genes: source.n_genes(),
            subsets: results.iter().map(SubsetResult::summary).collect(),
            overlaps,
        }
    }

    /// Shared-cell count for a pair of rules, in either order.
    pub fn shared(&self, a: &str, b: &str) -> Option<usize> {
        self.overlaps
            .iter()
            .find(|o| (o.a == a && o.b == b) || (o.a == b && o.b == a))
            .map(|o| o.n_shared)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl std::fmt::Display for SelectionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Selection '{}'", self.name)?;
        writeln!(f, "  Input: {} cells x {} genes", self.n_cells, self.n_genes)?;
        for s in &self.subsets {
            writeln!(
                f,
                "  {:<20} {:>8} cells ({:.1}%)",
                s.rule,
                s.n_after,
                s.retention_rate * 100.0
            )?;
        }
        for o in self.overlaps.iter().filter(|o| o.n_shared > 0) {
            writeln!(f, "  {} & {}: {} shared cells", o.a, o.b, o.n_shared)?;
        }
        Ok(())
    }
}

/// Paths of the two files written for one subset.
pub fn subset_paths(dir: &Path, rule: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{}.matrix.tsv", rule)),
        dir.join(format!("{}.obs.tsv", rule)),
    )
}

/// Write each subset as `<rule>.matrix.tsv` + `<rule>.obs.tsv`, plus `summary.json`.
pub fn write_subsets(
    dir: &Path,
    name: &str,
    source: &AnnotatedMatrix,
    results: &[SubsetResult],
) -> Result<SelectionReport> {
    std::fs::create_dir_all(dir)?;

    for result in results {
        let (matrix_path, obs_path) = subset_paths(dir, &result.rule);
        result.data.to_tsv(&matrix_path, &obs_path)?;
        info!(
            "Wrote {} cells for '{}' to {:?}",
            result.n_after, result.rule, matrix_path
        );
    }

    let report = SelectionReport::new(name, source, results);
    std::fs::write(dir.join("summary.json"), report.to_json()?)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CellAnnotations, ExpressionMatrix};
    use crate::rules::builtin_rules;
    use crate::select::select_all;
    use tempfile::TempDir;

    fn create_test_data() -> AnnotatedMatrix {
        let genes: Vec<String> = ["Pomc", "Agrp", "Npy", "Rbfox3", "Lxn"]
            .iter()
            .map(|g| g.to_string())
            .collect();
        let rows = vec![
            vec![60.0, 20.0, 0.0, 20.0, 0.0],
            vec![0.0, 0.0, 30.0, 8.0, 0.0],
            vec![0.0, 0.0, 0.0, 2.0, 3.0],
            vec![0.0, 0.0, 0.0, 2.0, 0.0],
        ];
        let cell_ids: Vec<String> = (0..4).map(|i| format!("c{}", i)).collect();
        let matrix = ExpressionMatrix::from_rows(&rows, cell_ids.clone(), genes).unwrap();
        let obs = CellAnnotations::new(cell_ids)
            .with_categorical("celltype", &["Neurons", "Neurons", "Astrocytes", "Astrocytes"])
            .unwrap();
        AnnotatedMatrix::new(matrix, obs).unwrap()
    }

    #[test]
    fn test_report_counts_and_overlaps() {
        let adata = create_test_data();
        let results = select_all(&adata, &builtin_rules("celltype")).unwrap();
        let report = SelectionReport::new("test", &adata, &results);

        let sizes: Vec<usize> = report.subsets.iter().map(|s| s.n_after).collect();
        assert_eq!(sizes, vec![1, 2, 1, 1]);
        assert_eq!(report.overlaps.len(), 6);
        assert_eq!(report.shared("pomc_neurons", "npy_neurons"), Some(1));
        assert_eq!(report.shared("lxn_neg_astro", "lxn_pos_astro"), Some(0));
        assert_eq!(report.shared("pomc_neurons", "missing"), None);
    }

    #[test]
    fn test_empty_subset_reloads() {
        let matrix = ExpressionMatrix::from_rows(
            &[vec![1.0, 20.0]],
            vec!["c0".to_string()],
            vec!["Pomc".to_string(), "Rbfox3".to_string()],
        )
        .unwrap();
        let obs = CellAnnotations::new(vec!["c0".to_string()])
            .with_categorical("celltype", &["Neurons"])
            .unwrap();
        let adata = AnnotatedMatrix::new(matrix, obs).unwrap();
        let results = select_all(&adata, &[crate::rules::pomc_neurons("celltype")]).unwrap();
        assert_eq!(results[0].n_after, 0);

        let dir = TempDir::new().unwrap();
        write_subsets(dir.path(), "test", &adata, &results).unwrap();

        let (matrix_path, obs_path) = subset_paths(dir.path(), "pomc_neurons");
        let loaded = AnnotatedMatrix::from_tsv(&matrix_path, &obs_path).unwrap();
        assert_eq!(loaded.n_cells(), 0);
        assert_eq!(loaded.n_genes(), 2);
        assert!(loaded.annotation("celltype").unwrap().is_empty());
    }

    #[test]
    fn test_write_subsets() {
        let adata = create_test_data();
        let results = select_all(&adata, &builtin_rules("celltype")).unwrap();
        let dir = TempDir::new().unwrap();

        let report = write_subsets(dir.path(), "test", &adata, &results).unwrap();
        assert_eq!(report.n_cells, 4);

        let (matrix_path, obs_path) = subset_paths(dir.path(), "npy_neurons");
        let loaded = AnnotatedMatrix::from_tsv(&matrix_path, &obs_path).unwrap();
        assert_eq!(loaded.cell_ids(), &["c0", "c1"]);
        assert_eq!(loaded.n_genes(), 5);

        let json = std::fs::read_to_string(dir.path().join("summary.json")).unwrap();
        let parsed: SelectionReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
