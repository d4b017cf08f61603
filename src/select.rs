//! Row-subset selection: apply rules to an annotated matrix.

use crate::data::AnnotatedMatrix;
use crate::error::{Result, SubsetError};
use crate::rules::SubsetRule;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Cells selected by one rule.
#[derive(Debug, Clone)]
pub struct SubsetResult {
    /// Name of the rule that produced this subset.
    pub rule: String,
    /// Source row positions of the selected cells, ascending.
    pub indices: Vec<usize>,
    /// The selected cells with every gene and annotation column.
    pub data: AnnotatedMatrix,
    /// Number of cells before selection.
    pub n_before: usize,
    /// Number of cells selected.
    pub n_after: usize,
}

impl SubsetResult {
    /// Proportion of cells retained.
    pub fn retention_rate(&self) -> f64 {
        if self.n_before == 0 {
            0.0
        } else {
            self.n_after as f64 / self.n_before as f64
        }
    }

    /// Serializable counts for reports.
    pub fn summary(&self) -> SubsetSummary {
        SubsetSummary {
            rule: self.rule.clone(),
            n_before: self.n_before,
            n_after: self.n_after,
            retention_rate: self.retention_rate(),
        }
    }
}

impl std::fmt::Display for SubsetResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Subset '{}'", self.rule)?;
        writeln!(f, "  Before:    {} cells", self.n_before)?;
        writeln!(f, "  Selected:  {} cells", self.n_after)?;
        writeln!(f, "  Retained:  {:.1}%", self.retention_rate() * 100.0)?;
        Ok(())
    }
}

/// Per-rule counts, as written to `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetSummary {
    pub rule: String,
    pub n_before: usize,
    pub n_after: usize,
    pub retention_rate: f64,
}

/// Apply one rule to `adata`.
///
/// The source is only read; the result holds a copy of the selected rows.
pub fn select(adata: &AnnotatedMatrix, rule: &SubsetRule) -> Result<SubsetResult> {
    debug!("Evaluating rule '{}': {}", rule.name, rule.predicate);

    let wrap = |e: SubsetError| SubsetError::Rule {
        rule: rule.name.clone(),
        source: Box::new(e),
    };

    let mask = rule.predicate.evaluate(adata).map_err(wrap)?;
    let indices = mask.indices();
    let data = adata.subset_cells(&indices).map_err(wrap)?;

    info!(
        "Rule '{}' selected {} of {} cells",
        rule.name,
        indices.len(),
        adata.n_cells()
    );

    Ok(SubsetResult {
        rule: rule.name.clone(),
        n_before: adata.n_cells(),
        n_after: indices.len(),
        indices,
        data,
    })
}

/// Apply every rule to the same source, in order.
///
/// Stops at the first failing rule; the error names it.
pub fn select_all(adata: &AnnotatedMatrix, rules: &[SubsetRule]) -> Result<Vec<SubsetResult>> {
    if rules.is_empty() {
        return Err(SubsetError::InvalidParameter(
            "At least one rule is required".to_string(),
        ));
    }
    rules.iter().map(|rule| select(adata, rule)).collect()
}

/// Cell IDs present in both subsets, in the order they appear in `a`.
pub fn overlap(a: &SubsetResult, b: &SubsetResult) -> Vec<String> {
    let in_b: HashSet<&str> = b.data.cell_ids().iter().map(String::as_str).collect();
    a.data
        .cell_ids()
        .iter()
        .filter(|id| in_b.contains(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CellAnnotations, ExpressionMatrix};
    use crate::error::ColumnKind;
    use crate::predicate::Predicate;
    use crate::rules::{lxn_neg_astro, lxn_pos_astro, pomc_neurons};

    fn build(genes: &[&str], rows: Vec<Vec<f64>>, celltypes: &[&str]) -> AnnotatedMatrix {
        let cell_ids: Vec<String> = (0..rows.len()).map(|i| format!("cell_{}", i)).collect();
        let genes = genes.iter().map(|g| g.to_string()).collect();
        let matrix = ExpressionMatrix::from_rows(&rows, cell_ids.clone(), genes).unwrap();
        let obs = CellAnnotations::new(cell_ids)
            .with_categorical("celltype", celltypes)
            .unwrap();
        AnnotatedMatrix::new(matrix, obs).unwrap()
    }

    #[test]
    fn test_pomc_example() {
        let adata = build(
            &["Pomc", "Rbfox3"],
            vec![vec![60.0, 20.0], vec![10.0, 20.0]],
            &["Neurons", "Neurons"],
        );
        let result = select(&adata, &pomc_neurons("celltype")).unwrap();

        assert_eq!(result.indices, vec![0]);
        assert_eq!(result.data.cell_ids(), &["cell_0"]);
        assert_eq!(result.n_before, 2);
        assert_eq!(result.n_after, 1);
        assert_eq!(result.data.n_genes(), 2);
    }

    #[test]
    fn test_lxn_examples_are_disjoint() {
        let adata = build(
            &["Lxn", "Rbfox3"],
            vec![vec![0.0, 5.0], vec![2.0, 5.0]],
            &["Astrocytes", "Astrocytes"],
        );
        let pos = select(&adata, &lxn_pos_astro("celltype")).unwrap();
        let neg = select(&adata, &lxn_neg_astro("celltype")).unwrap();

        assert_eq!(pos.indices, vec![1]);
        assert_eq!(neg.indices, vec![0]);
        assert!(overlap(&pos, &neg).is_empty());
    }

    #[test]
    fn test_missing_gene_names_rule() {
        let adata = build(&["Rbfox3"], vec![vec![20.0]], &["Neurons"]);
        let err = select(&adata, &pomc_neurons("celltype")).unwrap_err();

        match &err {
            SubsetError::Rule { rule, .. } => assert_eq!(rule, "pomc_neurons"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            err.root(),
            SubsetError::MissingColumn { kind: ColumnKind::Feature, name } if name == "Pomc"
        ));
    }

    #[test]
    fn test_select_all_stops_at_first_failure() {
        let adata = build(&["Pomc", "Rbfox3"], vec![vec![60.0, 20.0]], &["Neurons"]);
        let rules = vec![
            pomc_neurons("celltype"),
            SubsetRule::new("broken", Predicate::gt("Npy", 1.0)),
        ];
        let err = select_all(&adata, &rules).unwrap_err();
        assert!(matches!(err, SubsetError::Rule { ref rule, .. } if rule == "broken"));
        assert!(select_all(&adata, &[]).is_err());
    }

    #[test]
    fn test_overlap_preserves_order() {
        let adata = build(
            &["Pomc"],
            vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]],
            &["Neurons"; 4],
        );
        let a = select(&adata, &SubsetRule::new("a", Predicate::gt("Pomc", 1.5))).unwrap();
        let b = select(&adata, &SubsetRule::new("b", Predicate::lt("Pomc", 3.5))).unwrap();
        assert_eq!(overlap(&a, &b), vec!["cell_1", "cell_2"]);
    }

    #[test]
    fn test_summary_and_display() {
        let adata = build(
            &["Pomc", "Rbfox3"],
            vec![vec![60.0, 20.0], vec![10.0, 20.0]],
            &["Neurons", "Neurons"],
        );
        let result = select(&adata, &pomc_neurons("celltype")).unwrap();
        let summary = result.summary();
        assert_eq!(summary.n_after, 1);
        assert!((summary.retention_rate - 0.5).abs() < 1e-12);
        assert!(result.to_string().contains("Selected:  1 cells"));
    }
}
