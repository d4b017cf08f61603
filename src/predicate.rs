//! Row predicates over an annotated matrix.
//!
//! A [`Predicate`] is a small boolean expression tree whose leaves compare a
//! gene's expression against a literal threshold or test an annotation label
//! for membership in a set. Evaluating it yields one [`Mask`] covering every
//! cell of the matrix.

use crate::data::{AnnotatedMatrix, Variable};
use crate::error::{Result, SubsetError};
use crate::mask::Mask;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Comparison operator applied as `value <op> threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

impl Comparison {
    /// Apply the comparison. NaN never satisfies anything but `Ne`.
    #[inline]
    pub fn apply(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Gt => value > threshold,
            Comparison::Ge => value >= threshold,
            Comparison::Lt => value < threshold,
            Comparison::Le => value <= threshold,
            Comparison::Eq => value == threshold,
            Comparison::Ne => value != threshold,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
        }
    }
}

/// Boolean expression evaluated per cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// `expression[gene] <op> threshold`
    Feature {
        gene: String,
        op: Comparison,
        threshold: f64,
    },
    /// `annotation[column] ∈ values`. Numeric annotations match numerically
    /// (`"3"` matches `3.0`); missing values never match.
    Membership { column: String, values: Vec<String> },
    /// All children hold. Empty is always true.
    And(Vec<Predicate>),
    /// Any child holds. Empty is always false.
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    /// Feature comparison leaf.
    pub fn feature(gene: &str, op: Comparison, threshold: f64) -> Self {
        Predicate::Feature {
            gene: gene.to_string(),
            op,
            threshold,
        }
    }

    pub fn gt(gene: &str, threshold: f64) -> Self {
        Self::feature(gene, Comparison::Gt, threshold)
    }

    pub fn lt(gene: &str, threshold: f64) -> Self {
        Self::feature(gene, Comparison::Lt, threshold)
    }

    pub fn equals(gene: &str, threshold: f64) -> Self {
        Self::feature(gene, Comparison::Eq, threshold)
    }

    /// Annotation membership leaf.
    pub fn is_in<S: AsRef<str>>(column: &str, values: &[S]) -> Self {
        Predicate::Membership {
            column: column.to_string(),
            values: values.iter().map(|v| v.as_ref().to_string()).collect(),
        }
    }

    pub fn and(children: Vec<Predicate>) -> Self {
        Predicate::And(children)
    }

    pub fn or(children: Vec<Predicate>) -> Self {
        Predicate::Or(children)
    }

    pub fn negate(inner: Predicate) -> Self {
        Predicate::Not(Box::new(inner))
    }

    /// Evaluate over every cell, producing a mask of `adata.n_cells()` rows.
    ///
    /// Fails with `MissingColumn` if a gene or annotation column is absent and
    /// with `ShapeMismatch` if any intermediate vector disagrees with the row count.
    pub fn evaluate(&self, adata: &AnnotatedMatrix) -> Result<Mask> {
        let n_cells = adata.n_cells();
        let mask = match self {
            Predicate::Feature {
                gene,
                op,
                threshold,
            } => {
                let values = adata.feature(gene)?;
                let bits: Vec<bool> = values
                    .par_iter()
                    .map(|&v| op.apply(v, *threshold))
                    .collect();
                Mask::from(bits)
            }
            Predicate::Membership { column, values } => {
                let wanted: BTreeSet<&str> = values.iter().map(String::as_str).collect();
                adata
                    .annotation(column)?
                    .iter()
                    .map(|v| label_in(v, &wanted))
                    .collect()
            }
            Predicate::And(children) => {
                let mut acc = Mask::all(n_cells);
                for child in children {
                    acc = acc.and(&child.evaluate(adata)?)?;
                }
                acc
            }
            Predicate::Or(children) => {
                let mut acc = Mask::none(n_cells);
                for child in children {
                    acc = acc.or(&child.evaluate(adata)?)?;
                }
                acc
            }
            Predicate::Not(inner) => inner.evaluate(adata)?.not(),
        };
        mask.check_len(n_cells)?;
        Ok(mask)
    }

    /// Evaluate for a single row without building masks.
    pub fn matches_row(&self, adata: &AnnotatedMatrix, row: usize) -> Result<bool> {
        if row >= adata.n_cells() {
            return Err(SubsetError::InvalidParameter(format!(
                "Cell index {} out of bounds",
                row
            )));
        }
        match self {
            Predicate::Feature {
                gene,
                op,
                threshold,
            } => {
                let col = adata
                    .matrix()
                    .gene_position(gene)
                    .ok_or_else(|| SubsetError::missing_feature(gene))?;
                Ok(op.apply(adata.matrix().get(row, col), *threshold))
            }
            Predicate::Membership { column, values } => {
                let wanted: BTreeSet<&str> = values.iter().map(String::as_str).collect();
                Ok(label_in(&adata.annotation(column)?[row], &wanted))
            }
            Predicate::And(children) => {
                for child in children {
                    if !child.matches_row(adata, row)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Predicate::Or(children) => {
                for child in children {
                    if child.matches_row(adata, row)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::Not(inner) => Ok(!inner.matches_row(adata, row)?),
        }
    }

    /// Genes referenced anywhere in the tree, sorted and deduplicated.
    pub fn referenced_features(&self) -> Vec<String> {
        let mut out = BTreeSet::new();
        self.visit(&mut |p| {
            if let Predicate::Feature { gene, .. } = p {
                out.insert(gene.clone());
            }
        });
        out.into_iter().collect()
    }

    /// Annotation columns referenced anywhere in the tree, sorted and deduplicated.
    pub fn referenced_columns(&self) -> Vec<String> {
        let mut out = BTreeSet::new();
        self.visit(&mut |p| {
            if let Predicate::Membership { column, .. } = p {
                out.insert(column.clone());
            }
        });
        out.into_iter().collect()
    }

    /// Point every membership leaf on column `from` at column `to`.
    pub fn rename_column(&mut self, from: &str, to: &str) {
        match self {
            Predicate::Membership { column, .. } if *column == from => *column = to.to_string(),
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    child.rename_column(from, to);
                }
            }
            Predicate::Not(inner) => inner.rename_column(from, to),
            Predicate::Feature { .. } | Predicate::Membership { .. } => {}
        }
    }

    fn visit(&self, f: &mut impl FnMut(&Predicate)) {
        f(self);
        match self {
            Predicate::And(children) | Predicate::Or(children) => {
                for child in children {
                    child.visit(f);
                }
            }
            Predicate::Not(inner) => inner.visit(f),
            Predicate::Feature { .. } | Predicate::Membership { .. } => {}
        }
    }
}

fn label_in(value: &Variable, wanted: &BTreeSet<&str>) -> bool {
    match value {
        Variable::Categorical(label) => wanted.contains(label.as_str()),
        // All-numeric label columns (cluster ids) load as continuous.
        Variable::Continuous(v) => wanted
            .iter()
            .any(|w| w.trim().parse::<f64>().is_ok_and(|x| x == *v)),
        Variable::Missing => false,
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Feature {
                gene,
                op,
                threshold,
            } => write!(f, "{} {} {}", gene, op.symbol(), threshold),
            Predicate::Membership { column, values } => {
                write!(f, "{} in {{{}}}", column, values.join(", "))
            }
            Predicate::And(children) | Predicate::Or(children) => {
                let (sep, empty) = match self {
                    Predicate::And(_) => (" & ", "true"),
                    _ => (" | ", "false"),
                };
                if children.is_empty() {
                    return write!(f, "{}", empty);
                }
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", sep)?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
            Predicate::Not(inner) => write!(f, "!{}", inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CellAnnotations, ExpressionMatrix};

    fn create_test_data() -> AnnotatedMatrix {
        let genes = vec!["Agrp".to_string(), "Npy".to_string(), "Rbfox3".to_string()];
        let rows = vec![
            vec![20.0, 0.0, 10.0],
            vec![0.0, 25.0, 10.0],
            vec![0.0, 0.0, 10.0],
            vec![20.0, 25.0, 2.0],
        ];
        let cell_ids: Vec<String> = (0..4).map(|i| format!("c{}", i)).collect();
        let matrix = ExpressionMatrix::from_rows(&rows, cell_ids.clone(), genes).unwrap();
        let obs = CellAnnotations::new(cell_ids)
            .with_categorical("celltype", &["Neurons", "Neurons", "Neurons", "NA"])
            .unwrap();
        AnnotatedMatrix::new(matrix, obs).unwrap()
    }

    #[test]
    fn test_comparisons() {
        assert!(Comparison::Gt.apply(51.0, 50.0));
        assert!(!Comparison::Gt.apply(50.0, 50.0));
        assert!(Comparison::Ge.apply(50.0, 50.0));
        assert!(Comparison::Lt.apply(9.9, 10.0));
        assert!(Comparison::Eq.apply(0.0, 0.0));
        assert!(!Comparison::Eq.apply(f64::NAN, 0.0));
        assert!(Comparison::Ne.apply(f64::NAN, 0.0));
    }

    #[test]
    fn test_feature_leaf() {
        let adata = create_test_data();
        let mask = Predicate::gt("Agrp", 15.0).evaluate(&adata).unwrap();
        assert_eq!(mask.as_slice(), &[true, false, false, true]);
    }

    #[test]
    fn test_or_then_and() {
        let adata = create_test_data();
        let pred = Predicate::and(vec![
            Predicate::or(vec![Predicate::gt("Agrp", 15.0), Predicate::gt("Npy", 20.0)]),
            Predicate::gt("Rbfox3", 5.0),
            Predicate::is_in("celltype", &["Neurons"]),
        ]);
        let mask = pred.evaluate(&adata).unwrap();
        assert_eq!(mask.as_slice(), &[true, true, false, false]);
    }

    #[test]
    fn test_missing_label_never_matches() {
        let adata = create_test_data();
        let mask = Predicate::is_in("celltype", &["Neurons", "NA"])
            .evaluate(&adata)
            .unwrap();
        assert_eq!(mask.as_slice(), &[true, true, true, false]);
    }

    #[test]
    fn test_membership_on_numeric_labels() {
        let matrix = ExpressionMatrix::from_rows(
            &[vec![1.0], vec![1.0], vec![1.0]],
            vec!["c0".into(), "c1".into(), "c2".into()],
            vec!["Npy".into()],
        )
        .unwrap();
        let obs = CellAnnotations::new(vec!["c0".into(), "c1".into(), "c2".into()])
            .with_continuous("cluster", &[3.0, 4.0, 3.0])
            .unwrap();
        let adata = AnnotatedMatrix::new(matrix, obs).unwrap();

        let pred = Predicate::is_in("cluster", &["3"]);
        assert_eq!(pred.evaluate(&adata).unwrap().as_slice(), &[true, false, true]);
        assert!(pred.matches_row(&adata, 2).unwrap());
        assert!(!Predicate::is_in("cluster", &["Neurons"])
            .matches_row(&adata, 0)
            .unwrap());
    }

    #[test]
    fn test_rename_column() {
        let mut pred = Predicate::and(vec![
            Predicate::gt("Npy", 20.0),
            Predicate::negate(Predicate::is_in("celltype", &["Neurons"])),
            Predicate::is_in("batch", &["A"]),
        ]);
        pred.rename_column("celltype", "ora_celltype");
        assert_eq!(pred.referenced_columns(), vec!["batch", "ora_celltype"]);
    }

    #[test]
    fn test_empty_and_or() {
        let adata = create_test_data();
        assert_eq!(Predicate::and(vec![]).evaluate(&adata).unwrap().count(), 4);
        assert_eq!(Predicate::or(vec![]).evaluate(&adata).unwrap().count(), 0);
    }

    #[test]
    fn test_not() {
        let adata = create_test_data();
        let mask = Predicate::negate(Predicate::gt("Agrp", 15.0))
            .evaluate(&adata)
            .unwrap();
        assert_eq!(mask.as_slice(), &[false, true, true, false]);
    }

    #[test]
    fn test_missing_feature_and_column() {
        let adata = create_test_data();

        let err = Predicate::gt("Pomc", 50.0).evaluate(&adata).unwrap_err();
        assert!(matches!(
            err,
            SubsetError::MissingColumn { kind: crate::error::ColumnKind::Feature, .. }
        ));

        let err = Predicate::is_in("ora_celltype", &["Neurons"])
            .evaluate(&adata)
            .unwrap_err();
        assert!(matches!(
            err,
            SubsetError::MissingColumn { kind: crate::error::ColumnKind::Annotation, .. }
        ));
    }

    #[test]
    fn test_matches_row_agrees_with_mask() {
        let adata = create_test_data();
        let pred = Predicate::and(vec![
            Predicate::or(vec![Predicate::gt("Agrp", 15.0), Predicate::gt("Npy", 20.0)]),
            Predicate::is_in("celltype", &["Neurons"]),
        ]);
        let mask = pred.evaluate(&adata).unwrap();
        for row in 0..adata.n_cells() {
            assert_eq!(pred.matches_row(&adata, row).unwrap(), mask.get(row).unwrap());
        }
        assert!(pred.matches_row(&adata, 4).is_err());
    }

    #[test]
    fn test_referenced_names() {
        let pred = Predicate::and(vec![
            Predicate::or(vec![Predicate::gt("Npy", 20.0), Predicate::gt("Agrp", 15.0)]),
            Predicate::gt("Npy", 1.0),
            Predicate::is_in("celltype", &["Neurons"]),
        ]);
        assert_eq!(pred.referenced_features(), vec!["Agrp", "Npy"]);
        assert_eq!(pred.referenced_columns(), vec!["celltype"]);
    }

    #[test]
    fn test_display() {
        let pred = Predicate::and(vec![
            Predicate::gt("Pomc", 50.0),
            Predicate::is_in("celltype", &["Neurons"]),
        ]);
        assert_eq!(pred.to_string(), "(Pomc > 50 & celltype in {Neurons})");
    }
}
