//! Cell subset selection for annotated single-cell expression data.
//!
//! This library selects subsets of cells from an expression matrix by
//! thresholding marker genes and testing a cell-type annotation.
//!
//! # Overview
//!
//! - **data**: Core data structures (ExpressionMatrix, CellAnnotations, AnnotatedMatrix)
//! - **mask**: Length-checked boolean row masks
//! - **predicate**: Rule expressions evaluated per cell
//! - **rules**: Named rules, including the built-in marker rules
//! - **select**: Applying rules to produce subsets
//! - **config**: YAML rule sets
//! - **report**: Writing subsets and summaries
//!
//! # Example
//!
//! ```no_run
//! use cell_subset::prelude::*;
//!
//! let adata = AnnotatedMatrix::from_tsv("matrix.tsv", "obs.tsv").unwrap();
//! let subsets = select_all(&adata, &builtin_rules("celltype")).unwrap();
//! for subset in &subsets {
//!     println!("{}", subset);
//! }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod mask;
pub mod predicate;
pub mod report;
pub mod rules;
pub mod select;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::config::SelectionConfig;
    pub use crate::data::{AnnotatedMatrix, CellAnnotations, ExpressionMatrix, Variable, VariableType};
    pub use crate::error::{ColumnKind, Result, SubsetError};
    pub use crate::mask::Mask;
    pub use crate::predicate::{Comparison, Predicate};
    pub use crate::report::{subset_paths, write_subsets, OverlapSummary, SelectionReport};
    pub use crate::rules::{
        builtin_rules, lxn_neg_astro, lxn_pos_astro, npy_neurons, pomc_neurons, SubsetRule,
        DEFAULT_CELLTYPE_COLUMN,
    };
    pub use crate::select::{overlap, select, select_all, SubsetResult, SubsetSummary};
}
