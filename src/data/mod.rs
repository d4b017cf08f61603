//! Data structures for annotated single-cell expression data.

mod annotated;
mod annotations;
mod expression_matrix;

pub use annotated::AnnotatedMatrix;
pub use annotations::{CellAnnotations, Variable, VariableType};
pub use expression_matrix::ExpressionMatrix;
