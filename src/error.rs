//! Error types for the cell-subset library.

use std::fmt;
use thiserror::Error;

/// Which table a missing column was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// A gene column of the expression matrix.
    Feature,
    /// A column of the per-cell annotation table.
    Annotation,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Feature => write!(f, "feature"),
            ColumnKind::Annotation => write!(f, "annotation"),
        }
    }
}

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum SubsetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing {kind} column '{name}'")]
    MissingColumn { kind: ColumnKind, name: String },

    #[error("Shape mismatch: expected {expected} rows, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Cell ID mismatch: {0}")]
    CellMismatch(String),

    #[error("Invalid expression value '{value}' at row {row}, column {col}")]
    InvalidValue {
        value: String,
        row: usize,
        col: usize,
    },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Rule '{rule}' failed: {source}")]
    Rule {
        rule: String,
        #[source]
        source: Box<SubsetError>,
    },

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SubsetError {
    /// Shorthand for a missing gene column.
    pub fn missing_feature(name: &str) -> Self {
        SubsetError::MissingColumn {
            kind: ColumnKind::Feature,
            name: name.to_string(),
        }
    }

    /// Shorthand for a missing annotation column.
    pub fn missing_annotation(name: &str) -> Self {
        SubsetError::MissingColumn {
            kind: ColumnKind::Annotation,
            name: name.to_string(),
        }
    }

    /// The error underneath any `Rule` wrappers.
    pub fn root(&self) -> &SubsetError {
        match self {
            SubsetError::Rule { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, SubsetError>;
