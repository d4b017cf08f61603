//! Selection configuration for serialization.

use crate::error::{Result, SubsetError};
use crate::rules::{builtin_rules, SubsetRule, DEFAULT_CELLTYPE_COLUMN};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

fn default_celltype_column() -> String {
    DEFAULT_CELLTYPE_COLUMN.to_string()
}

/// A named set of rules, loadable from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Name of the selection.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Annotation column holding the cell-type label. On load, membership
    /// tests on the default column are redirected here.
    #[serde(default = "default_celltype_column")]
    pub celltype_column: String,
    /// Rules to apply, each against the full input.
    pub rules: Vec<SubsetRule>,
}

impl SelectionConfig {
    /// The four built-in marker rules against `celltype_column`.
    pub fn builtin(celltype_column: &str) -> Self {
        Self {
            name: "hypothalamus-markers".to_string(),
            description: Some(
                "POMC and AgRP/NPY neurons, Lxn-positive and Lxn-negative astrocytes".to_string(),
            ),
            celltype_column: celltype_column.to_string(),
            rules: builtin_rules(celltype_column),
        }
    }

    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut config: Self = serde_yaml::from_str(yaml)?;
        config.apply_celltype_column();
        config.validate()?;
        Ok(config)
    }

    /// Rewrite membership tests on `DEFAULT_CELLTYPE_COLUMN` to use `celltype_column`.
    pub fn apply_celltype_column(&mut self) {
        if self.celltype_column == DEFAULT_CELLTYPE_COLUMN {
            return;
        }
        for rule in &mut self.rules {
            rule.predicate
                .rename_column(DEFAULT_CELLTYPE_COLUMN, &self.celltype_column);
        }
    }

    /// Load from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(SubsetError::from)
    }

    /// Rule names must be present and unique, since they name output files.
    pub fn validate(&self) -> Result<()> {
        if self.rules.is_empty() {
            return Err(SubsetError::InvalidParameter(format!(
                "Selection '{}' has no rules",
                self.name
            )));
        }
        let mut seen = HashSet::new();
        for rule in &self.rules {
            let name = rule.name.as_str();
            if name.is_empty()
                || name.trim() != name
                || name.contains(|c: char| c == '/' || c == '\\')
            {
                return Err(SubsetError::InvalidParameter(format!(
                    "Invalid rule name '{}'",
                    rule.name
                )));
            }
            if !seen.insert(name) {
                return Err(SubsetError::InvalidParameter(format!(
                    "Duplicate rule name '{}'",
                    rule.name
                )));
            }
        }
        Ok(())
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self::builtin(DEFAULT_CELLTYPE_COLUMN)
    }
}
