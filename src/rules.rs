//! Named subset rules, including the built-in hypothalamic marker rules.

use crate::predicate::Predicate;
use serde::{Deserialize, Serialize};

/// Annotation column holding the cell-type label when none is configured.
pub const DEFAULT_CELLTYPE_COLUMN: &str = "celltype";

pub const NEURONS: &str = "Neurons";
pub const ASTROCYTES: &str = "Astrocytes";

/// A named predicate that selects one subset of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsetRule {
    /// Identifier, also used for output file names.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Written as nested single-key maps (`And: [...]`), not YAML tags.
    #[serde(with = "serde_yaml::with::singleton_map_recursive")]
    pub predicate: Predicate,
}

impl SubsetRule {
    pub fn new(name: &str, predicate: Predicate) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            predicate,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// POMC neurons: `Pomc > 50 & Rbfox3 > 15 & celltype ∈ {Neurons}`.
pub fn pomc_neurons(celltype_column: &str) -> SubsetRule {
    SubsetRule::new(
        "pomc_neurons",
        Predicate::and(vec![
            Predicate::gt("Pomc", 50.0),
            Predicate::gt("Rbfox3", 15.0),
            Predicate::is_in(celltype_column, &[NEURONS]),
        ]),
    )
    .with_description("Pomc-high mature neurons")
}

/// AgRP/NPY neurons: `(Agrp > 15 | Npy > 20) & Rbfox3 > 5 & celltype ∈ {Neurons}`.
pub fn npy_neurons(celltype_column: &str) -> SubsetRule {
    SubsetRule::new(
        "npy_neurons",
        Predicate::and(vec![
            Predicate::or(vec![Predicate::gt("Agrp", 15.0), Predicate::gt("Npy", 20.0)]),
            Predicate::gt("Rbfox3", 5.0),
            Predicate::is_in(celltype_column, &[NEURONS]),
        ]),
    )
    .with_description("Agrp- or Npy-high neurons")
}

/// Lxn-positive astrocytes: `Lxn > 1 & Rbfox3 < 10 & celltype ∈ {Astrocytes}`.
pub fn lxn_pos_astro(celltype_column: &str) -> SubsetRule {
    SubsetRule::new(
        "lxn_pos_astro",
        Predicate::and(vec![
            Predicate::gt("Lxn", 1.0),
            Predicate::lt("Rbfox3", 10.0),
            Predicate::is_in(celltype_column, &[ASTROCYTES]),
        ]),
    )
    .with_description("Lxn-expressing astrocytes without neuronal signal")
}

/// Lxn-negative astrocytes: `Lxn == 0 & Rbfox3 < 10 & celltype ∈ {Astrocytes}`.
pub fn lxn_neg_astro(celltype_column: &str) -> SubsetRule {
    SubsetRule::new(
        "lxn_neg_astro",
        Predicate::and(vec![
            Predicate::equals("Lxn", 0.0),
            Predicate::lt("Rbfox3", 10.0),
            Predicate::is_in(celltype_column, &[ASTROCYTES]),
        ]),
    )
    .with_description("Astrocytes with no Lxn expression")
}

/// The four built-in rules, in order.
pub fn builtin_rules(celltype_column: &str) -> Vec<SubsetRule> {
    vec![
        pomc_neurons(celltype_column),
        npy_neurons(celltype_column),
        lxn_pos_astro(celltype_column),
        lxn_neg_astro(celltype_column),
    ]
}
