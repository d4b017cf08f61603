//! Row masks with length-checked combinators.
//!
//! A [`Mask`] holds one boolean per cell. Binary operations refuse to combine
//! masks of different lengths instead of broadcasting or truncating.

use crate::error::{Result, SubsetError};
use serde::{Deserialize, Serialize};

/// Boolean row selector aligned by position with an [`AnnotatedMatrix`](crate::data::AnnotatedMatrix).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mask {
    bits: Vec<bool>,
}

impl Mask {
    /// Mask of `len` rows, all selected.
    pub fn all(len: usize) -> Self {
        Self {
            bits: vec![true; len],
        }
    }

    /// Mask of `len` rows, none selected.
    pub fn none(len: usize) -> Self {
        Self {
            bits: vec![false; len],
        }
    }

    /// Number of rows covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of selected rows.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Whether row `row` is selected.
    #[inline]
    pub fn get(&self, row: usize) -> Option<bool> {
        self.bits.get(row).copied()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Positions of selected rows, ascending.
    pub fn indices(&self) -> Vec<usize> {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, &b)| b)
            .map(|(i, _)| i)
            .collect()
    }

    /// Fail with `ShapeMismatch` unless this mask covers exactly `expected` rows.
    pub fn check_len(&self, expected: usize) -> Result<()> {
        if self.len() != expected {
            return Err(SubsetError::ShapeMismatch {
                expected,
                actual: self.len(),
            });
        }
        Ok(())
    }

    /// Elementwise AND.
    pub fn and(&self, other: &Mask) -> Result<Mask> {
        self.zip_with(other, |a, b| a && b)
    }

    /// Elementwise OR.
    pub fn or(&self, other: &Mask) -> Result<Mask> {
        self.zip_with(other, |a, b| a || b)
    }

    /// Elementwise NOT.
    pub fn not(&self) -> Mask {
        Self {
            bits: self.bits.iter().map(|b| !b).collect(),
        }
    }

    fn zip_with(&self, other: &Mask, op: impl Fn(bool, bool) -> bool) -> Result<Mask> {
        other.check_len(self.len())?;
        Ok(Self {
            bits: self
                .bits
                .iter()
                .zip(&other.bits)
                .map(|(&a, &b)| op(a, b))
                .collect(),
        })
    }
}

impl From<Vec<bool>> for Mask {
    fn from(bits: Vec<bool>) -> Self {
        Self { bits }
    }
}

impl FromIterator<bool> for Mask {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}
