//! Interaction-matrix value objects.
//!
//! An [`InteractionUnit`] holds the contact-intensity profiles of one
//! chromosome under one condition: rows are (replicate, genomic position)
//! pairs, columns index the chromosome's genomic bins, and a cell is either
//! a finite non-negative intensity or missing (`NaN`). Units are explicit
//! value objects, not views into a larger structure, and are never mutated
//! by the pipeline.

use karyon_core::{KaryonError, Result, Summarizable};

/// Metadata for one matrix row: which replicate and which genomic position
/// (bin index) the row's profile belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowInfo {
    pub replicate: String,
    pub position: usize,
}

impl RowInfo {
    pub fn new(replicate: impl Into<String>, position: usize) -> Self {
        Self {
            replicate: replicate.into(),
            position,
        }
    }
}

/// The interaction matrix of one chromosome x condition unit.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InteractionUnit {
    pub chromosome: String,
    pub condition: String,
    /// Number of genomic bins (matrix columns).
    pub bins: usize,
    /// Per-row metadata, aligned with the matrix rows.
    pub rows: Vec<RowInfo>,
    /// Row-major `rows.len() x bins` values; `NaN` marks a missing cell.
    values: Vec<f64>,
}

impl InteractionUnit {
    /// Build a validated unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the shape is inconsistent, a row's position is
    /// not a valid bin index, or any cell is neither missing (`NaN`) nor a
    /// finite non-negative number.
    pub fn new(
        chromosome: impl Into<String>,
        condition: impl Into<String>,
        bins: usize,
        rows: Vec<RowInfo>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if bins == 0 {
            return Err(KaryonError::InvalidInput(
                "interaction unit must have at least 1 bin".into(),
            ));
        }
        if rows.is_empty() {
            return Err(KaryonError::InvalidInput(
                "interaction unit must have at least 1 row".into(),
            ));
        }
        if values.len() != rows.len() * bins {
            return Err(KaryonError::InvalidInput(format!(
                "value count ({}) != rows ({}) x bins ({})",
                values.len(),
                rows.len(),
                bins,
            )));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.position >= bins {
                return Err(KaryonError::InvalidInput(format!(
                    "row {} position ({}) out of range for {} bins",
                    i, row.position, bins,
                )));
            }
        }
        for (i, &v) in values.iter().enumerate() {
            if !v.is_nan() && !(v.is_finite() && v >= 0.0) {
                return Err(KaryonError::InvalidInput(format!(
                    "cell {} must be missing (NaN) or finite non-negative, got {}",
                    i, v,
                )));
            }
        }
        Ok(Self {
            chromosome: chromosome.into(),
            condition: condition.into(),
            bins,
            rows,
            values,
        })
    }

    /// Number of matrix rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// One row's profile; missing cells remain `NaN`.
    pub fn row(&self, r: usize) -> &[f64] {
        &self.values[r * self.bins..(r + 1) * self.bins]
    }

    /// Cell value, or `None` when the cell is missing.
    pub fn get(&self, row: usize, bin: usize) -> Option<f64> {
        let v = self.values[row * self.bins + bin];
        if v.is_nan() {
            None
        } else {
            Some(v)
        }
    }

    /// Must-link groups: row indices sharing a genomic position, ordered by
    /// ascending position. Every row appears in exactly one group.
    pub fn must_link_groups(&self) -> Vec<Vec<usize>> {
        let mut positions: Vec<usize> = self.rows.iter().map(|r| r.position).collect();
        positions.sort_unstable();
        positions.dedup();

        positions
            .iter()
            .map(|&p| {
                self.rows
                    .iter()
                    .enumerate()
                    .filter(|(_, info)| info.position == p)
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect()
    }

    /// Sorted distinct genomic positions covered by this unit.
    pub fn positions(&self) -> Vec<usize> {
        let mut positions: Vec<usize> = self.rows.iter().map(|r| r.position).collect();
        positions.sort_unstable();
        positions.dedup();
        positions
    }

    /// Dense view for clustering: missing cells become zero.
    pub fn clustering_view(&self) -> Vec<f64> {
        self.values
            .iter()
            .map(|&v| if v.is_nan() { 0.0 } else { v })
            .collect()
    }
}

impl Summarizable for InteractionUnit {
    fn summary(&self) -> String {
        let missing = self.values.iter().filter(|v| v.is_nan()).count();
        format!(
            "InteractionUnit {} / condition {}: {} rows x {} bins, {} missing cells",
            self.chromosome,
            self.condition,
            self.n_rows(),
            self.bins,
            missing,
        )
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
