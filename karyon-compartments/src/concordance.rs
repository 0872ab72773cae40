//! Per-row confidence scores for cluster membership.
//!
//! The concordance of a row quantifies how firmly it sits with one of the
//! two centroids, on a bounded scale: -1 means "exactly at centroid 1",
//! +1 means "exactly at centroid 2", 0 means equidistant. The score is a
//! log-ratio of centroid distances, affinely rescaled so the centroids
//! themselves map to the interval endpoints.

use karyon_core::{KaryonError, Result};

use crate::cluster::euclidean;

/// Concordance of `row` with respect to the two cluster centroids.
///
/// With `d(v, c)` the Euclidean distance and a small epsilon proportional
/// to the centroid separation, the raw score is
/// `ln((d(row, c1) + eps) / (d(row, c2) + eps))`, rescaled so that
/// centroid 1 maps to -1 and centroid 2 to +1, then clamped against
/// floating round-off at the extremes.
///
/// Returns 0.0 when the centroids coincide: a degenerate clustering
/// carries no membership information.
pub fn concordance(row: &[f64], centroid1: &[f64], centroid2: &[f64]) -> Result<f64> {
    if row.len() != centroid1.len() || row.len() != centroid2.len() {
        return Err(KaryonError::InvalidInput(format!(
            "concordance: length mismatch (row {}, centroids {} / {})",
            row.len(),
            centroid1.len(),
            centroid2.len(),
        )));
    }
    if row.is_empty() {
        return Err(KaryonError::InvalidInput(
            "concordance: empty vectors".into(),
        ));
    }

    let separation = euclidean(centroid1, centroid2);
    if separation == 0.0 {
        return Ok(0.0);
    }
    let eps = separation * 1e-10;

    let ratio = |v: &[f64]| ((euclidean(v, centroid1) + eps) / (euclidean(v, centroid2) + eps)).ln();
    let lo = ratio(centroid1);
    let hi = ratio(centroid2);
    let score = 2.0 * (ratio(row) - lo) / (hi - lo) - 1.0;
    Ok(score.clamp(-1.0, 1.0))
}

// ── Tests ──────────────────────────────────────────────────────────────────
