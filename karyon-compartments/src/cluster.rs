//! Constrained two-cluster k-means with random restarts.
//!
//! Clusters the rows of one chromosome x condition matrix into two groups
//! under must-link constraints: all rows of a must-link group (the
//! replicates of one genomic position) always receive the same label. The
//! assignment step therefore scores whole groups, not individual rows: a
//! group goes to the cluster minimizing the summed squared distance of its
//! member rows to that cluster's centroid, ties broken toward cluster 1.
//!
//! The engine runs several independent seeded restarts and keeps the one
//! with the lowest final inertia.

use karyon_core::{KaryonError, Result};

use crate::rng::{mix_seed, Xorshift64};

/// Fixed cluster count of the compartment model.
const CLUSTERS: usize = 2;

/// Fresh initializations allowed per restart before the unit is failed.
const MAX_REINIT: usize = 10;

/// Configuration for one unit's clustering run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusteringConfig {
    /// Convergence threshold on the maximum per-centroid movement.
    pub delta: f64,
    /// Maximum Lloyd iterations per restart.
    pub max_iterations: usize,
    /// Number of independent restarts.
    pub restarts: usize,
    /// Seed for this unit; each restart derives its own sub-seed.
    pub seed: u64,
}

/// Result of clustering one unit.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClusteringOutcome {
    /// Cluster id per row, 1 or 2.
    pub assignments: Vec<usize>,
    /// One centroid per cluster, each of length `bins`.
    pub centroids: [Vec<f64>; 2],
    /// Total within-cluster squared distance of the selected restart.
    pub inertia: f64,
}

/// Cluster `values` (row-major, `n_bins` columns) into two groups under
/// must-link constraints.
///
/// `groups` must partition the row indices; every row belongs to exactly
/// one group.
///
/// # Errors
///
/// Fails fast on malformed input (wrong shape, non-finite values, fewer
/// rows or groups than clusters), and fails the run when a restart keeps
/// producing an empty cluster after [`MAX_REINIT`] fresh initializations.
pub fn constrained_kmeans(
    values: &[f64],
    n_bins: usize,
    groups: &[Vec<usize>],
    config: &ClusteringConfig,
) -> Result<ClusteringOutcome> {
    if n_bins == 0 {
        return Err(KaryonError::InvalidInput(
            "clustering: n_bins must be > 0".into(),
        ));
    }
    if values.len() % n_bins != 0 {
        return Err(KaryonError::InvalidInput(format!(
            "clustering: value count ({}) not divisible by n_bins ({})",
            values.len(),
            n_bins,
        )));
    }
    let n_rows = values.len() / n_bins;
    if n_rows < CLUSTERS {
        return Err(KaryonError::InvalidInput(format!(
            "clustering: need at least {} rows, got {}",
            CLUSTERS, n_rows,
        )));
    }
    if groups.len() < CLUSTERS {
        return Err(KaryonError::InvalidInput(format!(
            "clustering: need at least {} must-link groups, got {}",
            CLUSTERS,
            groups.len(),
        )));
    }
    if let Some((i, &v)) = values
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_finite())
    {
        return Err(KaryonError::InvalidInput(format!(
            "clustering: non-finite value at cell {}: {}",
            i, v,
        )));
    }
    // Every row must belong to exactly one group.
    let mut seen = vec![false; n_rows];
    for group in groups {
        for &r in group {
            if r >= n_rows {
                return Err(KaryonError::InvalidInput(format!(
                    "clustering: group row index {} out of range ({} rows)",
                    r, n_rows,
                )));
            }
            if seen[r] {
                return Err(KaryonError::InvalidInput(format!(
                    "clustering: row {} appears in more than one group",
                    r,
                )));
            }
            seen[r] = true;
        }
    }
    if let Some(r) = seen.iter().position(|&s| !s) {
        return Err(KaryonError::InvalidInput(format!(
            "clustering: row {} not covered by any group",
            r,
        )));
    }
    if config.restarts == 0 || config.max_iterations == 0 {
        return Err(KaryonError::InvalidInput(
            "clustering: restarts and max_iterations must be > 0".into(),
        ));
    }

    let mut best: Option<ClusteringOutcome> = None;
    for restart in 0..config.restarts {
        let mut rng = Xorshift64::new(mix_seed(config.seed, restart as u64));
        let outcome = run_restart(values, n_bins, n_rows, groups, config, &mut rng)?;
        let better = match &best {
            Some(b) => outcome.inertia < b.inertia,
            None => true,
        };
        if better {
            best = Some(outcome);
        }
    }

    // restarts > 0 was validated, so a best outcome exists.
    best.ok_or_else(|| KaryonError::Other("clustering: no restart produced an outcome".into()))
}

/// One restart: initialize, iterate to convergence, return the outcome.
/// Re-initializes on empty clusters, up to [`MAX_REINIT`] attempts.
fn run_restart(
    values: &[f64],
    n_bins: usize,
    n_rows: usize,
    groups: &[Vec<usize>],
    config: &ClusteringConfig,
    rng: &mut Xorshift64,
) -> Result<ClusteringOutcome> {
    let row = |r: usize| &values[r * n_bins..(r + 1) * n_bins];

    'attempt: for _ in 0..MAX_REINIT {
        // Seed centroids from two distinct rows.
        let first = rng.next_bounded(n_rows as u64) as usize;
        let mut second = first;
        while second == first {
            second = rng.next_bounded(n_rows as u64) as usize;
        }
        let mut centroids = [row(first).to_vec(), row(second).to_vec()];
        let mut assignments = vec![0usize; n_rows];

        for _ in 0..config.max_iterations {
            // Assignment: whole groups, summed squared distance, ties to
            // the lower cluster id.
            let mut counts = [0usize; CLUSTERS];
            for group in groups {
                let mut costs = [0.0f64; CLUSTERS];
                for (c, cost) in costs.iter_mut().enumerate() {
                    *cost = group
                        .iter()
                        .map(|&r| sq_euclidean(row(r), &centroids[c]))
                        .sum();
                }
                let target = usize::from(costs[1] < costs[0]);
                for &r in group {
                    assignments[r] = target;
                }
                counts[target] += group.len();
            }
            if counts[0] == 0 || counts[1] == 0 {
                continue 'attempt;
            }

            // Update: each centroid becomes the mean of its rows.
            let mut next = [vec![0.0; n_bins], vec![0.0; n_bins]];
            for r in 0..n_rows {
                let target = &mut next[assignments[r]];
                for (d, v) in row(r).iter().enumerate() {
                    target[d] += v;
                }
            }
            for (c, centroid) in next.iter_mut().enumerate() {
                let count = counts[c] as f64;
                for v in centroid.iter_mut() {
                    *v /= count;
                }
            }

            let movement = centroids
                .iter()
                .zip(&next)
                .map(|(old, new)| euclidean(old, new))
                .fold(0.0f64, f64::max);
            centroids = next;
            if movement < config.delta {
                break;
            }
        }

        let inertia: f64 = (0..n_rows)
            .map(|r| sq_euclidean(row(r), &centroids[assignments[r]]))
            .sum();

        return Ok(ClusteringOutcome {
            assignments: assignments.iter().map(|&a| a + 1).collect(),
            centroids,
            inertia,
        });
    }

    Err(KaryonError::Other(format!(
        "empty cluster persisted after {} initializations",
        MAX_REINIT,
    )))
}

/// Squared Euclidean distance (no sqrt for speed).
fn sq_euclidean(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Euclidean (L2) distance.
pub(crate) fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    sq_euclidean(a, b).sqrt()
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClusteringConfig {
        ClusteringConfig {
            delta: 1e-4,
            max_iterations: 50,
            restarts: 20,
            seed: 42,
        }
    }

    /// 6 rows x 2 bins: rows 0-2 near the origin, rows 3-5 far away.
    fn separable() -> (Vec<f64>, Vec<Vec<usize>>) {
        let values = vec![
            0.0, 0.0, //
            0.1, 0.1, //
            0.2, 0.0, //
            10.0, 10.0, //
            10.1, 10.1, //
            10.2, 10.0,
        ];
        let groups = vec![vec![0], vec![1], vec![2], vec![3], vec![4], vec![5]];
        (values, groups)
    }

    #[test]
    fn splits_separable_data() {
        let (values, groups) = separable();
        let out = constrained_kmeans(&values, 2, &groups, &config()).unwrap();
        assert_eq!(out.assignments.len(), 6);
        assert_eq!(out.assignments[0], out.assignments[1]);
        assert_eq!(out.assignments[0], out.assignments[2]);
        assert_eq!(out.assignments[3], out.assignments[4]);
        assert_eq!(out.assignments[3], out.assignments[5]);
        assert_ne!(out.assignments[0], out.assignments[3]);
        assert!(out.assignments.iter().all(|&a| a == 1 || a == 2));
        assert!(out.inertia < 1.0);
    }

    #[test]
    fn must_link_overrides_proximity() {
        // Row 2 sits with the far cluster but is linked to rows 0 and 1.
        let values = vec![
            0.0, 0.0, //
            0.1, 0.0, //
            10.0, 10.0, //
            10.1, 10.0, //
            10.2, 10.1,
        ];
        let groups = vec![vec![0, 1, 2], vec![3], vec![4]];
        let out = constrained_kmeans(&values, 2, &groups, &config()).unwrap();
        assert_eq!(out.assignments[0], out.assignments[1]);
        assert_eq!(out.assignments[0], out.assignments[2]);
    }

    #[test]
    fn reproducible_for_fixed_seed() {
        let (values, groups) = separable();
        let a = constrained_kmeans(&values, 2, &groups, &config()).unwrap();
        let b = constrained_kmeans(&values, 2, &groups, &config()).unwrap();
        assert_eq!(a.assignments, b.assignments);
        assert_eq!(a.centroids, b.centroids);
        assert_eq!(a.inertia.to_bits(), b.inertia.to_bits());
    }

    #[test]
    fn centroids_are_cluster_means() {
        let (values, groups) = separable();
        let out = constrained_kmeans(&values, 2, &groups, &config()).unwrap();
        let near = &out.centroids[out.assignments[0] - 1];
        assert!((near[0] - 0.1).abs() < 1e-9);
        assert!((near[1] - 0.1 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_non_finite_values() {
        let values = vec![0.0, f64::NAN, 1.0, 2.0];
        let groups = vec![vec![0], vec![1]];
        assert!(constrained_kmeans(&values, 2, &groups, &config()).is_err());
    }

    #[test]
    fn rejects_too_few_rows() {
        let values = vec![1.0, 2.0];
        let groups = vec![vec![0]];
        assert!(constrained_kmeans(&values, 2, &groups, &config()).is_err());
    }

    #[test]
    fn rejects_bad_partition() {
        let values = vec![0.0, 0.0, 1.0, 1.0];
        // Row 1 in two groups.
        assert!(constrained_kmeans(&values, 2, &[vec![0, 1], vec![1]], &config()).is_err());
        // Row 1 uncovered.
        assert!(constrained_kmeans(&values, 2, &[vec![0], vec![]], &config()).is_err());
    }

    #[test]
    fn identical_rows_fail_with_clustering_error() {
        // Every initialization collapses to one cluster.
        let values = vec![1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let groups = vec![vec![0], vec![1], vec![2]];
        let err = constrained_kmeans(&values, 2, &groups, &config()).unwrap_err();
        assert!(err.to_string().contains("empty cluster"));
    }
}
