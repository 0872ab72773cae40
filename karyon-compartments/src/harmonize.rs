//! Cross-condition alignment of cluster identities.
//!
//! Cluster ids coming out of independent k-means runs are arbitrary: the
//! "cluster 1" of one condition need not match the "cluster 1" of another.
//! For each chromosome this module picks the smallest condition as the
//! reference and relabels every other condition so that paired centroids
//! are as close as possible, keeping cluster identity consistent within
//! the chromosome.

use crate::cluster::euclidean;
use crate::detect::UnitResult;

/// Align cluster ids across the conditions of each chromosome.
///
/// `units` must be sorted by (chromosome, condition); the reference for a
/// chromosome is its first unit. For every other unit the identity pairing
/// and the swapped pairing of centroids against the reference are compared
/// by summed Euclidean distance, and the closer pairing wins (ties keep
/// the identity). A swap relabels the unit's assignments, centroids, and
/// distances, and flips its concordance signs so the score keeps meaning
/// "leans toward cluster 2" everywhere in the chromosome.
///
/// Harmonization is idempotent: on already-aligned units the identity
/// pairing is never more distant than the swap.
pub fn harmonize(units: &mut [UnitResult]) {
    let mut start = 0;
    while start < units.len() {
        let chromosome = units[start].chromosome.clone();
        let mut end = start + 1;
        while end < units.len() && units[end].chromosome == chromosome {
            end += 1;
        }

        let reference = [
            units[start].centroids[0].clone(),
            units[start].centroids[1].clone(),
        ];
        for unit in &mut units[start + 1..end] {
            let identity = euclidean(&unit.centroids[0], &reference[0])
                + euclidean(&unit.centroids[1], &reference[1]);
            let swapped = euclidean(&unit.centroids[0], &reference[1])
                + euclidean(&unit.centroids[1], &reference[0]);
            if swapped < identity {
                swap_cluster_labels(unit);
            }
        }

        start = end;
    }
}

/// Exchange cluster ids 1 and 2 throughout one unit's tables.
fn swap_cluster_labels(unit: &mut UnitResult) {
    unit.centroids.swap(0, 1);
    for assignment in &mut unit.assignments {
        *assignment = 3 - *assignment;
    }
    for distances in &mut unit.distances {
        distances.swap(0, 1);
    }
    for concordance in &mut unit.concordances {
        *concordance = -*concordance;
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::RowInfo;

    fn unit(condition: &str, centroids: [Vec<f64>; 2]) -> UnitResult {
        UnitResult {
            chromosome: "chr1".into(),
            condition: condition.into(),
            bins: centroids[0].len(),
            rows: vec![RowInfo::new("R1", 0), RowInfo::new("R1", 1)],
            assignments: vec![1, 2],
            centroids,
            distances: vec![[0.5, 2.0], [2.0, 0.5]],
            concordances: vec![-0.8, 0.8],
        }
    }

    #[test]
    fn swaps_misaligned_condition() {
        let mut units = vec![
            unit("1", [vec![0.0, 0.0], vec![10.0, 10.0]]),
            unit("2", [vec![10.1, 10.0], vec![0.1, 0.0]]),
        ];
        harmonize(&mut units);

        assert_eq!(units[1].assignments, vec![2, 1]);
        assert_eq!(units[1].centroids[0], vec![0.1, 0.0]);
        assert_eq!(units[1].distances[0], [2.0, 0.5]);
        assert_eq!(units[1].concordances, vec![0.8, -0.8]);
        // Reference untouched.
        assert_eq!(units[0].assignments, vec![1, 2]);
    }

    #[test]
    fn keeps_aligned_condition() {
        let mut units = vec![
            unit("1", [vec![0.0, 0.0], vec![10.0, 10.0]]),
            unit("2", [vec![0.1, 0.0], vec![10.1, 10.0]]),
        ];
        harmonize(&mut units);
        assert_eq!(units[1].assignments, vec![1, 2]);
        assert_eq!(units[1].concordances, vec![-0.8, 0.8]);
    }

    #[test]
    fn is_idempotent() {
        let mut units = vec![
            unit("1", [vec![0.0, 0.0], vec![10.0, 10.0]]),
            unit("2", [vec![10.1, 10.0], vec![0.1, 0.0]]),
            unit("3", [vec![0.2, 0.1], vec![9.9, 10.2]]),
        ];
        harmonize(&mut units);
        let snapshot: Vec<_> = units
            .iter()
            .map(|u| (u.assignments.clone(), u.centroids.clone(), u.concordances.clone()))
            .collect();
        harmonize(&mut units);
        for (unit, (assignments, centroids, concordances)) in units.iter().zip(&snapshot) {
            assert_eq!(&unit.assignments, assignments);
            assert_eq!(&unit.centroids, centroids);
            assert_eq!(&unit.concordances, concordances);
        }
    }

    #[test]
    fn tie_keeps_identity() {
        // Symmetric centroids: identity and swap are equally distant.
        let mut units = vec![
            unit("1", [vec![0.0], vec![2.0]]),
            unit("2", [vec![2.0], vec![0.0]]),
        ];
        harmonize(&mut units);
        assert_eq!(units[1].assignments, vec![1, 2]);
    }

    #[test]
    fn chromosomes_are_independent() {
        let a = unit("1", [vec![0.0], vec![10.0]]);
        let mut b = unit("1", [vec![10.0], vec![0.0]]);
        b.chromosome = "chr2".into();
        let mut units = vec![a, b];
        harmonize(&mut units);
        // Each chromosome has a single unit: both are their own reference.
        assert_eq!(units[0].assignments, vec![1, 2]);
        assert_eq!(units[1].assignments, vec![1, 2]);
    }
}
