//! Mapping harmonized clusters to A/B compartment labels.
//!
//! Cluster ids are arbitrary even after harmonization; biology enters via
//! the self-interaction ratio. For every (position, condition, replicate)
//! the ratio is the diagonal contact value minus the summed off-diagonal
//! contacts incident to that position. Open (A) chromatin interacts
//! proportionally more with the rest of the chromosome, so per chromosome
//! the cluster with the lower median ratio is labeled A and the other B.
//!
//! A PCA-based sanity check verifies that the spread of a chromosome's
//! condition centroids is dominated by a single principal axis, as the
//! two-compartment model implies.

use std::collections::HashMap;
use std::fmt;

use karyon_core::Result;
use karyon_stats::descriptive::median;
use karyon_stats::reduction::{pca, PcaConfig};

use crate::detect::UnitResult;
use crate::matrix::InteractionUnit;

/// A/B compartment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Compartment {
    A,
    B,
}

impl fmt::Display for Compartment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compartment::A => write!(f, "A"),
            Compartment::B => write!(f, "B"),
        }
    }
}

/// Self-interaction ratio of one (chromosome, position, condition, replicate).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelfInteractionRecord {
    pub chromosome: String,
    pub position: usize,
    pub condition: String,
    pub replicate: String,
    pub ratio: f64,
}

/// PC1 sanity-check outcome for one chromosome.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SanityCheckRecord {
    pub chromosome: String,
    /// Fraction of centroid variance explained by the first principal axis.
    pub pc1_ratio: f64,
    pub passed: bool,
}

/// Per-chromosome mapping from harmonized cluster id (1, 2) to compartment.
pub type CompartmentLabels = HashMap<String, [Compartment; 2]>;

/// Compute self-interaction ratios for every row of a unit.
///
/// A row whose diagonal cell is missing but that has at least one present
/// off-diagonal cell gets a ratio of 0; a fully missing row produces no
/// record.
pub fn self_interaction_ratios(unit: &InteractionUnit) -> Vec<SelfInteractionRecord> {
    let mut records = Vec::with_capacity(unit.n_rows());
    for (r, info) in unit.rows.iter().enumerate() {
        let diagonal = unit.get(r, info.position);
        let mut off_diagonal_sum = 0.0;
        let mut off_diagonal_present = false;
        for bin in 0..unit.bins {
            if bin == info.position {
                continue;
            }
            if let Some(v) = unit.get(r, bin) {
                off_diagonal_sum += v;
                off_diagonal_present = true;
            }
        }

        let ratio = match diagonal {
            Some(d) => d - off_diagonal_sum,
            None if off_diagonal_present => 0.0,
            None => continue,
        };
        records.push(SelfInteractionRecord {
            chromosome: unit.chromosome.clone(),
            position: info.position,
            condition: unit.condition.clone(),
            replicate: info.replicate.clone(),
            ratio,
        });
    }
    records
}

/// Derive the per-chromosome cluster-to-compartment mapping.
///
/// For each chromosome the median ratio is taken per harmonized cluster
/// over all member (position, condition, replicate) tuples; the cluster
/// with the lower median maps to A. Ties, or a cluster with no ratio
/// values, default cluster 1 to A.
pub fn assign_compartments(
    units: &[UnitResult],
    ratios: &[SelfInteractionRecord],
) -> CompartmentLabels {
    // (chromosome, condition, position, replicate) -> harmonized cluster id
    let mut cluster_of: HashMap<(&str, &str, usize, &str), usize> = HashMap::new();
    for unit in units {
        for (info, &assignment) in unit.rows.iter().zip(&unit.assignments) {
            cluster_of.insert(
                (
                    unit.chromosome.as_str(),
                    unit.condition.as_str(),
                    info.position,
                    info.replicate.as_str(),
                ),
                assignment,
            );
        }
    }

    let mut per_cluster: HashMap<&str, [Vec<f64>; 2]> = HashMap::new();
    for record in ratios {
        let key = (
            record.chromosome.as_str(),
            record.condition.as_str(),
            record.position,
            record.replicate.as_str(),
        );
        if let Some(&cluster) = cluster_of.get(&key) {
            per_cluster
                .entry(record.chromosome.as_str())
                .or_insert_with(|| [Vec::new(), Vec::new()])[cluster - 1]
                .push(record.ratio);
        }
    }

    let mut labels = CompartmentLabels::new();
    for unit in units {
        let chromosome = unit.chromosome.as_str();
        if labels.contains_key(chromosome) {
            continue;
        }
        let mapping = match per_cluster.get(chromosome) {
            Some([ratios1, ratios2]) => {
                let m1 = median(ratios1).ok();
                let m2 = median(ratios2).ok();
                match (m1, m2) {
                    (Some(m1), Some(m2)) if m2 < m1 => [Compartment::B, Compartment::A],
                    // Lower median (or tie, or missing data) puts A on cluster 1.
                    _ => [Compartment::A, Compartment::B],
                }
            }
            None => [Compartment::A, Compartment::B],
        };
        labels.insert(unit.chromosome.clone(), mapping);
    }
    labels
}

/// Orient concordance signs to the A/B labels.
///
/// Raw concordance is positive when a row leans toward cluster 2. After
/// this pass it is positive when the row leans toward the chromosome's A
/// compartment, so the sign flips exactly for chromosomes where cluster 1
/// was labeled A.
pub fn apply_labels(units: &mut [UnitResult], labels: &CompartmentLabels) {
    for unit in units {
        if let Some([first, _]) = labels.get(&unit.chromosome) {
            if *first == Compartment::A {
                for concordance in &mut unit.concordances {
                    *concordance = -*concordance;
                }
            }
        }
    }
}

/// PC1 sanity check over each chromosome's condition centroids.
///
/// `units` must be sorted by chromosome. Failing the threshold is reported,
/// not fatal; downstream results remain available.
pub fn sanity_check(units: &[UnitResult], threshold: f64) -> Result<Vec<SanityCheckRecord>> {
    let mut records = Vec::new();
    let mut start = 0;
    while start < units.len() {
        let chromosome = &units[start].chromosome;
        let mut end = start + 1;
        while end < units.len() && &units[end].chromosome == chromosome {
            end += 1;
        }

        let bins = units[start].bins;
        let mut stacked = Vec::with_capacity((end - start) * 2 * bins);
        for unit in &units[start..end] {
            stacked.extend_from_slice(&unit.centroids[0]);
            stacked.extend_from_slice(&unit.centroids[1]);
        }

        let config = PcaConfig {
            n_components: 1,
            ..Default::default()
        };
        let result = pca(&stacked, bins, &config)?;
        let pc1_ratio = result.explained_variance_ratio[0];
        records.push(SanityCheckRecord {
            chromosome: chromosome.clone(),
            pc1_ratio,
            passed: pc1_ratio >= threshold,
        });

        start = end;
    }
    Ok(records)
}

// ── Tests ──────────────────────────────────────────────────────────────────
