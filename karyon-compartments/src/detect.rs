//! Compartment-detection orchestration.
//!
//! Runs the full pipeline over a set of chromosome x condition units:
//! per-unit constrained clustering and concordance scoring (sequential or,
//! with the `parallel` feature, across a rayon worker pool), cross-condition
//! harmonization, A/B classification with the PC1 sanity check, and
//! difference testing over all condition pairs. Per-unit failures are
//! reported in the result bundle and never abort the other units.
//!
//! Results are merged by sorting on (chromosome, position, condition)
//! regardless of completion order, and every random draw derives from the
//! master seed plus unit identity, so sequential runs on identical input
//! are bit-identical.

use std::collections::{HashMap, HashSet};
use std::fmt;

use karyon_core::{KaryonError, Result, Summarizable};

use crate::classify::{
    self, Compartment, SanityCheckRecord, SelfInteractionRecord,
};
use crate::cluster::{constrained_kmeans, euclidean, ClusteringConfig};
use crate::concordance::concordance;
use crate::difference::{test_differences, DifferenceRecord};
use crate::harmonize::harmonize;
use crate::matrix::{InteractionUnit, RowInfo};
use crate::rng::unit_seed;

/// Parameter bundle for a detection run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectionParameters {
    /// K-means convergence threshold on centroid movement.
    pub kmeans_delta: f64,
    /// Maximum k-means iterations per restart.
    pub kmeans_iterations: usize,
    /// Number of k-means restarts per unit.
    pub kmeans_restarts: usize,
    /// Minimum fraction of centroid variance PC1 must explain.
    pub pc1_check_threshold: f64,
    /// Master seed; every unit and restart derives a sub-seed from it.
    pub seed: u64,
}

impl Default for DetectionParameters {
    fn default() -> Self {
        Self {
            kmeans_delta: 1e-4,
            kmeans_iterations: 50,
            kmeans_restarts: 20,
            pc1_check_threshold: 0.75,
            seed: 42,
        }
    }
}

impl DetectionParameters {
    fn validate(&self) -> Result<()> {
        if !(self.kmeans_delta > 0.0 && self.kmeans_delta.is_finite()) {
            return Err(KaryonError::InvalidInput(
                "kmeans_delta must be a positive finite number".into(),
            ));
        }
        if self.kmeans_iterations == 0 || self.kmeans_restarts == 0 {
            return Err(KaryonError::InvalidInput(
                "kmeans_iterations and kmeans_restarts must be > 0".into(),
            ));
        }
        if !(self.pc1_check_threshold > 0.0 && self.pc1_check_threshold <= 1.0) {
            return Err(KaryonError::InvalidInput(
                "pc1_check_threshold must be in (0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// Clustering output of one unit, rewritten in place by the harmonizer and
/// the classifier as labels are resolved.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitResult {
    pub chromosome: String,
    pub condition: String,
    pub bins: usize,
    /// Row metadata, aligned with `assignments`, `distances`, `concordances`.
    pub rows: Vec<RowInfo>,
    /// Cluster id per row, 1 or 2, harmonized within the chromosome.
    pub assignments: Vec<usize>,
    pub centroids: [Vec<f64>; 2],
    /// Per row: Euclidean distance to centroid 1 and centroid 2.
    pub distances: Vec<[f64; 2]>,
    /// Per row: bounded membership confidence.
    pub concordances: Vec<f64>,
}

/// One compartment call: the A/B label of a position under a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompartmentRecord {
    pub chromosome: String,
    pub position: usize,
    pub condition: String,
    pub compartment: Compartment,
}

/// Per-replicate concordance with the assigned compartment; positive
/// values lean toward A, negative toward B.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConcordanceRecord {
    pub chromosome: String,
    pub position: usize,
    pub condition: String,
    pub replicate: String,
    pub compartment: Compartment,
    pub concordance: f64,
}

/// Distance of one replicate row to one compartment's centroid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceRecord {
    pub chromosome: String,
    pub position: usize,
    pub condition: String,
    pub replicate: String,
    pub compartment: Compartment,
    pub distance: f64,
}

/// One compartment's mean interaction profile under a condition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CentroidRecord {
    pub chromosome: String,
    pub condition: String,
    pub compartment: Compartment,
    pub centroid: Vec<f64>,
}

/// Non-fatal problems encountered during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DetectionIssue {
    /// A unit failed to cluster; its tables are absent from the results.
    UnitFailed {
        chromosome: String,
        condition: String,
        reason: String,
    },
    /// Fewer than two conditions of this chromosome survived clustering,
    /// so it is excluded from cross-condition comparison.
    ChromosomeNotComparable { chromosome: String },
}

impl fmt::Display for DetectionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionIssue::UnitFailed {
                chromosome,
                condition,
                reason,
            } => write!(
                f,
                "unit chromosome {chromosome}, condition {condition} failed: {reason}",
            ),
            DetectionIssue::ChromosomeNotComparable { chromosome } => {
                write!(f, "chromosome {chromosome} not comparable across conditions")
            }
        }
    }
}

/// Consolidated output of a detection run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompartmentResults {
    pub compartments: Vec<CompartmentRecord>,
    pub concordances: Vec<ConcordanceRecord>,
    pub distances: Vec<DistanceRecord>,
    pub centroids: Vec<CentroidRecord>,
    pub self_interaction_ratios: Vec<SelfInteractionRecord>,
    pub differences: Vec<DifferenceRecord>,
    pub sanity_checks: Vec<SanityCheckRecord>,
    pub issues: Vec<DetectionIssue>,
}

impl Summarizable for CompartmentResults {
    fn summary(&self) -> String {
        format!(
            "CompartmentResults: {} chromosomes, {} compartment calls, {} differential positions, {} issues",
            self.sanity_checks.len(),
            self.compartments.len(),
            self.differences.len(),
            self.issues.len(),
        )
    }
}

/// Run the full compartment-detection pipeline.
///
/// # Errors
///
/// Returns an error for global problems only: invalid parameters, no
/// units, or duplicate (chromosome, condition) units. Per-unit clustering
/// failures are reported through [`CompartmentResults::issues`].
pub fn detect_compartments(
    units: &[InteractionUnit],
    params: &DetectionParameters,
) -> Result<CompartmentResults> {
    params.validate()?;
    if units.is_empty() {
        return Err(KaryonError::InvalidInput(
            "no interaction units supplied".into(),
        ));
    }
    let mut seen = HashSet::new();
    let mut bins_of: HashMap<&str, usize> = HashMap::new();
    for unit in units {
        if !seen.insert((unit.chromosome.as_str(), unit.condition.as_str())) {
            return Err(KaryonError::InvalidInput(format!(
                "duplicate unit for chromosome {}, condition {}",
                unit.chromosome, unit.condition,
            )));
        }
        // Harmonization and the PC1 check compare centroids across a
        // chromosome's conditions, so their bin counts must agree.
        match bins_of.get(unit.chromosome.as_str()) {
            Some(&bins) if bins != unit.bins => {
                return Err(KaryonError::InvalidInput(format!(
                    "chromosome {} units disagree on bin count ({} vs {})",
                    unit.chromosome, bins, unit.bins,
                )));
            }
            Some(_) => {}
            None => {
                bins_of.insert(unit.chromosome.as_str(), unit.bins);
            }
        }
    }

    // Cluster every unit independently.
    #[cfg(feature = "parallel")]
    let clustered: Vec<Result<UnitResult>> = {
        use rayon::prelude::*;
        units
            .par_iter()
            .map(|unit| cluster_unit(unit, params))
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let clustered: Vec<Result<UnitResult>> = units
        .iter()
        .map(|unit| cluster_unit(unit, params))
        .collect();

    let mut issues = Vec::new();
    let mut results = Vec::new();
    for (unit, outcome) in units.iter().zip(clustered) {
        match outcome {
            Ok(result) => results.push(result),
            Err(KaryonError::Clustering {
                chromosome,
                condition,
                reason,
            }) => issues.push(DetectionIssue::UnitFailed {
                chromosome,
                condition,
                reason,
            }),
            Err(other) => issues.push(DetectionIssue::UnitFailed {
                chromosome: unit.chromosome.clone(),
                condition: unit.condition.clone(),
                reason: other.to_string(),
            }),
        }
    }

    // Deterministic order regardless of completion order.
    results.sort_by(|a, b| {
        a.chromosome
            .cmp(&b.chromosome)
            .then_with(|| a.condition.cmp(&b.condition))
    });

    harmonize(&mut results);

    report_comparison_gaps(units, &results, &mut issues);

    // Self-interaction ratios for every surviving unit.
    let source: HashMap<(&str, &str), &InteractionUnit> = units
        .iter()
        .map(|u| ((u.chromosome.as_str(), u.condition.as_str()), u))
        .collect();
    let mut ratios = Vec::new();
    for result in &results {
        if let Some(unit) = source.get(&(result.chromosome.as_str(), result.condition.as_str())) {
            ratios.extend(classify::self_interaction_ratios(unit));
        }
    }

    let labels = classify::assign_compartments(&results, &ratios);
    classify::apply_labels(&mut results, &labels);
    let sanity_checks = classify::sanity_check(&results, params.pc1_check_threshold)?;
    let mut differences = test_differences(&results, &labels)?;

    // Assemble and sort the output tables.
    let mut compartments = Vec::new();
    let mut concordances = Vec::new();
    let mut distances = Vec::new();
    let mut centroids = Vec::new();
    for result in &results {
        let mapping = labels[&result.chromosome];

        let mut called = HashSet::new();
        for ((info, &assignment), (&row_distances, &row_concordance)) in result
            .rows
            .iter()
            .zip(&result.assignments)
            .zip(result.distances.iter().zip(&result.concordances))
        {
            if called.insert(info.position) {
                compartments.push(CompartmentRecord {
                    chromosome: result.chromosome.clone(),
                    position: info.position,
                    condition: result.condition.clone(),
                    compartment: mapping[assignment - 1],
                });
            }
            concordances.push(ConcordanceRecord {
                chromosome: result.chromosome.clone(),
                position: info.position,
                condition: result.condition.clone(),
                replicate: info.replicate.clone(),
                compartment: mapping[assignment - 1],
                concordance: row_concordance,
            });
            for cluster in 0..2 {
                distances.push(DistanceRecord {
                    chromosome: result.chromosome.clone(),
                    position: info.position,
                    condition: result.condition.clone(),
                    replicate: info.replicate.clone(),
                    compartment: mapping[cluster],
                    distance: row_distances[cluster],
                });
            }
        }
        for cluster in 0..2 {
            centroids.push(CentroidRecord {
                chromosome: result.chromosome.clone(),
                condition: result.condition.clone(),
                compartment: mapping[cluster],
                centroid: result.centroids[cluster].clone(),
            });
        }
    }

    compartments.sort_by(|a, b| {
        (&a.chromosome, a.position, &a.condition).cmp(&(&b.chromosome, b.position, &b.condition))
    });
    concordances.sort_by(|a, b| {
        (&a.chromosome, a.position, &a.condition, &a.replicate)
            .cmp(&(&b.chromosome, b.position, &b.condition, &b.replicate))
    });
    distances.sort_by(|a, b| {
        (&a.chromosome, a.position, &a.condition, &a.replicate, a.compartment)
            .cmp(&(&b.chromosome, b.position, &b.condition, &b.replicate, b.compartment))
    });
    ratios.sort_by(|a, b| {
        (&a.chromosome, a.position, &a.condition, &a.replicate)
            .cmp(&(&b.chromosome, b.position, &b.condition, &b.replicate))
    });
    centroids.sort_by(|a, b| {
        (&a.chromosome, &a.condition, a.compartment).cmp(&(&b.chromosome, &b.condition, b.compartment))
    });
    differences.sort_by(|a, b| {
        (&a.chromosome, a.position, &a.condition1, &a.condition2)
            .cmp(&(&b.chromosome, b.position, &b.condition1, &b.condition2))
    });

    Ok(CompartmentResults {
        compartments,
        concordances,
        distances,
        centroids,
        self_interaction_ratios: ratios,
        differences,
        sanity_checks,
        issues,
    })
}

/// Cluster one unit and score its rows.
fn cluster_unit(unit: &InteractionUnit, params: &DetectionParameters) -> Result<UnitResult> {
    let groups = unit.must_link_groups();
    let view = unit.clustering_view();
    let config = ClusteringConfig {
        delta: params.kmeans_delta,
        max_iterations: params.kmeans_iterations,
        restarts: params.kmeans_restarts,
        seed: unit_seed(params.seed, &unit.chromosome, &unit.condition),
    };
    let outcome =
        constrained_kmeans(&view, unit.bins, &groups, &config).map_err(|e| {
            KaryonError::Clustering {
                chromosome: unit.chromosome.clone(),
                condition: unit.condition.clone(),
                reason: e.to_string(),
            }
        })?;

    let mut distances = Vec::with_capacity(unit.n_rows());
    let mut concordances = Vec::with_capacity(unit.n_rows());
    for r in 0..unit.n_rows() {
        let row = &view[r * unit.bins..(r + 1) * unit.bins];
        distances.push([
            euclidean(row, &outcome.centroids[0]),
            euclidean(row, &outcome.centroids[1]),
        ]);
        concordances.push(concordance(row, &outcome.centroids[0], &outcome.centroids[1])?);
    }

    Ok(UnitResult {
        chromosome: unit.chromosome.clone(),
        condition: unit.condition.clone(),
        bins: unit.bins,
        rows: unit.rows.clone(),
        assignments: outcome.assignments,
        centroids: outcome.centroids,
        distances,
        concordances,
    })
}

/// Report chromosomes that asked for cross-condition comparison but lost
/// too many units to clustering failures.
fn report_comparison_gaps(
    units: &[InteractionUnit],
    results: &[UnitResult],
    issues: &mut Vec<DetectionIssue>,
) {
    let mut requested: HashMap<&str, usize> = HashMap::new();
    for unit in units {
        *requested.entry(unit.chromosome.as_str()).or_insert(0) += 1;
    }
    let mut survived: HashMap<&str, usize> = HashMap::new();
    for result in results {
        *survived.entry(result.chromosome.as_str()).or_insert(0) += 1;
    }

    let mut gaps: Vec<&str> = requested
        .iter()
        .filter(|(chromosome, &asked)| {
            asked >= 2 && survived.get(*chromosome).copied().unwrap_or(0) < 2
        })
        .map(|(&chromosome, _)| chromosome)
        .collect();
    gaps.sort_unstable();
    for chromosome in gaps {
        issues.push(DetectionIssue::ChromosomeNotComparable {
            chromosome: chromosome.to_string(),
        });
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
