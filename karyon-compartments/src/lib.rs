//! A/B chromatin-compartment detection from Hi-C interaction matrices.
//!
//! The crate compares chromatin compartmentalization across experimental
//! conditions. Each chromosome x condition pair contributes an
//! [`InteractionUnit`](matrix::InteractionUnit) of per-replicate interaction
//! rows; [`detect_compartments`](detect::detect_compartments) clusters every
//! unit into two groups with a must-link constraint tying replicate rows of
//! the same genomic position together, harmonizes cluster labels across
//! conditions, names the clusters A and B from their self-interaction
//! profiles, and tests positions that switch compartment between conditions
//! against an empirical null distribution with Benjamini-Hochberg control.
//!
//! All randomness derives from a single master seed, so sequential runs on
//! identical input are bit-identical.
//!
//! # Quick start
//!
//! ```
//! use karyon_compartments::detect::{detect_compartments, DetectionParameters};
//! use karyon_compartments::matrix::{InteractionUnit, RowInfo};
//!
//! // One chromosome, two conditions, four genomic positions, one replicate.
//! // Positions 0-1 interact with the first half, 2-3 with the second.
//! let profile = |position: usize, lift: f64| -> Vec<f64> {
//!     if position < 2 {
//!         vec![9.0 + lift, 9.0, 1.0, 1.0]
//!     } else {
//!         vec![1.0, 1.0, 9.0 + lift, 9.0]
//!     }
//! };
//! let unit = |condition: &str, lift: f64| -> InteractionUnit {
//!     let rows: Vec<RowInfo> = (0..4).map(|p| RowInfo::new("R1", p)).collect();
//!     let values: Vec<f64> = (0..4)
//!         .flat_map(|p| profile(p, lift + 0.01 * p as f64))
//!         .collect();
//!     InteractionUnit::new("chr1", condition, 4, rows, values).unwrap()
//! };
//!
//! let units = vec![unit("wild-type", 0.0), unit("treated", 0.1)];
//! let results = detect_compartments(&units, &DetectionParameters::default()).unwrap();
//!
//! assert_eq!(results.compartments.len(), 8); // 4 positions x 2 conditions
//! assert_eq!(results.centroids.len(), 4);    // 2 compartments x 2 conditions
//! assert!(results.issues.is_empty());
//! ```

pub mod classify;
pub mod cluster;
pub mod concordance;
pub mod detect;
pub mod difference;
pub mod harmonize;
pub mod matrix;

mod rng;

pub use classify::{Compartment, CompartmentLabels};
pub use cluster::{constrained_kmeans, ClusteringConfig, ClusteringOutcome};
pub use concordance::concordance;
pub use detect::{
    detect_compartments, CompartmentResults, DetectionIssue, DetectionParameters, UnitResult,
};
pub use difference::{DifferenceRecord, SwitchDirection};
pub use matrix::{InteractionUnit, RowInfo};
