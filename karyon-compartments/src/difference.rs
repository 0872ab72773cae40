//! Significance testing of compartment switches between conditions.
//!
//! For every pair of conditions sharing a chromosome, each position gets a
//! difference statistic: the median absolute difference over the full
//! cross-product of the two conditions' replicate concordances. Positions
//! keeping the same A/B label form the empirical null; positions that
//! switch label are scored against it (p = 1 - ECDF of the null at the
//! statistic) and adjusted with Benjamini-Hochberg within each
//! chromosome x condition-pair group.

use std::collections::BTreeMap;
use std::fmt;

use karyon_core::Result;
use karyon_stats::correction::benjamini_hochberg;
use karyon_stats::descriptive::median;
use karyon_stats::Ecdf;

use crate::classify::{Compartment, CompartmentLabels};
use crate::detect::UnitResult;

/// Direction of a compartment switch, read from the first condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SwitchDirection {
    AToB,
    BToA,
}

impl fmt::Display for SwitchDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchDirection::AToB => write!(f, "A->B"),
            SwitchDirection::BToA => write!(f, "B->A"),
        }
    }
}

/// One switching position's test result for a condition pair.
///
/// `p_value` and `p_adjusted` are `NaN` when the pair's null distribution
/// was empty: the switch is still reported, its significance is undefined.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DifferenceRecord {
    pub chromosome: String,
    pub position: usize,
    pub condition1: String,
    pub condition2: String,
    pub p_value: f64,
    pub p_adjusted: f64,
    pub direction: SwitchDirection,
}

/// Per-position view of one unit: compartment label and replicate
/// concordances, keyed by position.
struct PositionView {
    label: Compartment,
    concordances: Vec<f64>,
}

fn position_views(unit: &UnitResult, labels: &CompartmentLabels) -> BTreeMap<usize, PositionView> {
    let mapping = labels[&unit.chromosome];
    let mut views: BTreeMap<usize, PositionView> = BTreeMap::new();
    for ((info, &assignment), &concordance) in unit
        .rows
        .iter()
        .zip(&unit.assignments)
        .zip(&unit.concordances)
    {
        views
            .entry(info.position)
            .or_insert_with(|| PositionView {
                label: mapping[assignment - 1],
                concordances: Vec::new(),
            })
            .concordances
            .push(concordance);
    }
    views
}

/// Test every condition pair of every chromosome for compartment switches.
///
/// `units` must be harmonized, labeled, and sorted by (chromosome,
/// condition). Only positions present in both conditions of a pair are
/// compared. A pair with no switching positions contributes no records.
pub fn test_differences(
    units: &[UnitResult],
    labels: &CompartmentLabels,
) -> Result<Vec<DifferenceRecord>> {
    let mut records = Vec::new();

    let mut start = 0;
    while start < units.len() {
        let chromosome = &units[start].chromosome;
        let mut end = start + 1;
        while end < units.len() && &units[end].chromosome == chromosome {
            end += 1;
        }

        // A chromosome without a label mapping has nothing to compare.
        if labels.contains_key(chromosome) {
            let group = &units[start..end];
            for i in 0..group.len() {
                for j in (i + 1)..group.len() {
                    test_pair(&group[i], &group[j], labels, &mut records)?;
                }
            }
        }
        start = end;
    }

    Ok(records)
}

/// Test one chromosome x condition pair, appending its records.
fn test_pair(
    first: &UnitResult,
    second: &UnitResult,
    labels: &CompartmentLabels,
    records: &mut Vec<DifferenceRecord>,
) -> Result<()> {
    let views1 = position_views(first, labels);
    let views2 = position_views(second, labels);

    // Difference statistic per shared position, split by switch status.
    let mut null_values = Vec::new();
    let mut switching: Vec<(usize, f64, SwitchDirection)> = Vec::new();
    for (&position, view1) in &views1 {
        let Some(view2) = views2.get(&position) else {
            continue;
        };
        let mut cross = Vec::with_capacity(view1.concordances.len() * view2.concordances.len());
        for &a in &view1.concordances {
            for &b in &view2.concordances {
                cross.push((a - b).abs());
            }
        }
        let difference = median(&cross)?;

        if view1.label == view2.label {
            if difference > 0.0 {
                null_values.push(difference);
            }
        } else {
            let direction = match view1.label {
                Compartment::A => SwitchDirection::AToB,
                Compartment::B => SwitchDirection::BToA,
            };
            switching.push((position, difference, direction));
        }
    }

    if switching.is_empty() {
        return Ok(());
    }

    // Empty null: significance is undefined for this group.
    let (p_values, p_adjusted) = if null_values.is_empty() {
        (
            vec![f64::NAN; switching.len()],
            vec![f64::NAN; switching.len()],
        )
    } else {
        let ecdf = Ecdf::new(&null_values)?;
        let p_values: Vec<f64> = switching
            .iter()
            .map(|&(_, difference, _)| (1.0 - ecdf.eval(difference)).clamp(0.0, 1.0))
            .collect();
        let p_adjusted = benjamini_hochberg(&p_values)?;
        (p_values, p_adjusted)
    };

    for ((position, _, direction), (p_value, p_adjusted)) in
        switching.into_iter().zip(p_values.into_iter().zip(p_adjusted))
    {
        records.push(DifferenceRecord {
            chromosome: first.chromosome.clone(),
            position,
            condition1: first.condition.clone(),
            condition2: second.condition.clone(),
            p_value,
            p_adjusted,
            direction,
        });
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────
