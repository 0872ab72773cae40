//! Multiple testing correction.
//!
//! Adjusts families of p-values to control the family-wise error rate
//! (Bonferroni) or the false discovery rate (Benjamini-Hochberg). Both
//! functions return adjusted p-values in the same order as the input.

use karyon_core::{KaryonError, Result};

/// Bonferroni correction: `p_adj = min(p * n, 1.0)`.
pub fn bonferroni(p_values: &[f64]) -> Result<Vec<f64>> {
    validate(p_values)?;
    let n = p_values.len() as f64;
    Ok(p_values.iter().map(|&p| (p * n).min(1.0)).collect())
}

/// Benjamini-Hochberg procedure for controlling the false discovery rate.
///
/// P-values are ranked ascending, scaled by `n / rank`, made monotone from
/// the largest rank downward, and clamped to [0, 1].
pub fn benjamini_hochberg(p_values: &[f64]) -> Result<Vec<f64>> {
    validate(p_values)?;
    let n = p_values.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

    let n_f = n as f64;
    let mut adjusted = vec![0.0; n];
    let mut running_min = f64::INFINITY;
    for rank in (1..=n).rev() {
        let idx = order[rank - 1];
        let scaled = (p_values[idx] * n_f / rank as f64).min(1.0);
        running_min = running_min.min(scaled);
        adjusted[idx] = running_min;
    }

    Ok(adjusted)
}

fn validate(p_values: &[f64]) -> Result<()> {
    for (i, &p) in p_values.iter().enumerate() {
        if !(0.0..=1.0).contains(&p) {
            return Err(KaryonError::InvalidInput(format!(
                "p-value at index {} is out of range [0, 1]: {}",
                i, p,
            )));
        }
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    #[test]
    fn bonferroni_scales_and_clamps() {
        let adj = bonferroni(&[0.01, 0.4, 0.6]).unwrap();
        assert!((adj[0] - 0.03).abs() < TOL);
        assert!((adj[1] - 1.0).abs() < TOL);
        assert!((adj[2] - 1.0).abs() < TOL);
    }

    #[test]
    fn bh_worked_example() {
        // Sorted: 0.005 (rank 1), 0.01 (2), 0.03 (3), 0.04 (4)
        // Scaled: 0.02, 0.02, 0.04, 0.04 — already monotone
        let adj = benjamini_hochberg(&[0.01, 0.04, 0.03, 0.005]).unwrap();
        assert!((adj[0] - 0.02).abs() < TOL);
        assert!((adj[1] - 0.04).abs() < TOL);
        assert!((adj[2] - 0.04).abs() < TOL);
        assert!((adj[3] - 0.02).abs() < TOL);
    }

    #[test]
    fn bh_adjusted_never_below_raw() {
        let p = [0.2, 0.001, 0.07, 0.04, 0.9, 0.33];
        let adj = benjamini_hochberg(&p).unwrap();
        for (raw, a) in p.iter().zip(&adj) {
            assert!(a >= raw, "adjusted {} below raw {}", a, raw);
            assert!(*a <= 1.0);
        }
    }

    #[test]
    fn bh_monotone_in_rank_order() {
        let p = [0.1, 0.001, 0.05, 0.01, 0.5];
        let adj = benjamini_hochberg(&p).unwrap();
        let mut pairs: Vec<(f64, f64)> = p.iter().copied().zip(adj).collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        for w in pairs.windows(2) {
            assert!(w[1].1 >= w[0].1 - TOL);
        }
    }

    #[test]
    fn bh_empty_and_single() {
        assert!(benjamini_hochberg(&[]).unwrap().is_empty());
        assert!((benjamini_hochberg(&[0.05]).unwrap()[0] - 0.05).abs() < TOL);
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(bonferroni(&[0.5, 1.5]).is_err());
        assert!(benjamini_hochberg(&[-0.1]).is_err());
    }
}
