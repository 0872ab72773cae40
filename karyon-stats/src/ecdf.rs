//! Empirical cumulative distribution functions.

use karyon_core::{KaryonError, Result};

/// An empirical CDF built from a finite sample.
///
/// `eval(x)` returns the fraction of sample values less than or equal to
/// `x`, a right-continuous step function on [0, 1].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ecdf {
    sorted: Vec<f64>,
}

impl Ecdf {
    /// Build an ECDF from a sample.
    ///
    /// Returns an error if the sample is empty or contains non-finite values.
    pub fn new(samples: &[f64]) -> Result<Self> {
        if samples.is_empty() {
            return Err(KaryonError::InvalidInput(
                "ecdf: sample must not be empty".into(),
            ));
        }
        for (i, &v) in samples.iter().enumerate() {
            if !v.is_finite() {
                return Err(KaryonError::InvalidInput(format!(
                    "ecdf: non-finite sample value at index {}: {}",
                    i, v,
                )));
            }
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        Ok(Self { sorted })
    }

    /// Fraction of sample values `<= x`.
    pub fn eval(&self, x: f64) -> f64 {
        let count = self.sorted.partition_point(|&v| v <= x);
        count as f64 / self.sorted.len() as f64
    }

}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    #[test]
    fn step_values() {
        let e = Ecdf::new(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!((e.eval(0.5) - 0.0).abs() < TOL);
        assert!((e.eval(1.0) - 0.25).abs() < TOL);
        assert!((e.eval(2.5) - 0.5).abs() < TOL);
        assert!((e.eval(4.0) - 1.0).abs() < TOL);
        assert!((e.eval(100.0) - 1.0).abs() < TOL);
    }

    #[test]
    fn ties_count_together() {
        let e = Ecdf::new(&[1.0, 1.0, 1.0, 2.0]).unwrap();
        assert!((e.eval(1.0) - 0.75).abs() < TOL);
    }

    #[test]
    fn unsorted_input() {
        let e = Ecdf::new(&[3.0, 1.0, 2.0]).unwrap();
        assert!((e.eval(1.5) - 1.0 / 3.0).abs() < TOL);
    }

    #[test]
    fn rejects_empty_and_nan() {
        assert!(Ecdf::new(&[]).is_err());
        assert!(Ecdf::new(&[1.0, f64::NAN]).is_err());
        assert!(Ecdf::new(&[f64::INFINITY]).is_err());
    }
}
