//! Dimensionality reduction via principal component analysis.
//!
//! PCA is computed by power iteration with deflation on the covariance
//! matrix, so no linear-algebra backend is required. This is intended for
//! the small matrices the compartment pipeline projects (a handful of
//! centroids per chromosome), not for large embeddings.

use karyon_core::{KaryonError, Result, Summarizable};

/// Configuration for PCA.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PcaConfig {
    /// Number of principal components to compute.
    pub n_components: usize,
    /// Maximum power-iteration steps per component.
    pub max_iter: usize,
    /// Convergence tolerance on the eigenvector.
    pub tolerance: f64,
}

impl Default for PcaConfig {
    fn default() -> Self {
        Self {
            n_components: 2,
            max_iter: 1000,
            tolerance: 1e-10,
        }
    }
}

/// Result of a PCA computation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PcaResult {
    /// Principal axes (eigenvectors), row-major: `n_components x n_features`.
    pub components: Vec<f64>,
    /// Eigenvalues for each computed component.
    pub explained_variance: Vec<f64>,
    /// Fraction of total variance explained by each component.
    pub explained_variance_ratio: Vec<f64>,
    /// Number of features in the input data.
    pub n_features: usize,
    /// Number of components actually computed.
    pub n_components: usize,
}

impl Summarizable for PcaResult {
    fn summary(&self) -> String {
        let total: f64 = self.explained_variance_ratio.iter().sum();
        format!(
            "PCA: {} components, {:.1}% variance explained",
            self.n_components,
            total * 100.0,
        )
    }
}

/// Run PCA on a flat row-major matrix of shape `n_samples x n_features`.
///
/// # Errors
///
/// Returns an error if the data is empty, its length is not a multiple of
/// `n_features`, or there are fewer than 2 samples.
pub fn pca(data: &[f64], n_features: usize, config: &PcaConfig) -> Result<PcaResult> {
    if data.is_empty() {
        return Err(KaryonError::InvalidInput("pca: empty data".into()));
    }
    if n_features == 0 {
        return Err(KaryonError::InvalidInput(
            "pca: n_features must be > 0".into(),
        ));
    }
    if data.len() % n_features != 0 {
        return Err(KaryonError::InvalidInput(format!(
            "pca: data length {} not divisible by n_features {}",
            data.len(),
            n_features,
        )));
    }
    let n_samples = data.len() / n_features;
    if n_samples < 2 {
        return Err(KaryonError::InvalidInput(
            "pca: need at least 2 samples".into(),
        ));
    }
    let n_components = config.n_components.min(n_features).min(n_samples);
    if n_components == 0 {
        return Err(KaryonError::InvalidInput(
            "pca: n_components must be > 0".into(),
        ));
    }

    // Center the data per feature.
    let mut mean = vec![0.0; n_features];
    for row in 0..n_samples {
        for col in 0..n_features {
            mean[col] += data[row * n_features + col];
        }
    }
    for m in mean.iter_mut() {
        *m /= n_samples as f64;
    }
    let mut centered = data.to_vec();
    for row in 0..n_samples {
        for col in 0..n_features {
            centered[row * n_features + col] -= mean[col];
        }
    }

    // Covariance matrix C = X^T X / (n - 1).
    let scale = (n_samples - 1) as f64;
    let mut cov = vec![0.0; n_features * n_features];
    for row in 0..n_samples {
        let r = &centered[row * n_features..(row + 1) * n_features];
        for i in 0..n_features {
            for j in i..n_features {
                let v = r[i] * r[j];
                cov[i * n_features + j] += v;
                if i != j {
                    cov[j * n_features + i] += v;
                }
            }
        }
    }
    for v in cov.iter_mut() {
        *v /= scale;
    }

    // Total variance is the trace of the covariance matrix, captured before
    // deflation erodes it.
    let total_variance: f64 = (0..n_features).map(|i| cov[i * n_features + i]).sum();

    let mut components = Vec::with_capacity(n_components * n_features);
    let mut eigenvalues = Vec::with_capacity(n_components);
    for _ in 0..n_components {
        let (eigenvalue, eigenvector) =
            power_iteration(&cov, n_features, config.max_iter, config.tolerance);
        components.extend_from_slice(&eigenvector);
        eigenvalues.push(eigenvalue);

        // Deflate: C -= lambda * v * v^T
        for i in 0..n_features {
            for j in 0..n_features {
                cov[i * n_features + j] -= eigenvalue * eigenvector[i] * eigenvector[j];
            }
        }
    }

    let explained_variance_ratio = if total_variance > 0.0 {
        eigenvalues.iter().map(|&ev| ev / total_variance).collect()
    } else {
        vec![0.0; n_components]
    };

    Ok(PcaResult {
        components,
        explained_variance: eigenvalues,
        explained_variance_ratio,
        n_features,
        n_components,
    })
}

/// Dominant eigenpair of a symmetric matrix by power iteration.
fn power_iteration(matrix: &[f64], n: usize, max_iter: usize, tol: f64) -> (f64, Vec<f64>) {
    // Deterministic non-zero starting vector, normalized.
    let mut v: Vec<f64> = (0..n).map(|i| 1.0 / (i + 1) as f64).collect();
    let norm: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }

    let mut eigenvalue = 0.0;
    for _ in 0..max_iter {
        let mut w = vec![0.0; n];
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..n {
                sum += matrix[i * n + j] * v[j];
            }
            w[i] = sum;
        }

        let next_eigenvalue: f64 = v.iter().zip(&w).map(|(a, b)| a * b).sum();
        let wnorm: f64 = w.iter().map(|x| x * x).sum::<f64>().sqrt();
        if wnorm == 0.0 {
            break;
        }
        for x in w.iter_mut() {
            *x /= wnorm;
        }

        let diff: f64 = v
            .iter()
            .zip(&w)
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt();
        v = w;
        eigenvalue = next_eigenvalue;
        if diff < tol {
            break;
        }
    }

    (eigenvalue.abs(), v)
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_axis_captures_variance() {
        // Points along the x axis with tiny y noise: PC1 should explain
        // nearly all variance.
        let data = vec![
            0.0, 0.01, //
            1.0, -0.01, //
            2.0, 0.02, //
            3.0, -0.02, //
            4.0, 0.0,
        ];
        let result = pca(&data, 2, &PcaConfig::default()).unwrap();
        assert_eq!(result.n_components, 2);
        assert!(result.explained_variance_ratio[0] > 0.99);
    }

    #[test]
    fn isotropic_data_splits_variance() {
        // A symmetric square of points: neither axis dominates.
        let data = vec![
            1.0, 0.0, //
            -1.0, 0.0, //
            0.0, 1.0, //
            0.0, -1.0,
        ];
        let result = pca(&data, 2, &PcaConfig::default()).unwrap();
        let r = &result.explained_variance_ratio;
        assert!((r[0] - 0.5).abs() < 1e-6, "pc1 ratio {}", r[0]);
    }

    #[test]
    fn ratios_sum_to_at_most_one() {
        let data = vec![
            1.0, 2.0, 3.0, //
            4.0, 5.0, 7.0, //
            2.0, 1.0, 0.5, //
            8.0, 3.0, 2.0,
        ];
        let config = PcaConfig {
            n_components: 3,
            ..Default::default()
        };
        let result = pca(&data, 3, &config).unwrap();
        let total: f64 = result.explained_variance_ratio.iter().sum();
        assert!(total <= 1.0 + 1e-8);
        assert!(total > 0.9);
    }

    #[test]
    fn constant_data_has_zero_ratio() {
        let data = vec![5.0, 5.0, 5.0, 5.0];
        let result = pca(&data, 2, &PcaConfig::default()).unwrap();
        assert_eq!(result.explained_variance_ratio, vec![0.0, 0.0]);
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(pca(&[], 2, &PcaConfig::default()).is_err());
        assert!(pca(&[1.0, 2.0, 3.0], 2, &PcaConfig::default()).is_err());
        assert!(pca(&[1.0, 2.0], 2, &PcaConfig::default()).is_err()); // 1 sample
    }
}
