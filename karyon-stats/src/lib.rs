//! Statistical building blocks for the karyon workspace.
//!
//! This crate carries no genomic knowledge; it provides the numeric methods
//! the compartment pipeline is built from:
//!
//! - **Descriptive statistics** — [`descriptive::mean`], [`descriptive::median`],
//!   [`descriptive::quantile`]
//! - **Multiple testing correction** — [`correction::benjamini_hochberg`],
//!   [`correction::bonferroni`]
//! - **Empirical distributions** — [`ecdf::Ecdf`]
//! - **Dimensionality reduction** — [`reduction::pca`] via power iteration

pub mod correction;
pub mod descriptive;
pub mod ecdf;
pub mod reduction;

pub use ecdf::Ecdf;
pub use reduction::{pca, PcaConfig, PcaResult};
