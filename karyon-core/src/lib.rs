//! Shared primitives for the karyon compartment-analysis workspace.
//!
//! `karyon-core` provides the foundation the other karyon crates build on:
//!
//! - **Error types** — [`KaryonError`] and [`Result`] for structured error handling
//! - **Traits** — [`Summarizable`] for one-line summaries of aggregate results

pub mod error;
pub mod traits;

pub use error::{KaryonError, Result};
pub use traits::Summarizable;
