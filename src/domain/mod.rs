//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - observed data (`Dataset`)
//! - fit inputs (`FitRequest`) and outcomes (`FitResult`, `FitEstimate`, `FitFailure`)
//! - the CLI-derived run configuration (`FitConfig`, `PlotLabels`)

pub mod types;

pub use types::*;
