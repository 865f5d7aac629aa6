//! Reporting utilities: residuals, fit summaries, and model listings.

pub mod format;

pub use format::*;
