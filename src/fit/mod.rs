//! Fitting.
//!
//! Responsibilities:
//!
//! - minimize weighted residuals over the free parameters (`minimizer`)
//! - split/reassemble fixed and free parameters, report failures (`fitter`)
//! - build guess/fit curves for plotting (`overlay`)

pub mod fitter;
pub mod minimizer;
pub mod overlay;

pub use fitter::*;
pub use minimizer::*;
pub use overlay::*;
