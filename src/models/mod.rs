//! Spectral model implementations and the catalog that names them.
//!
//! Models are implemented as small, pure functions so that fitting code can
//! stay generic; the catalog adapts each one to the `f(x, θ)` shape the fitter
//! expects.

pub mod catalog;
pub mod piecewise;
pub mod powerlaw;
pub mod spectral;
pub mod synchrotron;

pub use catalog::*;
