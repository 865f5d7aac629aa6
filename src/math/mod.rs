//! Numerical building blocks: dense least squares, semi-infinite quadrature,
//! the synchrotron special function, and log-space error propagation.

pub mod logspace;
pub mod ols;
pub mod quadrature;
pub mod special;

pub use logspace::*;
pub use ols::*;
pub use quadrature::*;
pub use special::*;
