//! `spectral-fit` library crate.
//!
//! The binary (`specfit`) is a thin wrapper around this library so that:
//!
//! - the catalog, fitter and renderers are testable without spawning processes
//! - fits can be driven from other Rust code with plain data
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
