//! Input/output helpers.
//!
//! - data table ingest + validation (`ingest`)
//! - parameter files and `name=value` overrides (`params`)
//! - fit JSON and dataset CSV exports (`export`)

pub mod export;
pub mod ingest;
pub mod params;

pub use export::*;
pub use ingest::*;
pub use params::*;
