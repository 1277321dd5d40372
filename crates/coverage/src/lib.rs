//! `spcov-coverage` — Sponsored Products target coverage engine.
//!
//! Pure engine crate: receives pre-loaded tables, returns classified targets,
//! coverage gaps and chart data. No CLI or IO dependencies.

pub mod baseline;
pub mod bid;
pub mod chart;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod load;
pub mod model;
pub mod normalize;
pub mod output;
pub mod plan;
pub mod summary;
pub mod table;

pub use config::CoverageConfig;
pub use engine::run;
pub use error::CoverageError;
pub use model::{CoverageInput, CoverageReport, CoveredEntry, MissingEntry};
pub use plan::TargetPlan;
pub use table::{Cell, Table};
