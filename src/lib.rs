pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod reconcile;
pub mod telemetry;
pub mod ui;
pub mod warning;

pub use error::{AutomergeError, Result};
pub use reconcile::{reconcile, ReconcileOutcome};
