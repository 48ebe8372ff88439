// src/pipeline/mod.rs

//! Pipeline stages for a monitor run.
//!
//! - `window`: rolling retention-window policy
//! - `reconcile`: new-vs-seen diff against the history store
//! - `run`: the fetch → parse → reconcile → notify orchestrator

pub mod reconcile;
pub mod run;
pub mod window;

pub use reconcile::reconcile;
pub use run::{RunReport, run_monitor};
pub use window::{fallback_timestamp, within_window};
