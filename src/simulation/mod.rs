//! Simulated live matches
//!
//! `scoring` is the per-point state machine, `analytics` the derived metrics,
//! and `engine` the ticking producer that drives both.

pub mod analytics;
pub mod engine;
pub mod scoring;

pub use engine::SimulationEngine;
pub use scoring::{award_point, play_point, PointImportance, PointOutcome};
