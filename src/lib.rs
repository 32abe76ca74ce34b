pub mod adapters;
pub mod aggregator;
pub mod api;
pub mod broadcast;
pub mod cli;
pub mod config;
pub mod coordination;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod scheduler;
pub mod service;
pub mod simulation;

pub use aggregator::Aggregator;
pub use broadcast::{Hub, HubHandle};
pub use config::AppConfig;
pub use coordination::{Shutdown, ShutdownToken};
pub use error::{HardcourtError, Result};
pub use persistence::{MatchStore, MemoryStore};
pub use scheduler::Scheduler;
pub use simulation::SimulationEngine;
