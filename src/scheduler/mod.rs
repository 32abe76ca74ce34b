//! Periodic job scheduler

pub mod jobs;
pub mod runner;

pub use jobs::{CacheSweepJob, LiveSyncJob, ReferenceSyncJob, ScheduledJob};
pub use runner::{Scheduler, SchedulerStatus};
