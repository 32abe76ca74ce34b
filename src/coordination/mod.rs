//! Process coordination
//!
//! Cancellation plumbing shared by every long-running task.

pub mod shutdown;

pub use shutdown::{install_signal_handlers, Shutdown, ShutdownToken};
