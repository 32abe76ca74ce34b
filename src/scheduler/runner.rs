use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::jobs::ScheduledJob;
use crate::config::SchedulerConfig;
use crate::coordination::{Shutdown, ShutdownToken};

/// Snapshot returned by [`Scheduler::status`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    pub running: bool,
    pub interval: Duration,
}

#[derive(Default)]
struct SchedulerState {
    running: bool,
    shutdown: Option<Shutdown>,
    handle: Option<JoinHandle<()>>,
}

impl SchedulerState {
    /// The loop also ends on its own when the parent shutdown fires
    fn is_active(&self) -> bool {
        self.running && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

/// Runs a fixed set of jobs every interval.
///
/// Idle -> `start` -> Running -> `stop` -> Idle. Each cycle runs every job
/// concurrently under a timeout a little shorter than the interval.
pub struct Scheduler {
    jobs: Arc<Vec<Arc<dyn ScheduledJob>>>,
    interval: Duration,
    cycle_timeout: Duration,
    parent: Option<ShutdownToken>,
    state: Mutex<SchedulerState>,
}

impl Scheduler {
    pub fn new(jobs: Vec<Arc<dyn ScheduledJob>>, interval: Duration, cycle_timeout: Duration) -> Self {
        Self {
            jobs: Arc::new(jobs),
            interval,
            cycle_timeout,
            parent: None,
            state: Mutex::new(SchedulerState::default()),
        }
    }

    pub fn from_config(jobs: Vec<Arc<dyn ScheduledJob>>, config: &SchedulerConfig) -> Self {
        Self::new(jobs, config.interval(), config.cycle_timeout())
    }

    /// Also stop when the process-wide shutdown fires
    pub fn with_shutdown(mut self, parent: ShutdownToken) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Begin cycling; the first cycle runs immediately. No-op while running.
    pub async fn start(&self) {
        let mut state = self.state.lock().await;
        if state.is_active() {
            debug!("Scheduler already running");
            return;
        }

        let shutdown = match &self.parent {
            Some(parent) => Shutdown::child_of(parent),
            None => Shutdown::new(),
        };
        let token = shutdown.token();
        let jobs = self.jobs.clone();
        let every = self.interval;
        let cycle_timeout = self.cycle_timeout;

        let handle = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                run_cycle(&jobs, cycle_timeout, &token).await;
            }
            debug!("Scheduler loop exited");
        });

        state.running = true;
        state.shutdown = Some(shutdown);
        state.handle = Some(handle);
        info!(
            interval_secs = every.as_secs(),
            jobs = self.jobs.len(),
            "Scheduler started"
        );
    }

    /// Cancel the loop and wait for an in-flight cycle to drain.
    /// No job runs after this returns.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        if !state.running {
            return;
        }

        if let Some(shutdown) = state.shutdown.take() {
            shutdown.request_shutdown();
        }
        if let Some(handle) = state.handle.take() {
            if let Err(e) = handle.await {
                error!(error = %e, "Scheduler loop panicked");
            }
        }
        state.running = false;
        info!("Scheduler stopped");
    }

    pub async fn status(&self) -> SchedulerStatus {
        let state = self.state.lock().await;
        SchedulerStatus {
            running: state.is_active(),
            interval: self.interval,
        }
    }
}

/// One cycle: every job in its own task, all bounded by `cycle_timeout`
async fn run_cycle(jobs: &[Arc<dyn ScheduledJob>], cycle_timeout: Duration, token: &ShutdownToken) {
    let mut tasks = JoinSet::new();
    for job in jobs {
        let job = job.clone();
        let token = token.clone();
        tasks.spawn(async move {
            let result = job.run(token).await;
            (job.name().to_string(), result)
        });
    }

    let drain = async {
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, Ok(()))) => debug!(job = %name, "Job completed"),
                Ok((name, Err(e))) => warn!(job = %name, error = %e, "Job failed"),
                Err(e) => error!(error = %e, "Job task panicked"),
            }
        }
    };

    if timeout(cycle_timeout, drain).await.is_err() {
        warn!(
            timeout_ms = cycle_timeout.as_millis() as u64,
            "Cycle timed out, aborting remaining jobs"
        );
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HardcourtError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ScheduledJob for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        async fn run(&self, _token: ShutdownToken) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl ScheduledJob for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn run(&self, _token: ShutdownToken) -> Result<()> {
            Err(HardcourtError::job_failure("failing", "boom"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent_and_runs_immediately() {
        let runs = Arc::new(AtomicUsize::new(0));
        let scheduler = Scheduler::new(
            vec![Arc::new(Counting { runs: runs.clone() })],
            Duration::from_secs(60),
            Duration::from_secs(55),
        );

        scheduler.start().await;
        scheduler.start().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        let status = scheduler.status().await;
        assert!(status.running);
        assert_eq!(status.interval, Duration::from_secs(60));

        scheduler.stop().await;
        assert!(!scheduler.status().await.running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_job_does_not_affect_siblings() {
        let runs = Arc::new(AtomicUsize::new(0));
        let jobs: Vec<Arc<dyn ScheduledJob>> = vec![
            Arc::new(Failing),
            Arc::new(Counting { runs: runs.clone() }),
        ];
        let scheduler = Scheduler::new(jobs, Duration::from_secs(10), Duration::from_secs(9));

        scheduler.start().await;
        tokio::time::sleep(Duration::from_secs(25)).await;
        scheduler.stop().await;

        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_reports_idle_after_process_shutdown() {
        let process = Shutdown::new();
        let scheduler = Scheduler::new(Vec::new(), Duration::from_secs(60), Duration::from_secs(55))
            .with_shutdown(process.token());

        scheduler.start().await;
        assert!(scheduler.status().await.running);

        process.request_shutdown();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!scheduler.status().await.running);

        scheduler.stop().await;
        assert!(!scheduler.status().await.running);
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let scheduler = Scheduler::new(Vec::new(), Duration::from_secs(1), Duration::from_millis(900));
        scheduler.stop().await;
        assert!(!scheduler.status().await.running);
    }
}
