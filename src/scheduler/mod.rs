//! Drives the reconciler on a fixed cadence.
//!
//! # Timing
//!
//! - One cycle runs immediately at start-up.
//! - The interval timer restarts when a cycle finishes, so cycles never
//!   overlap and a slow cycle delays the next one rather than stacking up.
//! - Each cycle is bounded by `execution_timeout`. A cycle that overruns is
//!   dropped, which cancels its in-flight HTTP calls; the next tick starts
//!   over from a fresh fetch.
//! - Cancelling the shutdown token stops the loop and interrupts an
//!   in-flight cycle.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::effects::DiscordInterpreter;
use crate::persistence::IncidentStore;
use crate::reconciler::{CycleReport, ReconcileError, Reconciler};
use crate::statuspage::StatusSource;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Pause between the end of one cycle and the start of the next.
    pub interval: Duration,

    /// Deadline for a single cycle.
    pub execution_timeout: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            execution_timeout: DEFAULT_EXECUTION_TIMEOUT,
        }
    }
}

/// One unit of scheduled work.
pub trait Cycle {
    fn run_cycle(&self) -> impl Future<Output = Result<CycleReport, ReconcileError>> + Send;
}

impl<Src, D, S> Cycle for Reconciler<Src, D, S>
where
    Src: StatusSource + Sync,
    D: DiscordInterpreter + Sync,
    D::Error: std::fmt::Display,
    S: IncidentStore,
{
    fn run_cycle(&self) -> impl Future<Output = Result<CycleReport, ReconcileError>> + Send {
        self.run_once()
    }
}

pub struct Scheduler<C> {
    cycle: C,
    config: ScheduleConfig,
}

impl<C: Cycle> Scheduler<C> {
    pub fn new(cycle: C, config: ScheduleConfig) -> Self {
        Scheduler { cycle, config }
    }

    /// Runs until `shutdown` is cancelled.
    #[instrument(skip_all, fields(interval = ?self.config.interval, timeout = ?self.config.execution_timeout))]
    pub async fn run(self, shutdown: CancellationToken) {
        info!("Scheduler started");

        loop {
            // Errors are logged inside tick; the loop keeps going.
            let _ = self.tick(&shutdown).await;

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping scheduler");
                    break;
                }
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        info!("Scheduler stopped");
    }

    /// Runs one cycle under the deadline, logging its result.
    pub async fn tick(&self, shutdown: &CancellationToken) -> Result<CycleReport, ReconcileError> {
        let started = Instant::now();
        let timeout = self.config.execution_timeout;

        let result = tokio::select! {
            biased;
            _ = shutdown.cancelled() => Err(ReconcileError::Cancelled),
            outcome = tokio::time::timeout(timeout, self.cycle.run_cycle()) => match outcome {
                Ok(result) => result,
                Err(_) => Err(ReconcileError::DeadlineExceeded(timeout)),
            },
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(report) if report.changed_anything() || report.skipped > 0 => info!(
                fetched = report.fetched,
                created = report.created,
                updated = report.updated,
                resolved = report.resolved,
                unchanged = report.unchanged,
                skipped = report.skipped,
                duration_ms,
                "Cycle completed"
            ),
            Ok(report) => debug!(fetched = report.fetched, duration_ms, "Cycle completed, nothing changed"),
            Err(ReconcileError::Cancelled) => info!(duration_ms, "Cycle interrupted by shutdown"),
            Err(e) => error!(error = %e, duration_ms, "Cycle failed"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A cycle that takes `work` to finish and tracks concurrency.
    #[derive(Default)]
    struct SlowCycle {
        work: Duration,
        runs: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl SlowCycle {
        fn new(work: Duration) -> Arc<Self> {
            Arc::new(SlowCycle {
                work,
                ..Default::default()
            })
        }
    }

    impl Cycle for Arc<SlowCycle> {
        fn run_cycle(&self) -> impl Future<Output = Result<CycleReport, ReconcileError>> + Send {
            let this = Arc::clone(self);
            async move {
                this.runs.fetch_add(1, Ordering::SeqCst);
                let now = this.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                this.max_in_flight.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(this.work).await;
                this.in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(CycleReport::default())
            }
        }
    }

    fn config(interval_ms: u64, timeout_ms: u64) -> ScheduleConfig {
        ScheduleConfig {
            interval: Duration::from_millis(interval_ms),
            execution_timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_immediately_at_start() {
        let cycle = SlowCycle::new(Duration::ZERO);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(
            Scheduler::new(cycle.clone(), config(3_600_000, 1_000)).run(shutdown.clone()),
        );

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(cycle.runs.load(Ordering::SeqCst), 1);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cycles_never_overlap() {
        let cycle = SlowCycle::new(Duration::from_millis(50));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(
            Scheduler::new(cycle.clone(), config(10, 1_000)).run(shutdown.clone()),
        );

        tokio::time::sleep(Duration::from_millis(500)).await;
        shutdown.cancel();
        handle.await.unwrap();

        // Each cycle takes 50ms plus a 10ms pause.
        let runs = cycle.runs.load(Ordering::SeqCst);
        assert!((8..=9).contains(&runs), "runs = {runs}");
        assert_eq!(cycle.max_in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn overrunning_cycle_hits_deadline() {
        let cycle = SlowCycle::new(Duration::from_secs(10));
        let scheduler = Scheduler::new(cycle.clone(), config(10, 1_000));

        let result = scheduler.tick(&CancellationToken::new()).await;

        assert!(matches!(
            result,
            Err(ReconcileError::DeadlineExceeded(d)) if d == Duration::from_secs(1)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_in_flight_cycle() {
        let cycle = SlowCycle::new(Duration::from_secs(600));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(
            Scheduler::new(cycle.clone(), config(10, 3_600_000)).run(shutdown.clone()),
        );

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(cycle.in_flight.load(Ordering::SeqCst), 1);

        shutdown.cancel();
        handle.await.unwrap();
        assert_eq!(cycle.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_cycles_keep_the_loop_running() {
        struct Failing(Arc<AtomicUsize>);

        impl Cycle for Failing {
            fn run_cycle(
                &self,
            ) -> impl Future<Output = Result<CycleReport, ReconcileError>> + Send {
                self.0.fetch_add(1, Ordering::SeqCst);
                async { Err(ReconcileError::Cancelled) }
            }
        }

        let runs = Arc::new(AtomicUsize::new(0));
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(
            Scheduler::new(Failing(runs.clone()), config(100, 1_000)).run(shutdown.clone()),
        );

        tokio::time::sleep(Duration::from_millis(350)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 4);
    }
}
