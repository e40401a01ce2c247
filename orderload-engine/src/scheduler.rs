//! Wave scheduler
//!
//! Every wave samples a fixed number of workload instances, dispatches the
//! resolvable ones concurrently and waits for all of them before the next
//! wave begins. One semaphore bounds in-flight dispatches for the whole run.

use crate::catalog::{Resolution, Resolver, WorkloadCatalog};
use crate::dispatch::Dispatcher;
use orderload_config::LoadConfig;
use std::ops::AddAssign;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Workload instances sampled per wave
    pub wave_size: usize,
    pub max_concurrent_requests: usize,
    /// Wall-clock budget, checked between waves only
    pub duration: Duration,
    pub pause_between_waves: Duration,
}

impl From<&LoadConfig> for SchedulerSettings {
    fn from(config: &LoadConfig) -> Self {
        Self {
            wave_size: config.simulated_users,
            max_concurrent_requests: config.max_concurrent_requests,
            duration: config.duration,
            pause_between_waves: config.pause_between_waves,
        }
    }
}

/// Counts for one wave, or summed over a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WaveStats {
    pub waves: usize,
    /// Triggering requests sent; cascade calls are not counted here
    pub dispatched: usize,
    pub skipped: usize,
    pub succeeded: usize,
}

impl AddAssign for WaveStats {
    fn add_assign(&mut self, other: Self) {
        self.waves += other.waves;
        self.dispatched += other.dispatched;
        self.skipped += other.skipped;
        self.succeeded += other.succeeded;
    }
}

pub struct Scheduler {
    settings: SchedulerSettings,
    catalog: WorkloadCatalog,
    resolver: Arc<Resolver>,
    dispatcher: Arc<Dispatcher>,
    permits: Arc<Semaphore>,
}

impl Scheduler {
    pub fn new(
        settings: SchedulerSettings,
        catalog: WorkloadCatalog,
        resolver: Arc<Resolver>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(settings.max_concurrent_requests.max(1)));
        Self {
            settings,
            catalog,
            resolver,
            dispatcher,
            permits,
        }
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Run waves until the duration budget is spent
    pub async fn run(&self) -> WaveStats {
        let started = Instant::now();
        let mut totals = WaveStats::default();

        while started.elapsed() < self.settings.duration {
            info!(
                "Starting wave {} ({} instances, {:.0}s elapsed)",
                totals.waves + 1,
                self.settings.wave_size,
                started.elapsed().as_secs_f64()
            );
            totals += self.run_wave().await;

            if started.elapsed() >= self.settings.duration {
                break;
            }
            if !self.settings.pause_between_waves.is_zero() {
                tokio::time::sleep(self.settings.pause_between_waves).await;
            }
        }

        info!(
            "Load run finished after {} waves: {} dispatched, {} skipped",
            totals.waves, totals.dispatched, totals.skipped
        );
        totals
    }

    /// Sample, resolve and dispatch one wave, returning once every task has finished
    pub async fn run_wave(&self) -> WaveStats {
        let mut stats = WaveStats {
            waves: 1,
            ..WaveStats::default()
        };
        let mut tasks = JoinSet::new();

        for workload in self.catalog.sample(self.settings.wave_size) {
            let request = match self.resolver.resolve(workload).await {
                Resolution::Ready(request) => request,
                Resolution::Skip { workload, reason } => {
                    debug!("Skipping {}: {}", workload, reason);
                    stats.skipped += 1;
                    continue;
                }
            };

            let permits = Arc::clone(&self.permits);
            let dispatcher = Arc::clone(&self.dispatcher);
            stats.dispatched += 1;

            tasks.spawn(async move {
                // The permit covers the request and any cascade it triggers
                let _permit = permits.acquire_owned().await.ok()?;
                let (outcome, _elapsed) = dispatcher.dispatch(request).await;
                Some(outcome.counts_as_success())
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(true)) => stats.succeeded += 1,
                Ok(_) => {}
                Err(e) => error!("Dispatch task failed: {}", e),
            }
        }

        stats
    }
}
