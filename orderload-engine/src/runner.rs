//! Wiring of a complete load run from configuration

use crate::catalog::{Resolver, StaticPools, WorkloadCatalog};
use crate::dispatch::Dispatcher;
use crate::error::{EngineError, ResultsError};
use crate::results::{ResultsAggregator, RunReport};
use crate::scheduler::{Scheduler, SchedulerSettings, WaveStats};
use crate::state::EntityStateStore;
use orderload_config::OrderloadConfig;
use orderload_http::{ApiClient, ApiTransport, HttpConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Everything a finished run produced
#[derive(Debug)]
pub struct RunSummary {
    pub stats: WaveStats,
    pub report: RunReport,
    /// Where the results snapshot went, or why it could not be written
    pub results_file: Result<PathBuf, ResultsError>,
}

impl RunSummary {
    /// Path of the results snapshot; a write failure becomes the run's error
    pub fn into_results_path(self) -> Result<PathBuf, EngineError> {
        Ok(self.results_file?)
    }
}

/// One configured load run
pub struct LoadRunner {
    scheduler: Scheduler,
    store: Arc<EntityStateStore>,
    results: Arc<ResultsAggregator>,
    results_dir: PathBuf,
}

impl LoadRunner {
    /// Build a runner talking to the configured API over HTTP
    pub async fn connect(config: &OrderloadConfig) -> Result<Self, EngineError> {
        let base_url = config.target.effective_base_url()?;
        let client = ApiClient::new(base_url, &HttpConfig::from(config.http.clone()))?;
        Self::from_config(config, Arc::new(client)).await
    }

    /// Build a runner over any transport.
    ///
    /// Fails before anything is sent when the configuration is invalid, the
    /// product codes cannot be loaded or the workload mix is empty. Missing
    /// or unreadable state only means starting from scratch.
    pub async fn from_config(
        config: &OrderloadConfig,
        transport: Arc<dyn ApiTransport>,
    ) -> Result<Self, EngineError> {
        config.validate_all()?;

        let pools = StaticPools::load(&config.storage.product_codes_path).await?;
        let catalog = WorkloadCatalog::from_names(&config.load.workloads)?;
        let store = Arc::new(EntityStateStore::open(&config.storage.state_dir).await);

        let results = Arc::new(ResultsAggregator::new());
        let resolver = Arc::new(
            Resolver::new(pools, Arc::clone(&store))
                .with_static_order_fallback(config.load.static_order_fallback),
        );
        let dispatcher = Arc::new(Dispatcher::new(
            transport,
            Arc::clone(&store),
            Arc::clone(&results),
            Arc::clone(&resolver),
            config.cascade.clone(),
        ));
        let scheduler = Scheduler::new(
            SchedulerSettings::from(&config.load),
            catalog,
            resolver,
            dispatcher,
        );

        Ok(Self {
            scheduler,
            store,
            results,
            results_dir: config.storage.results_dir.clone(),
        })
    }

    pub fn store(&self) -> &Arc<EntityStateStore> {
        &self.store
    }

    pub fn results(&self) -> &Arc<ResultsAggregator> {
        &self.results
    }

    /// Run every wave, then write the results snapshot
    pub async fn run(&self) -> RunSummary {
        let settings = self.scheduler.settings();
        info!(
            "Starting load run: {} instances per wave, at most {} concurrent requests, {}s budget",
            settings.wave_size,
            settings.max_concurrent_requests,
            settings.duration.as_secs()
        );

        let stats = self.scheduler.run().await;
        let report = self.results.report();

        let results_file = self.results.persist(&self.results_dir).await;
        match &results_file {
            Ok(path) => info!("Results written to {}", path.display()),
            Err(e) => error!("{}", e),
        }

        RunSummary {
            stats,
            report,
            results_file,
        }
    }
}
