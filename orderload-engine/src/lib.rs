//! Stateful load engine for the order/item lifecycle API
//!
//! The pieces, leaves first:
//!
//! - [`state`]: orders created by earlier requests (and earlier runs), with
//!   their client and item codes, persisted after every change.
//! - [`classify`]: maps endpoint, status and body to success, soft failure
//!   or hard failure.
//! - [`dispatch`]: runs one request, classifies it, updates the store and
//!   triggers the add-item cascade after an order is created.
//! - [`catalog`]: the closed set of workloads and their parameter
//!   resolution from the store or static pools.
//! - [`scheduler`]: fixed-size waves under a global concurrency cap.
//! - [`results`]: counters, latencies, outcome log and the final report.

pub mod catalog;
pub mod classify;
pub mod dispatch;
pub mod error;
pub mod outcome;
pub mod payload;
pub mod results;
pub mod runner;
pub mod scheduler;
pub mod state;

pub use catalog::{
    Resolution, ResolvedRequest, RequestTarget, Resolver, StaticPools, Workload, WorkloadCatalog,
};
pub use classify::{classify, Classification, SoftRejection};
pub use dispatch::Dispatcher;
pub use error::{CatalogError, EngineError, ResultsError, StateError};
pub use outcome::{DispatchError, OutcomeKind, WorkloadOutcome};
pub use results::{OutcomeRecord, ResultsAggregator, RunReport, RunResults};
pub use runner::{LoadRunner, RunSummary};
pub use scheduler::{Scheduler, SchedulerSettings, WaveStats};
pub use state::{EntityStateStore, OrderRecord, StateSnapshot};

/// Server-assigned order number
pub type OrderId = i64;

/// Customer code associated with an order at creation
pub type ClientId = i64;
