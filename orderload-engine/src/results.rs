//! Run results aggregation and the final snapshot

use crate::catalog::Workload;
use crate::error::ResultsError;
use crate::outcome::{OutcomeKind, WorkloadOutcome};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// One classified dispatch, as stored in the snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub timestamp: DateTime<Utc>,
    pub workload: Workload,
    pub method: String,
    pub path: String,
    pub kind: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
    pub elapsed_ms: f64,
}

/// Raw accumulated results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResults {
    pub successes: u64,
    pub errors: u64,
    /// Response times in seconds, in completion order
    pub response_times: Vec<f64>,
    pub outcomes: Vec<OutcomeRecord>,
}

/// Aggregate figures printed at the end of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub total_requests: u64,
    pub successes: u64,
    pub errors: u64,
    /// Mean response time in seconds, 0 when nothing completed
    pub mean_response_time: f64,
    /// Percentage, 0 when nothing was sent
    pub success_rate: f64,
}

impl RunReport {
    pub fn from_results(results: &RunResults) -> Self {
        let total = results.successes + results.errors;
        Self {
            total_requests: total,
            successes: results.successes,
            errors: results.errors,
            mean_response_time: mean(&results.response_times),
            success_rate: success_rate(results.successes, total),
        }
    }

    pub fn success_rate_display(&self) -> String {
        format!("{:.2}%", self.success_rate)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Load test results ===")?;
        writeln!(f, "Total requests: {}", self.total_requests)?;
        writeln!(f, "Successes: {}", self.successes)?;
        writeln!(f, "Errors: {}", self.errors)?;
        writeln!(f, "Mean response time: {:.2} seconds", self.mean_response_time)?;
        write!(f, "Success rate: {}", self.success_rate_display())
    }
}

/// Successes over total, as a percentage; 0 for an empty run
pub fn success_rate(successes: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        successes as f64 / total as f64 * 100.0
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[derive(Serialize)]
struct ResultsFile<'a> {
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    report: &'a RunReport,
    results: &'a RunResults,
}

/// Thread-safe accumulator shared by every in-flight request
#[derive(Debug)]
pub struct ResultsAggregator {
    results: Mutex<RunResults>,
    started_at: DateTime<Utc>,
}

impl Default for ResultsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultsAggregator {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(RunResults::default()),
            started_at: Utc::now(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Record one dispatch
    pub fn record(
        &self,
        workload: Workload,
        request: &orderload_http::ApiRequest,
        outcome: &WorkloadOutcome,
        status: Option<u16>,
        elapsed: Duration,
    ) {
        let record = OutcomeRecord {
            timestamp: Utc::now(),
            workload,
            method: request.method.to_string(),
            path: request.path.clone(),
            kind: outcome.kind(),
            status,
            message: outcome.message(),
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
        };

        let mut results = self.results.lock();
        if outcome.counts_as_success() {
            results.successes += 1;
        } else {
            results.errors += 1;
        }
        results.response_times.push(elapsed.as_secs_f64());
        results.outcomes.push(record);
    }

    pub fn snapshot(&self) -> RunResults {
        self.results.lock().clone()
    }

    pub fn report(&self) -> RunReport {
        RunReport::from_results(&self.results.lock())
    }

    /// Write `run_results_<timestamp>.json` into `dir` and return its path.
    /// An existing file is never overwritten: the name gets a `_<n>` suffix.
    pub async fn persist(&self, dir: &Path) -> Result<PathBuf, ResultsError> {
        let finished_at = Utc::now();
        let results = self.snapshot();
        let report = RunReport::from_results(&results);
        let file = ResultsFile {
            started_at: self.started_at,
            finished_at,
            report: &report,
            results: &results,
        };
        let content = serde_json::to_vec_pretty(&file)?;

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| ResultsError::Io {
                path: dir.to_path_buf(),
                source,
            })?;

        let stamp = self.started_at.format("%Y%m%d_%H%M%S").to_string();
        let mut attempt = 0u32;
        loop {
            let name = match attempt {
                0 => format!("run_results_{}.json", stamp),
                n => format!("run_results_{}_{}.json", stamp, n),
            };
            let path = dir.join(name);
            match write_new(&path, &content).await {
                Ok(()) => return Ok(path),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
                Err(source) => return Err(ResultsError::Io { path, source }),
            }
        }
    }
}

/// Write `content` to `path`, failing if the file already exists
async fn write_new(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(content).await?;
    file.flush().await
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::DispatchError;
    use orderload_http::{ApiRequest, HttpMethod};

    fn request() -> ApiRequest {
        ApiRequest::new(HttpMethod::Get, "/Pedido/totalPedido/1")
    }

    fn ok() -> WorkloadOutcome {
        WorkloadOutcome::Success {
            message: "ok".to_string(),
        }
    }

    fn failed() -> WorkloadOutcome {
        WorkloadOutcome::HardFailure(DispatchError::Protocol {
            status: 500,
            body: String::new(),
        })
    }

    #[test]
    fn test_success_rate_seventy_percent() {
        let aggregator = ResultsAggregator::new();
        for _ in 0..7 {
            aggregator.record(Workload::OrderTotal, &request(), &ok(), Some(200), Duration::from_millis(100));
        }
        for _ in 0..3 {
            aggregator.record(Workload::OrderTotal, &request(), &failed(), Some(500), Duration::from_millis(300));
        }

        let report = aggregator.report();
        assert_eq!(report.total_requests, 10);
        assert_eq!(report.success_rate_display(), "70.00%");
        assert!((report.mean_response_time - 0.16).abs() < 1e-9);
    }

    #[test]
    fn test_empty_run_reports_zero() {
        let report = ResultsAggregator::new().report();
        assert_eq!(report.total_requests, 0);
        assert_eq!(report.mean_response_time, 0.0);
        assert_eq!(report.success_rate, 0.0);
        assert_eq!(report.success_rate_display(), "0.00%");
    }

    #[test]
    fn test_soft_failures_count_as_successes() {
        let aggregator = ResultsAggregator::new();
        let soft = WorkloadOutcome::SoftFailure {
            reason: "order cannot be printed".to_string(),
        };
        aggregator.record(Workload::PrintOrder, &request(), &soft, Some(500), Duration::ZERO);

        let results = aggregator.snapshot();
        assert_eq!(results.successes, 1);
        assert_eq!(results.errors, 0);
        assert_eq!(results.outcomes[0].kind, OutcomeKind::SoftFailure);
        assert_eq!(results.outcomes[0].message, "order cannot be printed");
    }

    #[tokio::test]
    async fn test_persist_writes_timestamped_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let aggregator = ResultsAggregator::new();
        aggregator.record(Workload::OrderTotal, &request(), &ok(), Some(200), Duration::from_millis(5));

        let path = aggregator.persist(&dir.path().join("results")).await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("run_results_"));
        assert!(name.ends_with(".json"));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["report"]["total_requests"], 1);
        assert_eq!(written["results"]["outcomes"][0]["workload"], "order_total");
    }

    #[tokio::test]
    async fn test_persist_never_overwrites_a_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let aggregator = ResultsAggregator::new();
        aggregator.record(Workload::OrderTotal, &request(), &ok(), Some(200), Duration::ZERO);

        let first = aggregator.persist(dir.path()).await.unwrap();
        let second = aggregator.persist(dir.path()).await.unwrap();
        let third = aggregator.persist(dir.path()).await.unwrap();

        assert_ne!(first, second);
        assert_ne!(second, third);
        let stem = first.file_stem().unwrap().to_string_lossy().to_string();
        assert_eq!(
            second.file_name().unwrap().to_string_lossy(),
            format!("{}_1.json", stem)
        );
        assert_eq!(
            third.file_name().unwrap().to_string_lossy(),
            format!("{}_2.json", stem)
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
    }
}
