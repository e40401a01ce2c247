//! Load shape configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How much traffic to generate and for how long
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Upper bound on requests in flight at any moment
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Wall-clock budget, checked between waves
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_duration"
    )]
    pub duration: Duration,

    /// Workload instances sampled per wave
    #[serde(default = "default_simulated_users")]
    pub simulated_users: usize,

    /// Sleep between two waves
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_pause_between_waves"
    )]
    pub pause_between_waves: Duration,

    /// Workload names to sample from; empty means every workload
    #[serde(default)]
    pub workloads: Vec<String>,

    /// Let read-only workloads target pre-existing orders on the API when
    /// no order has been created yet. Off: they are skipped instead.
    #[serde(default)]
    pub static_order_fallback: bool,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent_requests(),
            duration: default_duration(),
            simulated_users: default_simulated_users(),
            pause_between_waves: default_pause_between_waves(),
            workloads: Vec::new(),
            static_order_fallback: false,
        }
    }
}

impl Validatable for LoadConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.max_concurrent_requests,
            "max_concurrent_requests",
            self.domain_name(),
        )?;
        if self.duration.is_zero() {
            return Err(self.validation_error("duration must be greater than 0"));
        }
        validate_positive(self.simulated_users, "simulated_users", self.domain_name())?;

        for name in &self.workloads {
            validate_required_string(name, "workloads[]", self.domain_name())?;
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "load"
    }
}

fn default_max_concurrent_requests() -> usize {
    10
}

fn default_duration() -> Duration {
    Duration::from_secs(60)
}

fn default_simulated_users() -> usize {
    20
}

fn default_pause_between_waves() -> Duration {
    Duration::from_secs(1)
}
