//! Add-item cascade configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, validate_range_order, Validatable};
use serde::{Deserialize, Serialize};

/// Number of add-item calls issued right after an order is created.
///
/// The actual count is drawn uniformly from `min_items..=max_items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    #[serde(default = "default_min_items")]
    pub min_items: usize,

    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            min_items: default_min_items(),
            max_items: default_max_items(),
        }
    }
}

impl Validatable for CascadeConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.min_items, "min_items", self.domain_name())?;
        validate_range_order(self.min_items, self.max_items, "items", self.domain_name())
    }

    fn domain_name(&self) -> &'static str {
        "cascade"
    }
}

fn default_min_items() -> usize {
    1
}

fn default_max_items() -> usize {
    5
}
