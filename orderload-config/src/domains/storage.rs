//! Storage locations: persisted entity state, run results, static data

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the entity state snapshot files
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    /// Directory receiving one results snapshot per run
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Product codes, one per line
    #[serde(default = "default_product_codes_path")]
    pub product_codes_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            results_dir: default_results_dir(),
            product_codes_path: default_product_codes_path(),
        }
    }
}

impl Validatable for StorageConfig {
    fn validate(&self) -> ConfigResult<()> {
        for (field, path) in [
            ("state_dir", &self.state_dir),
            ("results_dir", &self.results_dir),
            ("product_codes_path", &self.product_codes_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(self.validation_error(format!("{} cannot be empty", field)));
            }
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "storage"
    }
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("state")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_product_codes_path() -> PathBuf {
    PathBuf::from("codigos_produto.txt")
}
