//! Target API configuration

use crate::error::ConfigResult;
use crate::validation::{validate_url, Validatable};
use serde::{Deserialize, Serialize};
use url::Url;

/// Location of the API under load
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Base URL, e.g. `http://localhost:5000/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Port applied when the base URL does not carry one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            port: None,
        }
    }
}

impl TargetConfig {
    /// Resolve the base URL, applying `port` when the URL has none.
    ///
    /// A trailing slash is removed so endpoint paths can be appended with
    /// a single `/`.
    pub fn effective_base_url(&self) -> ConfigResult<String> {
        let mut url = Url::parse(&self.base_url)?;
        if let Some(port) = self.port {
            if url.port().is_none() && url.set_port(Some(port)).is_err() {
                return Err(self.validation_error(format!(
                    "cannot apply port {} to base_url {}",
                    port, self.base_url
                )));
            }
        }
        Ok(url.as_str().trim_end_matches('/').to_string())
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_url(&self.base_url, "base_url", self.domain_name())?;
        if self.port == Some(0) {
            return Err(self.validation_error("port must be greater than 0"));
        }
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}
