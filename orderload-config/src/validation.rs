//! Validation shared by the configuration domains

use crate::error::{ConfigError, ConfigResult};
use std::fmt::Display;

/// A configuration domain that can check itself
pub trait Validatable {
    fn validate(&self) -> ConfigResult<()>;

    /// Name used in error messages, e.g. `load` or `http`
    fn domain_name(&self) -> &'static str;

    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        invalid(self.domain_name(), message)
    }
}

fn invalid(domain: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        domain: domain.to_string(),
        message: message.into(),
    }
}

pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(invalid(domain, format!("{} cannot be empty", field_name)));
    }
    Ok(())
}

pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + Display,
{
    if value <= T::default() {
        return Err(invalid(
            domain,
            format!("{} must be greater than 0, got {}", field_name, value),
        ));
    }
    Ok(())
}

/// The target API is only reachable over plain HTTP(S)
pub fn validate_url(url: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    validate_required_string(url, field_name, domain)?;

    let parsed = url::Url::parse(url)
        .map_err(|e| invalid(domain, format!("{} is not a valid URL: {}", field_name, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(
            domain,
            format!("{} scheme '{}' not supported (only http/https)", field_name, scheme),
        )),
    }
}

/// Inclusive range bounds must not be inverted
pub fn validate_range_order<T>(min: T, max: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Display,
{
    if min > max {
        return Err(invalid(
            domain,
            format!("{}: minimum {} exceeds maximum {}", field_name, min, max),
        ));
    }
    Ok(())
}
