//! Runtime settings read from the environment.
//!
//! - `ECOMMERCE_CASCADE_DEPTH_LIMIT`: nested dispatch limit (default 64)
//! - `ECOMMERCE_ORDER_NUMBER_PREFIX`: prefix of generated order numbers
//!   (default `ORD`)

use ecommerce_events::{ConfigurationError, DEFAULT_CASCADE_DEPTH_LIMIT};

pub const CASCADE_DEPTH_LIMIT_ENV: &str = "ECOMMERCE_CASCADE_DEPTH_LIMIT";
pub const ORDER_NUMBER_PREFIX_ENV: &str = "ECOMMERCE_ORDER_NUMBER_PREFIX";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub cascade_depth_limit: usize,
    pub order_number_prefix: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cascade_depth_limit: DEFAULT_CASCADE_DEPTH_LIMIT,
            order_number_prefix: "ORD".to_string(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset variables take their default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigurationError> {
        let defaults = Self::default();

        let cascade_depth_limit = match lookup(CASCADE_DEPTH_LIMIT_ENV) {
            Some(raw) => parse_depth_limit(&raw)?,
            None => defaults.cascade_depth_limit,
        };

        let order_number_prefix = lookup(ORDER_NUMBER_PREFIX_ENV)
            .map(|p| p.trim().to_string())
            .unwrap_or_else(|| defaults.order_number_prefix.clone());
        if order_number_prefix.is_empty() {
            return Err(ConfigurationError::InvalidSetting {
                name: ORDER_NUMBER_PREFIX_ENV,
                reason: "must not be empty".to_string(),
            });
        }

        Ok(Self {
            cascade_depth_limit,
            order_number_prefix,
        })
    }
}

fn parse_depth_limit(raw: &str) -> Result<usize, ConfigurationError> {
    let invalid = |reason: String| ConfigurationError::InvalidSetting {
        name: CASCADE_DEPTH_LIMIT_ENV,
        reason,
    };
    let limit: usize = raw
        .trim()
        .parse()
        .map_err(|e| invalid(format!("{raw:?} is not a positive integer: {e}")))?;
    if limit == 0 {
        return Err(invalid("must be at least 1".to_string()));
    }
    Ok(limit)
}
