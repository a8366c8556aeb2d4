//! Configuration management for checkout
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::confirmation::PollTiming;
use crate::types::OrderId;
use reqwest::Url;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A URL variable does not hold an absolute URL
    #[error("{key} is not a valid URL ({value:?}): {reason}")]
    InvalidUrl {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
        /// Parser message
        reason: String,
    },

    /// A numeric variable does not hold a positive integer
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },
}

/// Complete checkout configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Order service and payment processor endpoints
    pub api: ApiConfig,
    /// Confirmation polling timing
    pub confirmation: PollTiming,
}

/// Remote endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Order service base URL
    pub base_url: String,
    /// Payment processor entry point the buyer is redirected to
    pub payment_url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            payment_url: "http://localhost:8080/pay".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset variables take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a present value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let base_url = url_var(&lookup, "STOREFRONT_API_URL")?.unwrap_or(defaults.api.base_url);
        let payment_url =
            url_var(&lookup, "STOREFRONT_PAYMENT_URL")?.unwrap_or(defaults.api.payment_url);
        let request_timeout = number_var(&lookup, "STOREFRONT_REQUEST_TIMEOUT_SECS")?
            .map_or(defaults.api.request_timeout, Duration::from_secs);
        let interval = number_var(&lookup, "CONFIRMATION_POLL_INTERVAL_MS")?
            .map_or(defaults.confirmation.interval, Duration::from_millis);
        let deadline = number_var(&lookup, "CONFIRMATION_DEADLINE_MS")?
            .map_or(defaults.confirmation.deadline, Duration::from_millis);

        Ok(Self {
            api: ApiConfig {
                base_url,
                payment_url,
                request_timeout,
            },
            confirmation: PollTiming { interval, deadline },
        })
    }

    /// Where to send the buyer after an order is created
    ///
    /// The order id travels as the `orderId` query parameter and comes back on
    /// the return URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if the payment URL does not parse.
    pub fn payment_redirect_url(&self, order_id: &OrderId) -> Result<Url, ConfigError> {
        let mut url = parse_url("STOREFRONT_PAYMENT_URL", &self.api.payment_url)?;
        url.query_pairs_mut()
            .append_pair("orderId", order_id.as_str());
        Ok(url)
    }
}

fn parse_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn url_var(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<String>, ConfigError> {
    lookup(key)
        .map(|value| {
            let value = value.trim().to_string();
            parse_url(key, &value).map(|_| value)
        })
        .transpose()
}

fn number_var(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<u64>, ConfigError> {
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidNumber { key, value })
        })
        .transpose()
}
