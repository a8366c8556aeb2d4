//! Parsing of the payment processor's return URL.
//!
//! The processor sends the buyer back with the order id (and sometimes its
//! own view of the payment status) in the query string. Only the order id is
//! used; the order service decides the outcome.

use crate::types::OrderId;
use reqwest::Url;

/// Query parameter carrying the order id
pub const ORDER_ID_PARAM: &str = "orderId";

/// Query parameter carrying the processor's status hint
pub const STATUS_PARAM: &str = "status";

/// What the buyer's return URL told us
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentReturn {
    /// Order id, if present and not blank
    pub order_id: Option<OrderId>,
    /// Processor status hint, informational only
    pub status_hint: Option<String>,
}

impl PaymentReturn {
    /// Parse an absolute return URL or a bare query string (`?orderId=...`)
    #[must_use]
    pub fn from_url(raw: &str) -> Self {
        let raw = raw.trim();
        let url = Url::parse(raw).or_else(|_| {
            Url::parse(&format!(
                "http://return.invalid/?{}",
                raw.trim_start_matches('?')
            ))
        });

        let Ok(url) = url else {
            tracing::debug!(raw, "Unparseable payment return URL");
            return Self::default();
        };

        let mut parsed = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                ORDER_ID_PARAM if parsed.order_id.is_none() => {
                    parsed.order_id = OrderId::parse(&value).ok();
                    if parsed.order_id.is_none() {
                        tracing::warn!("Payment return carried a blank order id");
                    }
                },
                STATUS_PARAM => parsed.status_hint = Some(value.into_owned()),
                _ => {},
            }
        }

        if let Some(hint) = &parsed.status_hint {
            tracing::debug!(status_hint = %hint, "Ignoring processor status hint; order service decides");
        }

        parsed
    }
}
