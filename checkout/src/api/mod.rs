//! Order service API.
//!
//! [`StorefrontApi`] is the seam between checkout logic and the remote order
//! service. [`StorefrontClient`] talks HTTP; `crate::mocks::MockStorefront`
//! scripts responses for tests.

use crate::types::{EventId, Order, OrderId, OrderRequest};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

mod client;
pub mod error;

pub use client::StorefrontClient;
pub use error::{ApiError, ApiErrorDetail};

/// Result of an order service call
pub type ApiResult<T> = Result<T, ApiError>;

/// Boxed future returned by [`StorefrontApi`] methods
pub type ApiFuture<T> = Pin<Box<dyn Future<Output = ApiResult<T>> + Send>>;

/// Body of `POST /promo-codes/validate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCodeCheck {
    /// Event the code would apply to
    pub event_id: EventId,
    /// Code as entered, trimmed
    pub code: String,
}

/// Promo code details returned on successful validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCode {
    /// Discount percentage, expected in `[0, 100)`
    pub discount_percent: f64,
    /// Canonical code, when echoed back
    #[serde(default)]
    pub code: Option<String>,
}

/// Envelope of a successful promo validation response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCodeValidation {
    /// The validated code
    pub promo_code: PromoCode,
}

/// Remote order service
///
/// Returned futures own everything they need, so they can be moved into
/// spawned effects.
pub trait StorefrontApi: Send + Sync {
    /// `GET /orders/{orderId}`
    fn fetch_order(&self, order_id: &OrderId) -> ApiFuture<Order>;

    /// `POST /orders`
    fn create_order(&self, request: OrderRequest) -> ApiFuture<Order>;

    /// `POST /promo-codes/validate`
    fn validate_promo_code(&self, check: PromoCodeCheck) -> ApiFuture<PromoCodeValidation>;
}
