//! Order submission.

use crate::api::{ApiError, StorefrontApi};
use crate::cart::CartPricingEngine;
use crate::error::{SubmitError, SubmitFailure};
use crate::types::{EventId, OrderId, OrderRequest, OrderRequestItem, PaymentMethod};
use std::sync::Arc;

impl OrderRequest {
    /// Build a request from the cart's positive-quantity lines
    ///
    /// A blank promo code is omitted. Returns `None` for an empty cart.
    #[must_use]
    pub fn from_cart(
        cart: &CartPricingEngine,
        event_id: &EventId,
        payment_method: PaymentMethod,
        promo_code: Option<&str>,
    ) -> Option<Self> {
        let items: Vec<OrderRequestItem> = cart
            .lines()
            .into_iter()
            .map(|line| OrderRequestItem {
                type_id: line.ticket_type_id,
                quantity: line.quantity,
                ticket_title: line.ticket_title,
            })
            .collect();

        if items.is_empty() {
            return None;
        }

        Some(Self {
            event_id: event_id.clone(),
            payment_method,
            items,
            promo_code: promo_code
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_string),
        })
    }
}

impl From<ApiError> for SubmitError {
    fn from(error: ApiError) -> Self {
        let reason = if error.is_client_rejection() {
            SubmitFailure::Rejected
        } else {
            SubmitFailure::ServiceUnavailable
        };
        Self::new(reason, error.messages())
    }
}

/// Turns a cart into a remote order
#[derive(Clone)]
pub struct OrderSubmitter {
    api: Arc<dyn StorefrontApi>,
}

impl OrderSubmitter {
    /// Create a submitter backed by `api`
    #[must_use]
    pub fn new(api: Arc<dyn StorefrontApi>) -> Self {
        Self { api }
    }

    /// Submit the cart as an order and return the new order's id
    ///
    /// The server's total is authoritative; a difference from the cart's
    /// advisory total is logged, not treated as an error.
    ///
    /// # Errors
    ///
    /// - [`SubmitFailure::EmptyCart`] if nothing is selected (no remote call)
    /// - [`SubmitFailure::Rejected`] if the service refuses the order
    /// - [`SubmitFailure::ServiceUnavailable`] for transport or server failures
    #[tracing::instrument(skip(self, cart, payment_method, promo_code), fields(event_id = %event_id))]
    pub async fn submit(
        &self,
        cart: &CartPricingEngine,
        event_id: &EventId,
        payment_method: PaymentMethod,
        promo_code: Option<&str>,
    ) -> Result<OrderId, SubmitError> {
        let Some(request) = OrderRequest::from_cart(cart, event_id, payment_method, promo_code)
        else {
            tracing::debug!("Refusing to submit an empty cart");
            return Err(SubmitError::empty_cart());
        };

        tracing::info!(
            items = request.items.len(),
            has_promo = request.promo_code.is_some(),
            "Submitting order"
        );

        let order = self.api.create_order(request).await.map_err(|error| {
            tracing::warn!(%error, "Order submission failed");
            SubmitError::from(error)
        })?;

        let advisory = cart.cart_total();
        if order.total_amount != advisory {
            tracing::warn!(
                order_id = %order.id,
                server_total = %order.total_amount,
                cart_total = %advisory,
                "Server total differs from cart total"
            );
        }

        tracing::info!(order_id = %order.id, total = %order.total_amount, "Order created");
        Ok(order.id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::ApiErrorDetail;
    use crate::mocks::MockStorefront;
    use crate::types::{Money, TicketType, TicketTypeId};

    fn cart_with(quantity: i64) -> (CartPricingEngine, TicketTypeId) {
        let ticket = TicketType {
            id: TicketTypeId::new(),
            name: "General".to_string(),
            unit_price: Money::from_dollars(25),
            available_count: 10,
        };
        let id = ticket.id.clone();
        let mut cart = CartPricingEngine::new([ticket]);
        cart.set_quantity(&id, quantity);
        (cart, id)
    }

    #[test]
    fn test_request_omits_blank_promo_and_empty_lines() {
        let (cart, id) = cart_with(2);

        let request =
            OrderRequest::from_cart(&cart, &EventId::new(), PaymentMethod::new("CARD"), Some("  "))
                .unwrap();

        assert_eq!(request.promo_code, None);
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].type_id, id);
        assert_eq!(request.items[0].ticket_title, "General");
    }

    #[tokio::test]
    async fn test_empty_cart_makes_no_call() {
        let api = MockStorefront::new().shared();
        let submitter = OrderSubmitter::new(api.clone());
        let (cart, _) = cart_with(0);

        let error = submitter
            .submit(&cart, &EventId::new(), PaymentMethod::new("CARD"), None)
            .await
            .unwrap_err();

        assert_eq!(error.reason, SubmitFailure::EmptyCart);
        assert!(api.created_orders().is_empty());
    }

    #[test]
    fn test_api_errors_map_to_failures() {
        let rejected = SubmitError::from(ApiError::Rejected {
            status: 409,
            errors: vec![ApiErrorDetail::message("Sold out")],
        });
        assert_eq!(rejected.reason, SubmitFailure::Rejected);
        assert_eq!(rejected.messages, vec!["Sold out"]);

        let unavailable = SubmitError::from(ApiError::Rejected {
            status: 503,
            errors: vec![ApiErrorDetail::message("HTTP 503")],
        });
        assert_eq!(unavailable.reason, SubmitFailure::ServiceUnavailable);

        let transport = SubmitError::from(ApiError::RequestFailed("timed out".to_string()));
        assert_eq!(transport.reason, SubmitFailure::ServiceUnavailable);
    }
}
