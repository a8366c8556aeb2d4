//! Promo code validation.

use crate::api::{ApiError, PromoCodeCheck, StorefrontApi};
use crate::cart::{CartPricingEngine, DiscountFraction};
use crate::error::PromoError;
use crate::types::EventId;
use std::sync::Arc;

/// Error code for an unknown promo code
pub const PROMO_CODE_NOT_FOUND: &str = "PROMO_CODE_NOT_FOUND";

/// Error code for a code that exists but does not cover the event
pub const PROMO_CODE_NOT_APPLICABLE: &str = "PROMO_CODE_NOT_APPLICABLE";

/// Asks the order service whether a promo code applies to an event
#[derive(Clone)]
pub struct PromoCodeValidator {
    api: Arc<dyn StorefrontApi>,
}

impl PromoCodeValidator {
    /// Create a validator backed by `api`
    #[must_use]
    pub fn new(api: Arc<dyn StorefrontApi>) -> Self {
        Self { api }
    }

    /// Validate `code` for `event_id` and return its discount
    ///
    /// The code is trimmed first; a blank code never reaches the service.
    ///
    /// # Errors
    ///
    /// - [`PromoError::EmptyCode`] for a blank code
    /// - [`PromoError::NotFound`] / [`PromoError::NotApplicableToEvent`] when
    ///   the service refuses it
    /// - [`PromoError::ServiceError`] for transport failures, other refusals,
    ///   or a discount outside `[0, 100)` percent
    #[tracing::instrument(skip(self), fields(event_id = %event_id))]
    pub async fn validate(&self, event_id: &EventId, code: &str) -> Result<DiscountFraction, PromoError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(PromoError::EmptyCode);
        }

        let check = PromoCodeCheck {
            event_id: event_id.clone(),
            code: code.to_string(),
        };

        match self.api.validate_promo_code(check).await {
            Ok(validation) => {
                let percent = validation.promo_code.discount_percent;
                let discount = DiscountFraction::from_percent(percent).map_err(|_| {
                    PromoError::ServiceError(format!("discount of {percent}% is out of range"))
                })?;
                tracing::info!(percent = discount.percent(), "Promo code accepted");
                Ok(discount)
            },
            Err(error) => {
                let outcome = classify(&error);
                tracing::info!(%error, ?outcome, "Promo code refused");
                Err(outcome)
            },
        }
    }

    /// Validate `code` and, on success, apply its discount to `cart`
    ///
    /// On any error the cart's discount is left as it was.
    ///
    /// # Errors
    ///
    /// See [`PromoCodeValidator::validate`].
    pub async fn validate_and_apply(
        &self,
        cart: &mut CartPricingEngine,
        event_id: &EventId,
        code: &str,
    ) -> Result<DiscountFraction, PromoError> {
        let discount = self.validate(event_id, code).await?;
        cart.set_discount(discount);
        Ok(discount)
    }
}

fn classify(error: &ApiError) -> PromoError {
    if error.has_code(PROMO_CODE_NOT_FOUND) {
        return PromoError::NotFound;
    }
    if error.has_code(PROMO_CODE_NOT_APPLICABLE) {
        return PromoError::NotApplicableToEvent;
    }
    match error.status() {
        Some(404) => PromoError::NotFound,
        Some(409 | 422) => PromoError::NotApplicableToEvent,
        _ => PromoError::ServiceError(error.to_string()),
    }
}
