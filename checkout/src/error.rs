//! Checkout error types.

use thiserror::Error;

/// A blank identifier
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Identifier must not be blank")]
pub struct InvalidId;

/// Local validation failures, raised before any remote call
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ValidationError {
    /// No ticket type has a positive quantity
    #[error("No tickets selected")]
    EmptyCart,

    /// A discount fraction outside `[0, 1)`
    #[error("Discount fraction {0} is outside [0, 1)")]
    InvalidDiscount(f64),
}

/// Promo code validation outcome other than success
///
/// The cart's discount is left untouched on every variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PromoError {
    /// Blank code; the order service is not consulted
    #[error("Enter a promo code")]
    EmptyCode,

    /// The code is unknown to the order service
    #[error("Promo code not found")]
    NotFound,

    /// The code exists but is not valid for this event
    #[error("Promo code does not apply to this event")]
    NotApplicableToEvent,

    /// The order service could not answer
    #[error("Promo code service error: {0}")]
    ServiceError(String),
}

/// Why an order submission failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitFailure {
    /// Nothing to submit; no remote call was made
    EmptyCart,
    /// The order service refused the order (business rule, validation)
    Rejected,
    /// The order service could not be reached or answered unusably
    ServiceUnavailable,
}

impl std::fmt::Display for SubmitFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCart => f.write_str("empty cart"),
            Self::Rejected => f.write_str("rejected"),
            Self::ServiceUnavailable => f.write_str("service unavailable"),
        }
    }
}

/// Order submission failure with user-presentable messages
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Order submission failed ({reason}): {}", .messages.join("; "))]
pub struct SubmitError {
    /// Failure category
    pub reason: SubmitFailure,
    /// Messages to show the buyer, never empty
    pub messages: Vec<String>,
}

impl SubmitError {
    /// The cart had no positive-quantity lines
    #[must_use]
    pub fn empty_cart() -> Self {
        Self {
            reason: SubmitFailure::EmptyCart,
            messages: vec![ValidationError::EmptyCart.to_string()],
        }
    }

    /// Build an error, substituting a generic message when none were given
    #[must_use]
    pub fn new(reason: SubmitFailure, messages: Vec<String>) -> Self {
        let messages = if messages.is_empty() {
            vec![match reason {
                SubmitFailure::EmptyCart => ValidationError::EmptyCart.to_string(),
                SubmitFailure::Rejected => "The order was not accepted".to_string(),
                SubmitFailure::ServiceUnavailable => {
                    "Could not reach the order service, please try again".to_string()
                },
            }]
        } else {
            messages
        };
        Self { reason, messages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_error_never_has_empty_messages() {
        let error = SubmitError::new(SubmitFailure::ServiceUnavailable, vec![]);
        assert_eq!(error.messages.len(), 1);
        assert!(error.to_string().contains("service unavailable"));
    }

    #[test]
    fn test_submit_error_joins_messages() {
        let error = SubmitError::new(
            SubmitFailure::Rejected,
            vec!["Sold out".to_string(), "Try fewer tickets".to_string()],
        );
        assert_eq!(
            error.to_string(),
            "Order submission failed (rejected): Sold out; Try fewer tickets"
        );
    }
}
