//! # Storefront Checkout
//!
//! Client-side checkout for a ticketing storefront.
//!
//! ## Flow
//!
//! ```text
//! CartPricingEngine ──► PromoCodeValidator (optional discount)
//!        │
//!        ▼
//! OrderSubmitter ──► POST /orders ──► orderId ──► payment processor redirect
//!                                                        │
//!                                                        ▼
//! PaymentReturn(orderId) ──► ConfirmationSession ──► GET /orders/{id} every 3s
//!                                   │                     for at most 120s
//!                                   ▼
//!                     Confirmed(status) | TimedOut | Error
//! ```
//!
//! All amounts computed locally are advisory; the order service owns pricing
//! and payment status.

pub mod api;
pub mod cart;
pub mod config;
pub mod confirmation;
pub mod error;
pub mod mocks;
pub mod payment_return;
pub mod promo;
pub mod submit;
pub mod types;

pub use api::{ApiError, StorefrontApi, StorefrontClient};
pub use cart::{CartLine, CartPricingEngine, DiscountFraction};
pub use config::{Config, ConfigError};
pub use confirmation::{
    ConfirmationAction, ConfirmationPhase, ConfirmationSession, ConfirmationState,
    ProductionConfirmationEnvironment, PollTiming,
};
pub use error::{InvalidId, PromoError, SubmitError, SubmitFailure, ValidationError};
pub use payment_return::PaymentReturn;
pub use promo::PromoCodeValidator;
pub use submit::OrderSubmitter;
pub use types::{
    EventId, Money, Order, OrderId, OrderRequest, PaymentMethod, PaymentStatus, TicketType,
    TicketTypeId,
};
