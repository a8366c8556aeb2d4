//! Actions for payment confirmation polling.

use crate::types::{Order, OrderId};

/// Inputs to the confirmation reducer
///
/// `Start` and `Teardown` come from the host; the rest are fed back by
/// effects the reducer scheduled.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmationAction {
    /// Begin confirming; `None` when the return URL had no usable order id
    Start {
        /// Order to confirm
        order_id: Option<OrderId>,
    },

    /// The poll interval elapsed
    PollTick,

    /// A status fetch answered
    StatusFetched(Box<Order>),

    /// A status fetch failed
    FetchFailed {
        /// Error description
        reason: String,
    },

    /// The confirmation deadline elapsed
    DeadlineElapsed,

    /// The host is going away; stop everything
    Teardown,
}

impl ConfirmationAction {
    /// `Start` for a known order
    #[must_use]
    pub const fn start(order_id: OrderId) -> Self {
        Self::Start {
            order_id: Some(order_id),
        }
    }

    /// `StatusFetched` for an order snapshot
    #[must_use]
    pub fn fetched(order: Order) -> Self {
        Self::StatusFetched(Box::new(order))
    }
}
