//! Types for payment confirmation polling.

use crate::types::{Order, OrderId, PaymentStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use storefront_core::effect::EffectId;

/// Default pause between a PENDING answer and the next fetch
pub const POLL_INTERVAL: Duration = Duration::from_millis(3_000);

/// Default time allowed for the payment to settle, counted from `Start`
pub const CONFIRMATION_DEADLINE: Duration = Duration::from_millis(120_000);

/// Poll timer registration
pub const POLL_TIMER: EffectId = EffectId::new("confirmation.poll_timer");

/// Deadline timer registration
pub const DEADLINE_TIMER: EffectId = EffectId::new("confirmation.deadline");

/// In-flight status fetch registration
pub const STATUS_FETCH: EffectId = EffectId::new("confirmation.fetch");

/// Polling cadence and overall deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTiming {
    /// Pause between a PENDING answer and the next fetch
    pub interval: Duration,
    /// Time allowed for a terminal status to appear
    pub deadline: Duration,
}

impl Default for PollTiming {
    fn default() -> Self {
        Self {
            interval: POLL_INTERVAL,
            deadline: CONFIRMATION_DEADLINE,
        }
    }
}

/// Where a confirmation session stands
///
/// `Confirmed`, `TimedOut` and `Error` are terminal: once reached, the
/// session never leaves them and no further fetch is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfirmationPhase {
    /// Waiting for the first status
    Initializing,
    /// Last known status was PENDING
    Polling,
    /// The order service reported a terminal status
    Confirmed(PaymentStatus),
    /// The deadline elapsed while the status was still PENDING
    TimedOut,
    /// The order id was missing or a status fetch failed
    Error,
}

impl ConfirmationPhase {
    /// Whether the session is finished
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed(_) | Self::TimedOut | Self::Error)
    }

    /// Message to show the buyer
    ///
    /// Every outcome reads differently; a timeout in particular does not claim
    /// the payment failed.
    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::Initializing | Self::Polling | Self::Confirmed(PaymentStatus::Pending) => {
                "Confirming your payment. This can take a moment."
            },
            Self::Confirmed(PaymentStatus::Paid) => {
                "Payment received. Your tickets are confirmed."
            },
            Self::Confirmed(PaymentStatus::Failed) => {
                "Payment failed and you have not been charged. Please start a new order."
            },
            Self::Confirmed(PaymentStatus::Cancelled) => {
                "Payment was cancelled. Please start a new order to buy tickets."
            },
            Self::Confirmed(PaymentStatus::Refunded) => "This order has been refunded.",
            Self::TimedOut => {
                "We could not confirm your payment yet. It may still go through; check your order status in a few minutes before paying again."
            },
            Self::Error => "We could not look up your order. Please retry the status check.",
        }
    }
}

impl fmt::Display for ConfirmationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initializing => f.write_str("initializing"),
            Self::Polling => f.write_str("polling"),
            Self::Confirmed(status) => write!(f, "confirmed({status})"),
            Self::TimedOut => f.write_str("timed_out"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// State of one confirmation session
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationState {
    /// Order being confirmed
    pub order_id: Option<OrderId>,
    /// Current phase
    pub phase: ConfirmationPhase,
    /// A status fetch has been issued and not yet answered
    pub fetch_in_flight: bool,
    /// Status fetches issued so far
    pub fetches: u32,
    /// Last order snapshot received
    pub order: Option<Order>,
    /// Reason for the `Error` phase
    pub error: Option<String>,
    /// When `Start` was handled
    pub started_at: Option<DateTime<Utc>>,
    /// When a terminal phase was reached
    pub finished_at: Option<DateTime<Utc>>,
    /// The host is tearing the session down; every later action is ignored
    pub torn_down: bool,
}

impl ConfirmationState {
    /// A session that has not started
    #[must_use]
    pub const fn new() -> Self {
        Self {
            order_id: None,
            phase: ConfirmationPhase::Initializing,
            fetch_in_flight: false,
            fetches: 0,
            order: None,
            error: None,
            started_at: None,
            finished_at: None,
            torn_down: false,
        }
    }

    /// Whether `Start` has been handled
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Time from start to the terminal phase
    #[must_use]
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }
}

impl Default for ConfirmationState {
    fn default() -> Self {
        Self::new()
    }
}
