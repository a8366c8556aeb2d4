//! Payment confirmation polling.
//!
//! After the payment processor sends the buyer back, the order service is
//! polled until it reports a terminal payment status or the deadline passes.
//!
//! # Architecture
//!
//! ```text
//! Start(orderId) ──► fetch ──► PENDING ──► wait interval ──► PollTick ──► fetch ...
//!      │                 │
//!      │                 ├──► PAID / FAILED / CANCELLED / REFUNDED ──► Confirmed
//!      │                 └──► error ──► Error
//!      └──► deadline ──► DeadlineElapsed ──► TimedOut
//! ```
//!
//! [`ConfirmationReducer`] decides every transition and describes timers and
//! fetches as effects; [`ConfirmationSession`] hosts it on a store that runs
//! them and cancels them when the session ends.

pub mod actions;
pub mod environment;
pub mod reducer;
pub mod session;
pub mod types;

pub use actions::ConfirmationAction;
pub use environment::{ConfirmationEnvironment, ProductionConfirmationEnvironment};
pub use reducer::ConfirmationReducer;
pub use session::{ConfirmationSession, ConfirmationStore};
pub use types::{
    CONFIRMATION_DEADLINE, ConfirmationPhase, ConfirmationState, DEADLINE_TIMER, POLL_INTERVAL,
    POLL_TIMER, PollTiming, STATUS_FETCH,
};
