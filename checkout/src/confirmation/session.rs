//! Host for one confirmation session.

use super::actions::ConfirmationAction;
use super::environment::ProductionConfirmationEnvironment;
use super::reducer::ConfirmationReducer;
use super::types::{ConfirmationPhase, ConfirmationState};
use crate::payment_return::PaymentReturn;
use crate::types::OrderId;
use storefront_runtime::{Store, StoreError};
use tokio::sync::watch;

/// Store specialised for confirmation polling
pub type ConfirmationStore = Store<
    ConfirmationState,
    ConfirmationAction,
    ProductionConfirmationEnvironment,
    ConfirmationReducer,
>;

/// A running payment confirmation
///
/// Owns the store that executes the reducer's timers and fetches. Cancelling
/// (or dropping) the session stops every timer and abandons any in-flight
/// fetch; nothing reaches the state afterwards.
pub struct ConfirmationSession {
    store: ConfirmationStore,
}

impl ConfirmationSession {
    /// Create an idle session
    #[must_use]
    pub fn new(environment: ProductionConfirmationEnvironment) -> Self {
        Self {
            store: Store::new(
                ConfirmationState::new(),
                ConfirmationReducer::new(),
                environment,
            ),
        }
    }

    /// Begin confirming `order_id`; `None` ends immediately in `Error`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the session was cancelled.
    pub async fn start(&self, order_id: Option<OrderId>) -> Result<(), StoreError> {
        self.store.send(ConfirmationAction::Start { order_id }).await
    }

    /// Begin confirming the order named by a payment return
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] if the session was cancelled.
    pub async fn start_from_return(&self, payment_return: &PaymentReturn) -> Result<(), StoreError> {
        self.start(payment_return.order_id.clone()).await
    }

    /// Current phase
    pub async fn phase(&self) -> ConfirmationPhase {
        self.store.state(|state| state.phase).await
    }

    /// Copy of the full state
    pub async fn snapshot(&self) -> ConfirmationState {
        self.store.state(Clone::clone).await
    }

    /// Observe state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConfirmationState> {
        self.store.subscribe_state()
    }

    /// Wait until the session reaches a terminal phase
    ///
    /// Returns `None` if the session is cancelled before settling. A session
    /// cancelled after it settled still reports its outcome.
    pub async fn wait_for_outcome(&self) -> Option<ConfirmationPhase> {
        let mut updates = self.subscribe();
        loop {
            {
                let state = updates.borrow_and_update();
                if state.phase.is_terminal() {
                    return Some(state.phase);
                }
                if state.torn_down {
                    return None;
                }
            }
            if updates.changed().await.is_err() {
                return None;
            }
        }
    }

    /// Stop the session
    ///
    /// Waits for any in-progress transition, cancels every timer and in-flight
    /// fetch, then rejects all further actions. Safe to call more than once.
    pub async fn cancel(&self) {
        match self.store.send(ConfirmationAction::Teardown).await {
            Ok(()) => tracing::debug!("Confirmation session cancelled"),
            Err(StoreError::ShutdownInProgress) => {},
        }
        self.store.shutdown().await;
    }

    /// Whether the session has been cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.store.is_shutdown()
    }

    /// Timers and fetches still running
    #[must_use]
    pub fn active_tasks(&self) -> usize {
        self.store.active_effects()
    }
}

impl Drop for ConfirmationSession {
    fn drop(&mut self) {
        self.store.shutdown_now();
    }
}
