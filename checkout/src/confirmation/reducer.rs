//! Reducer for payment confirmation polling.
//!
//! One fetch is in flight at a time. The next poll is only scheduled after a
//! PENDING answer, so fetches never overlap and the cadence is measured from
//! the previous answer rather than the previous request.

use super::actions::ConfirmationAction;
use super::environment::{ConfirmationEnvironment, ProductionConfirmationEnvironment};
use super::types::{
    ConfirmationPhase, ConfirmationState, DEADLINE_TIMER, POLL_TIMER, STATUS_FETCH,
};
use crate::types::{Order, OrderId};
use smallvec::{SmallVec, smallvec};
use storefront_core::effect::Effect;
use storefront_core::reducer::{Effects, Reducer};

/// Drives a [`ConfirmationState`] from start to a terminal phase
///
/// - `Start` issues the first fetch and arms the deadline.
/// - A PENDING answer arms the poll timer; a terminal one confirms.
/// - A failed fetch, or a missing order id, ends in `Error` without retrying.
/// - The deadline ends a still-pending session in `TimedOut`.
///
/// Terminal phases cancel every outstanding timer and ignore later actions,
/// `Teardown` included, so a settled outcome stays observable.
pub struct ConfirmationReducer;

impl ConfirmationReducer {
    /// Create a new confirmation reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn start(
        state: &mut ConfirmationState,
        order_id: Option<OrderId>,
        env: &ProductionConfirmationEnvironment,
    ) -> Effects<ConfirmationAction> {
        if state.is_started() {
            tracing::debug!("Confirmation already started; ignoring Start");
            return SmallVec::new();
        }
        state.started_at = Some(env.clock().now());

        let Some(order_id) = order_id else {
            return Self::fail(state, "missing or invalid order id".to_string(), env);
        };

        tracing::info!(%order_id, deadline = ?env.timing().deadline, "Confirming payment");
        let fetch = fetch_status(&order_id, env);
        state.order_id = Some(order_id);
        state.fetch_in_flight = true;
        state.fetches = 1;

        smallvec![
            Effect::delay(env.timing().deadline, ConfirmationAction::DeadlineElapsed)
                .cancellable(DEADLINE_TIMER),
            fetch,
        ]
    }

    fn poll(
        state: &mut ConfirmationState,
        env: &ProductionConfirmationEnvironment,
    ) -> Effects<ConfirmationAction> {
        if state.phase != ConfirmationPhase::Polling || state.fetch_in_flight {
            tracing::debug!(phase = %state.phase, in_flight = state.fetch_in_flight, "Skipping poll tick");
            return SmallVec::new();
        }
        let Some(order_id) = &state.order_id else {
            return SmallVec::new();
        };
        let fetch = fetch_status(order_id, env);

        state.fetch_in_flight = true;
        state.fetches += 1;
        tracing::debug!(order_id = ?state.order_id, fetch = state.fetches, "Polling order status");

        smallvec![fetch]
    }

    fn observe(
        state: &mut ConfirmationState,
        order: Order,
        env: &ProductionConfirmationEnvironment,
    ) -> Effects<ConfirmationAction> {
        if state.order_id.as_ref() != Some(&order.id) {
            let reason = format!("status response was for order {}", order.id);
            return Self::fail(state, reason, env);
        }

        state.fetch_in_flight = false;
        let status = order.payment_status;
        state.order = Some(order);

        if status.is_terminal() {
            state.phase = ConfirmationPhase::Confirmed(status);
            state.finished_at = Some(env.clock().now());
            tracing::info!(%status, fetches = state.fetches, "Payment settled");
            return smallvec![Effect::Cancel(POLL_TIMER), Effect::Cancel(DEADLINE_TIMER)];
        }

        state.phase = ConfirmationPhase::Polling;
        smallvec![
            Effect::delay(env.timing().interval, ConfirmationAction::PollTick)
                .cancellable(POLL_TIMER)
        ]
    }

    fn fail(
        state: &mut ConfirmationState,
        reason: String,
        env: &ProductionConfirmationEnvironment,
    ) -> Effects<ConfirmationAction> {
        tracing::error!(order_id = ?state.order_id, %reason, "Payment confirmation failed");

        state.phase = ConfirmationPhase::Error;
        state.fetch_in_flight = false;
        state.error = Some(reason);
        state.finished_at = Some(env.clock().now());

        cancel_all()
    }

    fn time_out(
        state: &mut ConfirmationState,
        env: &ProductionConfirmationEnvironment,
    ) -> Effects<ConfirmationAction> {
        tracing::warn!(
            order_id = ?state.order_id,
            fetches = state.fetches,
            "Payment still pending at deadline"
        );

        state.phase = ConfirmationPhase::TimedOut;
        state.fetch_in_flight = false;
        state.finished_at = Some(env.clock().now());

        smallvec![Effect::Cancel(POLL_TIMER), Effect::Cancel(STATUS_FETCH)]
    }
}

impl Default for ConfirmationReducer {
    fn default() -> Self {
        Self::new()
    }
}

fn cancel_all() -> Effects<ConfirmationAction> {
    smallvec![
        Effect::Cancel(POLL_TIMER),
        Effect::Cancel(DEADLINE_TIMER),
        Effect::Cancel(STATUS_FETCH),
    ]
}

/// One status fetch, registered so a terminal transition can abort it
fn fetch_status(
    order_id: &OrderId,
    env: &ProductionConfirmationEnvironment,
) -> Effect<ConfirmationAction> {
    let api = env.api();
    let order_id = order_id.clone();
    Effect::Future(Box::pin(async move {
        let action = match api.fetch_order(&order_id).await {
            Ok(order) => ConfirmationAction::fetched(order),
            Err(error) => ConfirmationAction::FetchFailed {
                reason: error.to_string(),
            },
        };
        Some(action)
    }))
    .cancellable(STATUS_FETCH)
}

impl Reducer for ConfirmationReducer {
    type State = ConfirmationState;
    type Action = ConfirmationAction;
    type Environment = ProductionConfirmationEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects<Self::Action> {
        if state.torn_down {
            tracing::trace!(?action, "Session torn down; ignoring action");
            return SmallVec::new();
        }

        match action {
            ConfirmationAction::Teardown if state.phase.is_terminal() => {
                tracing::trace!(phase = %state.phase, "Session already finished; nothing to tear down");
                SmallVec::new()
            },
            ConfirmationAction::Teardown => {
                tracing::debug!(phase = %state.phase, "Tearing down confirmation session");
                state.torn_down = true;
                state.fetch_in_flight = false;
                cancel_all()
            },
            action if state.phase.is_terminal() => {
                tracing::debug!(phase = %state.phase, ?action, "Session finished; ignoring action");
                SmallVec::new()
            },
            ConfirmationAction::Start { order_id } => Self::start(state, order_id, env),
            ConfirmationAction::PollTick => Self::poll(state, env),
            ConfirmationAction::StatusFetched(order) => Self::observe(state, *order, env),
            ConfirmationAction::FetchFailed { reason } => Self::fail(state, reason, env),
            ConfirmationAction::DeadlineElapsed => Self::time_out(state, env),
        }
    }
}
