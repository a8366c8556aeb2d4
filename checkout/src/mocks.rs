//! Scripted order service for development and testing.
//!
//! Replies are queued up front; every call is recorded so tests can assert on
//! what was sent and when. Fetch times are measured on the tokio clock, so they
//! follow paused time in tests.

use crate::api::{
    ApiError, ApiErrorDetail, ApiFuture, PromoCode, PromoCodeCheck, PromoCodeValidation,
    StorefrontApi,
};
use crate::types::{Money, Order, OrderId, OrderItem, OrderRequest, PaymentStatus};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

type FetchReply = Result<PaymentStatus, ApiError>;

struct Script {
    fetch_replies: VecDeque<FetchReply>,
    last_fetch_reply: FetchReply,
    fetch_delay: Duration,
    fetch_offsets: Vec<Duration>,
    create_reply: Option<Result<Order, ApiError>>,
    order_total: Money,
    created: Vec<OrderRequest>,
    promo_reply: Result<PromoCodeValidation, ApiError>,
    promo_checks: Vec<PromoCodeCheck>,
}

impl Script {
    fn next_fetch_reply(&mut self) -> FetchReply {
        match self.fetch_replies.pop_front() {
            Some(reply) => {
                self.last_fetch_reply = reply.clone();
                reply
            },
            None => self.last_fetch_reply.clone(),
        }
    }
}

/// In-memory [`StorefrontApi`]
///
/// - Status fetches answer from a queue; once it runs dry the last reply
///   repeats (PENDING if nothing was queued).
/// - Order creation echoes the request back as a PENDING order unless a reply
///   was set.
/// - Promo validation answers `PROMO_CODE_NOT_FOUND` unless a reply was set.
pub struct MockStorefront {
    script: Mutex<Script>,
    origin: Instant,
}

impl MockStorefront {
    /// Create a mock; fetch offsets are measured from now
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script {
                fetch_replies: VecDeque::new(),
                last_fetch_reply: Ok(PaymentStatus::Pending),
                fetch_delay: Duration::ZERO,
                fetch_offsets: Vec::new(),
                create_reply: None,
                order_total: Money::ZERO,
                created: Vec::new(),
                promo_reply: Err(ApiError::Rejected {
                    status: 404,
                    errors: vec![ApiErrorDetail::coded(
                        "PROMO_CODE_NOT_FOUND",
                        "Promo code not found",
                    )],
                }),
                promo_checks: Vec::new(),
            }),
            origin: Instant::now(),
        }
    }

    /// Queue status replies for successive fetches
    #[must_use]
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = PaymentStatus>) -> Self {
        self.with_fetch_replies(statuses.into_iter().map(Ok))
    }

    /// Queue fetch outcomes, including failures
    #[must_use]
    pub fn with_fetch_replies(mut self, replies: impl IntoIterator<Item = FetchReply>) -> Self {
        self.script_mut().fetch_replies.extend(replies);
        self
    }

    /// Make every fetch take `delay` before answering
    #[must_use]
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.script_mut().fetch_delay = delay;
        self
    }

    /// Fixed reply for order creation
    #[must_use]
    pub fn with_create_reply(mut self, reply: Result<Order, ApiError>) -> Self {
        self.script_mut().create_reply = Some(reply);
        self
    }

    /// Total reported on echoed orders
    #[must_use]
    pub fn with_order_total(mut self, total: Money) -> Self {
        self.script_mut().order_total = total;
        self
    }

    /// Reply for promo validation
    #[must_use]
    pub fn with_promo_reply(mut self, reply: Result<PromoCodeValidation, ApiError>) -> Self {
        self.script_mut().promo_reply = reply;
        self
    }

    /// Accept every promo code with `percent` off
    #[must_use]
    pub fn with_discount_percent(self, percent: f64) -> Self {
        self.with_promo_reply(Ok(PromoCodeValidation {
            promo_code: PromoCode {
                discount_percent: percent,
                code: None,
            },
        }))
    }

    /// Wrap in an `Arc` for injection
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Number of status fetches issued
    #[must_use]
    pub fn fetch_count(&self) -> usize {
        self.script().fetch_offsets.len()
    }

    /// When each status fetch was issued, relative to construction
    #[must_use]
    pub fn fetch_offsets(&self) -> Vec<Duration> {
        self.script().fetch_offsets.clone()
    }

    /// Order requests received
    #[must_use]
    pub fn created_orders(&self) -> Vec<OrderRequest> {
        self.script().created.clone()
    }

    /// Promo checks received
    #[must_use]
    pub fn promo_checks(&self) -> Vec<PromoCodeCheck> {
        self.script().promo_checks.clone()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn script_mut(&mut self) -> &mut Script {
        self.script.get_mut().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockStorefront {
    fn default() -> Self {
        Self::new()
    }
}

/// A PENDING order echoing `request`
fn echo_order(request: &OrderRequest, total: Money) -> Order {
    Order {
        id: OrderId::new(),
        items: request
            .items
            .iter()
            .map(|item| OrderItem {
                type_id: item.type_id.clone(),
                quantity: item.quantity,
                ticket_title: item.ticket_title.clone(),
                final_price: Money::ZERO,
            })
            .collect(),
        total_amount: total,
        payment_status: PaymentStatus::Pending,
        payment_method: Some(request.payment_method.clone()),
        created_at: None,
        event: None,
    }
}

impl StorefrontApi for MockStorefront {
    fn fetch_order(&self, order_id: &OrderId) -> ApiFuture<Order> {
        let (reply, delay) = {
            let mut script = self.script();
            script.fetch_offsets.push(self.origin.elapsed());
            (script.next_fetch_reply(), script.fetch_delay)
        };
        tracing::debug!(%order_id, ?reply, "Mock order status fetch");

        let order_id = order_id.clone();
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            reply.map(|payment_status| Order {
                id: order_id,
                items: Vec::new(),
                total_amount: Money::ZERO,
                payment_status,
                payment_method: None,
                created_at: None,
                event: None,
            })
        })
    }

    fn create_order(&self, request: OrderRequest) -> ApiFuture<Order> {
        let reply = {
            let mut script = self.script();
            let reply = script
                .create_reply
                .clone()
                .unwrap_or_else(|| Ok(echo_order(&request, script.order_total)));
            script.created.push(request);
            reply
        };

        Box::pin(async move { reply })
    }

    fn validate_promo_code(&self, check: PromoCodeCheck) -> ApiFuture<PromoCodeValidation> {
        let reply = {
            let mut script = self.script();
            script.promo_checks.push(check);
            script.promo_reply.clone()
        };

        Box::pin(async move { reply })
    }
}
