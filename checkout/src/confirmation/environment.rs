//! Environment for the confirmation reducer.

use super::types::PollTiming;
use crate::api::StorefrontApi;
use std::sync::Arc;
use storefront_core::environment::Clock;

/// Dependencies of the confirmation reducer
pub trait ConfirmationEnvironment: Send + Sync {
    /// Clock used to stamp transitions
    ///
    /// Production uses `SystemClock`, tests use `FixedClock`.
    fn clock(&self) -> &dyn Clock;

    /// Order service used for status fetches
    fn api(&self) -> Arc<dyn StorefrontApi>;

    /// Poll interval and deadline
    fn timing(&self) -> PollTiming;
}

/// Production environment for confirmation sessions
#[derive(Clone)]
pub struct ProductionConfirmationEnvironment {
    clock: Arc<dyn Clock>,
    api: Arc<dyn StorefrontApi>,
    timing: PollTiming,
}

impl ProductionConfirmationEnvironment {
    /// Create an environment with default timing
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, api: Arc<dyn StorefrontApi>) -> Self {
        Self {
            clock,
            api,
            timing: PollTiming::default(),
        }
    }

    /// Override poll interval and deadline
    #[must_use]
    pub fn with_timing(mut self, timing: PollTiming) -> Self {
        self.timing = timing;
        self
    }
}

impl ConfirmationEnvironment for ProductionConfirmationEnvironment {
    fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn api(&self) -> Arc<dyn StorefrontApi> {
        Arc::clone(&self.api)
    }

    fn timing(&self) -> PollTiming {
        self.timing
    }
}
