//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use storefront_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// `given_actions` replays a history before the action under test; effects
/// produced while replaying are discarded, only the effects of `when_action`
/// reach the effect assertions.
///
/// # Example
///
/// ```ignore
/// use storefront_testing::ReducerTest;
///
/// ReducerTest::new(ConfirmationReducer::new())
///     .with_env(test_environment())
///     .given_state(ConfirmationState::new())
///     .given_actions([ConfirmationAction::start(order_id)])
///     .when_action(ConfirmationAction::DeadlineElapsed)
///     .then_state(|state| {
///         assert_eq!(state.phase, ConfirmationPhase::TimedOut);
///     })
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    history: Vec<A>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            history: Vec::new(),
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Actions applied before the action under test (Given)
    #[must_use]
    pub fn given_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.history.extend(actions);
        self
    }

    /// Set the action to test (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let action = self.action.expect("Action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        for past in self.history {
            let _ = self.reducer.reduce(&mut state, past, &env);
        }

        let effects = self.reducer.reduce(&mut state, action, &env);

        for assertion in self.state_assertions {
            assertion(&state);
        }

        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Helper assertions for effects
///
/// Assertions look through `Effect::Parallel` and `Effect::Cancellable` wrappers.
pub mod assertions {
    use std::time::Duration;
    use storefront_core::effect::{Effect, EffectId};

    fn flatten<A>(effects: &[Effect<A>]) -> Vec<(Option<EffectId>, &Effect<A>)> {
        fn walk<'a, A>(
            effect: &'a Effect<A>,
            id: Option<EffectId>,
            out: &mut Vec<(Option<EffectId>, &'a Effect<A>)>,
        ) {
            match effect {
                Effect::Parallel(inner) => inner.iter().for_each(|e| walk(e, id, out)),
                Effect::Cancellable { id, effect } => walk(effect, Some(*id), out),
                other => out.push((id, other)),
            }
        }

        let mut out = Vec::new();
        for effect in effects {
            walk(effect, None, &mut out);
        }
        out
    }

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if any effect other than `Effect::None` is present.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(|e| matches!(e, Effect::None)),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that a Future effect is registered under `id`
    ///
    /// # Panics
    ///
    /// Panics if no such effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_runs_future<A>(effects: &[Effect<A>], id: EffectId) {
        assert!(
            flatten(effects)
                .iter()
                .any(|(registered, e)| *registered == Some(id) && matches!(e, Effect::Future(_))),
            "Expected a Future effect registered under {id}"
        );
    }

    /// Assert that a delayed action is registered under `id` with the given duration
    ///
    /// # Panics
    ///
    /// Panics if no such effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_schedules<A>(effects: &[Effect<A>], id: EffectId, after: Duration) {
        assert!(
            flatten(effects).iter().any(|(registered, e)| {
                *registered == Some(id)
                    && matches!(e, Effect::Delay { duration, .. } if *duration == after)
            }),
            "Expected a {after:?} delay registered under {id}"
        );
    }

    /// Assert that nothing is registered under `id`
    ///
    /// # Panics
    ///
    /// Panics if an effect registered under `id` is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_not_registered<A>(effects: &[Effect<A>], id: EffectId) {
        assert!(
            flatten(effects)
                .iter()
                .all(|(registered, _)| *registered != Some(id)),
            "Expected nothing registered under {id}"
        );
    }

    /// Assert that the effects cancel `id`
    ///
    /// # Panics
    ///
    /// Panics if no `Effect::Cancel(id)` is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_cancels<A>(effects: &[Effect<A>], id: EffectId) {
        assert!(
            flatten(effects).iter().any(|(_, e)| e.cancels(id)),
            "Expected effects to cancel {id}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use storefront_core::effect::{Effect, EffectId};
    use storefront_core::reducer::{Effects, Reducer};
    use storefront_core::smallvec;

    const TIMER: EffectId = EffectId::new("test.timer");

    #[derive(Clone, Debug)]
    struct TestState {
        count: i32,
    }

    #[derive(Clone, Debug)]
    enum TestAction {
        Increment,
        Arm,
        Disarm,
    }

    struct TestReducer;

    struct TestEnv;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> Effects<Self::Action> {
            match action {
                TestAction::Increment => {
                    state.count += 1;
                    smallvec![Effect::None]
                },
                TestAction::Arm => smallvec![Effect::merge(vec![
                    Effect::delay(Duration::from_secs(3), TestAction::Increment).cancellable(TIMER),
                ])],
                TestAction::Disarm => smallvec![Effect::Cancel(TIMER)],
            }
        }
    }

    #[test]
    fn test_reducer_test_replays_history() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .given_actions([TestAction::Increment, TestAction::Increment])
            .when_action(TestAction::Increment)
            .then_state(|state| {
                assert_eq!(state.count, 3);
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn test_schedule_assertion_sees_through_wrappers() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Arm)
            .then_effects(|effects| {
                assertions::assert_schedules(effects, TIMER, Duration::from_secs(3));
                assertions::assert_effects_count(effects, 1);
            })
            .run();
    }

    #[test]
    fn test_cancel_assertion() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { count: 0 })
            .when_action(TestAction::Disarm)
            .then_effects(|effects| {
                assertions::assert_cancels(effects, TIMER);
                assertions::assert_not_registered(effects, TIMER);
            })
            .run();
    }
}
