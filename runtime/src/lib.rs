//! # Storefront Runtime
//!
//! Runtime host for storefront reducers.
//!
//! This crate provides the [`Store`] that coordinates reducer execution and
//! effect handling.
//!
//! ## Core Components
//!
//! - **Store**: Owns the state, runs the reducer under a write lock and executes the
//!   returned effects on tokio
//! - **Effect registry**: Every spawned effect task is tracked, keyed by its
//!   [`EffectId`] when the reducer wrapped it in `Effect::Cancellable`
//! - **Observers**: State snapshots are published on a `watch` channel after
//!   every transition that changed the state
//!
//! ## Lifecycle
//!
//! A store accepts actions until [`Store::shutdown`] (or [`Store::shutdown_now`])
//! is called. Shutdown sets a flag checked before *and* after acquiring the state
//! lock, then aborts every tracked task. After that, no reducer step runs and no
//! observer is notified.
//!
//! ## Example
//!
//! ```ignore
//! use storefront_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action
//! store.send(Action::Start).await?;
//!
//! // Read state
//! let phase = store.state(|s| s.phase).await;
//!
//! // Tear everything down
//! store.shutdown().await;
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use storefront_core::effect::{Effect, EffectId};
use storefront_core::reducer::Reducer;
use tokio::sync::{RwLock, watch};
use tokio::task::AbortHandle;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
    pub enum StoreError {
        /// Store has been shut down and is not accepting new actions
        ///
        /// Returned by `send()` after `shutdown()` or `shutdown_now()`.
        #[error("Store is shutting down")]
        ShutdownInProgress,
    }
}

pub use error::StoreError;

/// Tracks spawned effect tasks so they can be aborted by id or all at once.
#[derive(Debug, Default)]
struct EffectRegistry {
    by_id: HashMap<EffectId, Vec<AbortHandle>>,
    untracked: Vec<AbortHandle>,
}

impl EffectRegistry {
    fn register(&mut self, id: Option<EffectId>, handle: AbortHandle) {
        let bucket = match id {
            Some(id) => self.by_id.entry(id).or_default(),
            None => &mut self.untracked,
        };
        bucket.retain(|handle| !handle.is_finished());
        bucket.push(handle);
    }

    /// Abort every task registered under `id`, returning how many were still running.
    fn cancel(&mut self, id: EffectId) -> usize {
        self.by_id.remove(&id).map_or(0, abort_handles)
    }

    fn cancel_all(&mut self) -> usize {
        let mut aborted = 0;
        for (_, handles) in self.by_id.drain() {
            aborted += abort_handles(handles);
        }
        aborted + abort_handles(std::mem::take(&mut self.untracked))
    }

    fn active(&self) -> usize {
        self.by_id
            .values()
            .chain(std::iter::once(&self.untracked))
            .flatten()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    fn active_for(&self, id: EffectId) -> usize {
        self.by_id.get(&id).map_or(0, |handles| {
            handles.iter().filter(|handle| !handle.is_finished()).count()
        })
    }
}

fn abort_handles(handles: Vec<AbortHandle>) -> usize {
    let mut aborted = 0;
    for handle in handles {
        if !handle.is_finished() {
            handle.abort();
            aborted += 1;
        }
    }
    aborted
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicBool, Effect, EffectId, EffectRegistry, Mutex, MutexGuard, Ordering,
        PoisonError, Reducer, RwLock, StoreError, watch,
    };
    use std::future::Future;
    use std::pin::Pin;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`, one reducer step at a time)
    /// 2. Reducer (transition logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop and cancellation)
    ///
    /// Effects are executed while the state lock is still held, so the
    /// registrations and cancellations a transition requests are visible before
    /// the next transition runs.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        observers: Arc<watch::Sender<S>>,
        registry: Arc<Mutex<EffectRegistry>>,
        shutdown: Arc<AtomicBool>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + 'static,
        S: Clone + PartialEq + Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            let (observers, _) = watch::channel(initial_state.clone());

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                observers: Arc::new(observers),
                registry: Arc::new(Mutex::new(EffectRegistry::default())),
                shutdown: Arc::new(AtomicBool::new(false)),
            }
        }

        /// Send an action to the store
        ///
        /// Runs the reducer under the state write lock, publishes the new state to
        /// observers if it changed, and executes the returned effects.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store has been shut down,
        /// including when shutdown happened while this call waited for the lock.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<(), StoreError> {
            if self.is_shutdown() {
                return Err(self.reject());
            }

            metrics::counter!("store.commands.total").increment(1);

            let mut state = self.state.write().await;
            if self.is_shutdown() {
                return Err(self.reject());
            }

            let effects = self.reducer.reduce(&mut *state, action, &*self.environment);
            tracing::trace!("Reducer completed, returned {} effects", effects.len());

            if self.is_shutdown() {
                tracing::trace!("Store shut down during reduce; dropping {} effects", effects.len());
                return Ok(());
            }

            let snapshot = &*state;
            self.observers.send_if_modified(|current| {
                if current == snapshot {
                    false
                } else {
                    current.clone_from(snapshot);
                    true
                }
            });

            for effect in effects {
                self.execute(effect, None);
            }

            Ok(())
        }

        /// Read current state via a closure
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Subscribe to state snapshots
        ///
        /// The receiver starts with the current state marked as seen; it is
        /// notified after every transition that changed the state.
        #[must_use]
        pub fn subscribe_state(&self) -> watch::Receiver<S> {
            self.observers.subscribe()
        }

        /// Whether shutdown has been initiated
        #[must_use]
        pub fn is_shutdown(&self) -> bool {
            self.shutdown.load(Ordering::Acquire)
        }

        /// Number of effect tasks still running
        #[must_use]
        pub fn active_effects(&self) -> usize {
            self.registry().active()
        }

        /// Number of effect tasks still running under `id`
        #[must_use]
        pub fn active_effects_for(&self, id: EffectId) -> usize {
            self.registry().active_for(id)
        }

        /// Shut the store down
        ///
        /// Rejects further actions, waits for an in-progress reducer step to
        /// finish, then aborts every running effect. Safe to call repeatedly.
        pub async fn shutdown(&self) {
            self.shutdown.store(true, Ordering::Release);
            let _state = self.state.write().await;
            self.abort_all();
        }

        /// Shut the store down without waiting for the state lock
        ///
        /// Used where awaiting is impossible (for example in `Drop`). Safe to call
        /// repeatedly.
        pub fn shutdown_now(&self) {
            self.shutdown.store(true, Ordering::Release);
            self.abort_all();
        }

        fn abort_all(&self) {
            let aborted = self.registry().cancel_all();
            if aborted > 0 {
                tracing::debug!(aborted, "Aborted running effects on shutdown");
                metrics::counter!("store.effects.cancelled").increment(aborted as u64);
            }
        }

        fn reject(&self) -> StoreError {
            tracing::trace!("Rejected action: store is shutting down");
            metrics::counter!("store.shutdown.rejected_actions").increment(1);
            StoreError::ShutdownInProgress
        }

        fn registry(&self) -> MutexGuard<'_, EffectRegistry> {
            self.registry.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Execute an effect description
        ///
        /// - `None`: No-op
        /// - `Cancel`: Aborts every task registered under the id
        /// - `Cancellable`: Executes the inner effect registered under its id
        /// - `Parallel`: Executes each effect independently
        /// - `Future` / `Delay` / `Sequential`: Spawned as one tracked task
        fn execute(&self, effect: Effect<A>, id: Option<EffectId>) {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Cancel(target) => {
                    let aborted = self.registry().cancel(target);
                    tracing::trace!(effect_id = %target, aborted, "Cancelled effects");
                    metrics::counter!("store.effects.cancelled").increment(aborted as u64);
                },
                Effect::Cancellable { id, effect } => self.execute(*effect, Some(id)),
                Effect::Parallel(effects) => {
                    for effect in effects {
                        self.execute(effect, id);
                    }
                },
                effect @ (Effect::Future(_) | Effect::Delay { .. } | Effect::Sequential(_)) => {
                    self.spawn(effect, id);
                },
            }
        }

        fn spawn(&self, effect: Effect<A>, id: Option<EffectId>) {
            // `shutdown_now` raises the flag before draining the registry, so
            // checking it under the registry lock means a task is either drained
            // or never spawned.
            let mut registry = self.registry();
            if self.is_shutdown() {
                tracing::trace!(effect_id = ?id, "Dropped effect: store is shutting down");
                return;
            }

            let kind = match &effect {
                Effect::Delay { .. } => "delay",
                Effect::Sequential(_) => "sequential",
                _ => "future",
            };
            metrics::counter!("store.effects.executed", "type" => kind).increment(1);

            // Registration happens before the task can observe the registry.
            let store = self.clone();
            let handle = tokio::spawn(async move { store.run(effect).await });
            registry.register(id, handle.abort_handle());
        }

        /// Drive an effect to completion inside an already spawned task
        fn run(&self, effect: Effect<A>) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
            Box::pin(async move {
                match effect {
                    Effect::None => {},
                    Effect::Future(fut) => {
                        if let Some(action) = fut.await {
                            self.feed_back(action).await;
                        }
                    },
                    Effect::Delay { duration, action } => {
                        tokio::time::sleep(duration).await;
                        self.feed_back(*action).await;
                    },
                    Effect::Sequential(effects) => {
                        for effect in effects {
                            self.run(effect).await;
                        }
                    },
                    Effect::Parallel(effects) => {
                        futures::future::join_all(effects.into_iter().map(|effect| self.run(effect)))
                            .await;
                    },
                    Effect::Cancellable { effect, .. } => self.run(*effect).await,
                    Effect::Cancel(target) => {
                        let aborted = self.registry().cancel(target);
                        tracing::trace!(effect_id = %target, aborted, "Cancelled effects");
                    },
                }
            })
        }

        async fn feed_back(&self, action: A) {
            if let Err(error) = self.send(action).await {
                tracing::trace!(%error, "Dropped action produced by effect");
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                observers: Arc::clone(&self.observers),
                registry: Arc::clone(&self.registry),
                shutdown: Arc::clone(&self.shutdown),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;
