//! Named, lifecycle-managed user state shared between queries.
//!
//! A [`SharedStateRegistry`] is a process-wide collection of named mutable
//! objects that user-defined functions may reference. The registry owns
//! the lifecycle contract: for every state whose `init` returned success,
//! `terminate` is called exactly once — through [`SharedStateRegistry::remove`]
//! or through [`SharedStateRegistry::close`].

use super::context::Context;
use super::error::StateError;
use crate::rillstream::sql::execution::types::Tuple;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Result type for state lifecycle methods; states report failures with
/// whatever error type suits them
pub type StateResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// A named mutable object managed by the registry.
///
/// `init` is called once before the state becomes visible; `terminate` is
/// called once after it has been removed. `write` is the hook user
/// functions and sinks use to push tuples into the state — the registry
/// itself never calls it.
pub trait SharedState: Send + std::fmt::Debug {
    /// The type name used by administrative commands
    fn type_name(&self) -> String;

    fn init(&mut self, ctx: &Context) -> StateResult<()>;

    fn write(&mut self, ctx: &Context, tuple: &Tuple) -> StateResult<()>;

    fn terminate(&mut self, ctx: &Context) -> StateResult<()>;
}

/// Shared handle to one registered state
pub type SharedStateHandle = Arc<Mutex<dyn SharedState>>;

/// Process-wide name → state mapping.
///
/// The internal lock is held only across mapping mutations; `init` and
/// `terminate` always run outside it so a slow state lifecycle cannot
/// stall other registry clients.
pub struct SharedStateRegistry {
    states: Mutex<HashMap<String, SharedStateHandle>>,
}

impl SharedStateRegistry {
    pub fn new() -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Register a state under a unique name.
    ///
    /// The state's `init` runs outside the registry lock. On init failure
    /// the state is not inserted and `terminate` is not called. When a
    /// racing `add` claims the name while `init` runs, the loser
    /// terminates its own state and reports `NameInUse`; a terminate
    /// failure during that unwind is logged, not returned, so the caller
    /// sees the name collision rather than the cleanup problem.
    pub fn add(&self, ctx: &Context, name: &str, state: SharedStateHandle) -> Result<(), StateError> {
        {
            let states = self.lock_map();
            if states.contains_key(name) {
                return Err(StateError::name_in_use(name));
            }
        }

        // A panic out of init propagates; nothing was inserted and
        // terminate must not run.
        let init_result = lock_state(&state).init(ctx);
        if let Err(e) = init_result {
            return Err(StateError::init_failed(name, e.to_string()));
        }

        let raced = {
            let mut states = self.lock_map();
            if states.contains_key(name) {
                true
            } else {
                states.insert(name.to_string(), state.clone());
                false
            }
        };
        if raced {
            // init succeeded, so this state still gets its terminate
            if let Err(e) = lock_state(&state).terminate(ctx) {
                log::error!(
                    "state '{}' lost an add race and failed to terminate: {}",
                    name,
                    e
                );
            }
            return Err(StateError::name_in_use(name));
        }
        Ok(())
    }

    /// Look up a state by name
    pub fn get(&self, _ctx: &Context, name: &str) -> Result<SharedStateHandle, StateError> {
        self.lock_map()
            .get(name)
            .cloned()
            .ok_or_else(|| StateError::not_found(name))
    }

    /// Snapshot of the current name → state mapping
    pub fn list(&self, _ctx: &Context) -> HashMap<String, SharedStateHandle> {
        self.lock_map().clone()
    }

    /// Remove a state and terminate it.
    ///
    /// Removing an absent name is not an error and returns `(None, None)`.
    /// The removed state is returned even when its `terminate` failed; the
    /// failure comes back alongside it. A panic out of `terminate`
    /// propagates after the entry has already left the mapping.
    pub fn remove(
        &self,
        ctx: &Context,
        name: &str,
    ) -> (Option<SharedStateHandle>, Option<StateError>) {
        let state = { self.lock_map().remove(name) };
        let state = match state {
            Some(state) => state,
            None => return (None, None),
        };
        let terminate_result = lock_state(&state).terminate(ctx);
        match terminate_result {
            Ok(()) => {}
            Err(e) => {
                let err = StateError::terminated(name, e.to_string());
                return (Some(state), Some(err));
            }
        }
        (Some(state), None)
    }

    /// Tear the registry down: remove every entry and terminate each one.
    ///
    /// Every state gets its terminate call even when earlier ones fail;
    /// the first failure is returned after the drain completes.
    pub fn close(&self, ctx: &Context) -> Result<(), StateError> {
        let drained: Vec<(String, SharedStateHandle)> =
            { self.lock_map().drain().collect() };
        let mut first_err = None;
        for (name, state) in drained {
            if let Err(e) = lock_state(&state).terminate(ctx) {
                log::error!("state '{}' failed to terminate during close: {}", name, e);
                if first_err.is_none() {
                    first_err = Some(StateError::terminated(name, e.to_string()));
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn lock_map(&self) -> std::sync::MutexGuard<'_, HashMap<String, SharedStateHandle>> {
        // No user code runs under this lock, so poisoning cannot happen
        // through the registry itself.
        self.states
            .lock()
            .expect("shared state registry lock poisoned")
    }
}

impl Default for SharedStateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock a state handle, tolerating poison: a state that panicked earlier
/// must not be able to block its own teardown.
fn lock_state(state: &SharedStateHandle) -> std::sync::MutexGuard<'_, dyn SharedState + 'static> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
