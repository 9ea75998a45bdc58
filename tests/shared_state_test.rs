//! Lifecycle scenarios for the shared-state registry: every state whose
//! init succeeded is terminated exactly once, through remove or through
//! registry teardown.

use chrono::Utc;
use rillstream::rillstream::core::shared_state::{
    SharedState, SharedStateHandle, StateResult,
};
use rillstream::rillstream::core::{Context, SharedStateRegistry, StateError};
use rillstream::rillstream::sql::execution::{FieldMap, FieldValue, Tuple};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A running total over a tuple field, with fail switches for the
/// lifecycle hooks
#[derive(Debug)]
struct TotalState {
    total: Arc<AtomicI64>,
    init_count: Arc<AtomicUsize>,
    terminate_count: Arc<AtomicUsize>,
    fail_init: bool,
    fail_terminate: bool,
}

struct TotalStateCounters {
    total: Arc<AtomicI64>,
    inits: Arc<AtomicUsize>,
    terminates: Arc<AtomicUsize>,
}

impl TotalState {
    fn new() -> (Self, TotalStateCounters) {
        let total = Arc::new(AtomicI64::new(0));
        let inits = Arc::new(AtomicUsize::new(0));
        let terminates = Arc::new(AtomicUsize::new(0));
        let state = Self {
            total: total.clone(),
            init_count: inits.clone(),
            terminate_count: terminates.clone(),
            fail_init: false,
            fail_terminate: false,
        };
        (
            state,
            TotalStateCounters {
                total,
                inits,
                terminates,
            },
        )
    }

    fn into_handle(self) -> SharedStateHandle {
        Arc::new(Mutex::new(self))
    }
}

impl SharedState for TotalState {
    fn type_name(&self) -> String {
        "running_total".to_string()
    }

    fn init(&mut self, _ctx: &Context) -> StateResult<()> {
        self.init_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err("running total failed to initialize".into());
        }
        Ok(())
    }

    fn write(&mut self, _ctx: &Context, tuple: &Tuple) -> StateResult<()> {
        if let Some(FieldValue::Integer(i)) = tuple.fields.get("int") {
            self.total.fetch_add(*i, Ordering::SeqCst);
        }
        Ok(())
    }

    fn terminate(&mut self, _ctx: &Context) -> StateResult<()> {
        self.terminate_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_terminate {
            return Err("running total failed to terminate".into());
        }
        Ok(())
    }
}

fn test_tuple(value: i64) -> Tuple {
    let mut fields = FieldMap::new();
    fields.insert("int".to_string(), FieldValue::Integer(value));
    Tuple::new("input", fields, Utc::now())
}

#[test]
fn test_failed_init_frees_the_name_for_a_retry() {
    // add("k", s) with failing init returns the error and never calls
    // terminate; a later add("k", s2) succeeds; remove("k") hands s2 back
    // and terminates it exactly once
    let ctx = Context::default();
    let registry = &ctx.shared_states;

    let (mut bad, bad_counters) = TotalState::new();
    bad.fail_init = true;
    let err = registry.add(&ctx, "k", bad.into_handle()).unwrap_err();
    assert!(matches!(err, StateError::InitFailed { .. }));
    assert_eq!(bad_counters.inits.load(Ordering::SeqCst), 1);
    assert_eq!(bad_counters.terminates.load(Ordering::SeqCst), 0);

    let (good, good_counters) = TotalState::new();
    let handle = good.into_handle();
    registry.add(&ctx, "k", handle.clone()).unwrap();

    let (removed, err) = registry.remove(&ctx, "k");
    assert!(err.is_none());
    assert!(Arc::ptr_eq(&removed.unwrap(), &handle));
    assert_eq!(good_counters.terminates.load(Ordering::SeqCst), 1);
}

#[test]
fn test_states_accumulate_writes_through_the_registry() {
    let ctx = Context::default();
    let registry = &ctx.shared_states;

    let (state, counters) = TotalState::new();
    registry.add(&ctx, "total", state.into_handle()).unwrap();

    let handle = registry.get(&ctx, "total").unwrap();
    for value in [3, 4, 5] {
        handle
            .lock()
            .unwrap()
            .write(&ctx, &test_tuple(value))
            .unwrap();
    }
    assert_eq!(counters.total.load(Ordering::SeqCst), 12);
    assert_eq!(
        handle.lock().unwrap().type_name(),
        "running_total".to_string()
    );
}

#[test]
fn test_close_is_the_teardown_half_of_the_lifecycle() {
    let ctx = Context::default();
    let registry = &ctx.shared_states;

    let mut counters = Vec::new();
    for name in ["a", "b", "c"] {
        let (state, state_counters) = TotalState::new();
        registry.add(&ctx, name, state.into_handle()).unwrap();
        counters.push(state_counters);
    }

    registry.close(&ctx).unwrap();
    for state_counters in &counters {
        assert_eq!(state_counters.inits.load(Ordering::SeqCst), 1);
        assert_eq!(state_counters.terminates.load(Ordering::SeqCst), 1);
    }
    assert!(registry.list(&ctx).is_empty());

    // closing an empty registry is a no-op
    registry.close(&ctx).unwrap();
}

#[test]
fn test_remove_returns_the_state_alongside_its_terminate_error() {
    let ctx = Context::default();
    let registry = &ctx.shared_states;

    let (mut state, counters) = TotalState::new();
    state.fail_terminate = true;
    registry.add(&ctx, "flaky", state.into_handle()).unwrap();

    let (removed, err) = registry.remove(&ctx, "flaky");
    assert!(removed.is_some());
    assert!(matches!(err, Some(StateError::Terminated { .. })));
    assert_eq!(counters.terminates.load(Ordering::SeqCst), 1);

    // the entry is gone regardless of the failure
    assert_eq!(
        registry.get(&ctx, "flaky").unwrap_err(),
        StateError::not_found("flaky")
    );
}

#[test]
fn test_registry_is_shared_between_contexts() {
    let registry = Arc::new(SharedStateRegistry::new());
    let ctx_a = Context::with_registry(Default::default(), registry.clone());
    let ctx_b = Context::with_registry(Default::default(), registry);

    let (state, _) = TotalState::new();
    ctx_a
        .shared_states
        .add(&ctx_a, "shared", state.into_handle())
        .unwrap();
    assert!(ctx_b.shared_states.get(&ctx_b, "shared").is_ok());
}
