//! The per-process environment threaded through evaluator, plan, and
//! registry calls.

use super::shared_state::SharedStateRegistry;
use crate::rillstream::sql::execution::types::Tuple;
use std::sync::Arc;

/// Engine configuration flags
#[derive(Debug, Clone, Copy, Default)]
pub struct Configuration {
    /// When set, every plan traces tuple ingestion and emission through
    /// `log::trace!`
    pub tuple_trace_enabled: bool,
}

/// The environment handed into every evaluator, plan, and registry call.
///
/// A Context carries the configuration flags and the process-wide
/// shared-state registry. Plans never call the registry themselves; user
/// functions and administrative commands reach it through here.
pub struct Context {
    pub config: Configuration,
    pub shared_states: Arc<SharedStateRegistry>,
}

impl Context {
    /// Create a Context with its own empty shared-state registry
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            shared_states: Arc::new(SharedStateRegistry::new()),
        }
    }

    /// Create a Context over an existing registry, for callers that share
    /// one registry between several contexts
    pub fn with_registry(config: Configuration, registry: Arc<SharedStateRegistry>) -> Self {
        Self {
            config,
            shared_states: registry,
        }
    }

    pub fn is_tuple_trace_enabled(&self) -> bool {
        self.config.tuple_trace_enabled
    }

    /// Trace one tuple event when tuple tracing is enabled
    pub fn trace_tuple(&self, event: &str, tuple: &Tuple) {
        if self.config.tuple_trace_enabled {
            log::trace!(
                target: "rillstream::tuple_trace",
                "{} stream={} batch={} ts={}",
                event,
                tuple.input_name,
                tuple.batch_id,
                tuple.timestamp
            );
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}
