//! Engine-wide runtime pieces: the Context threaded through every call and
//! the shared-state registry.

pub mod context;
pub mod error;
pub mod shared_state;

pub use context::{Configuration, Context};
pub use error::StateError;
pub use shared_state::{SharedState, SharedStateHandle, SharedStateRegistry, StateResult};
