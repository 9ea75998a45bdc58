use std::fmt;

/// Errors raised by the shared-state registry
#[derive(Debug, Clone, PartialEq)]
pub enum StateError {
    /// `add` saw a duplicate name
    NameInUse { name: String },

    /// `get` saw an absent name
    NotFound { name: String },

    /// A state's `init` failed during `add`; the state was not inserted
    InitFailed { name: String, message: String },

    /// `terminate` failed for a state that has already been removed
    Terminated { name: String, message: String },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::NameInUse { name } => {
                write!(f, "the registry already has a state named '{}'", name)
            }
            StateError::NotFound { name } => {
                write!(f, "no state named '{}' is registered", name)
            }
            StateError::InitFailed { name, message } => {
                write!(f, "state '{}' failed to initialize: {}", name, message)
            }
            StateError::Terminated { name, message } => {
                write!(f, "state '{}' failed to terminate: {}", name, message)
            }
        }
    }
}

impl std::error::Error for StateError {}

impl StateError {
    /// Create a duplicate-name error
    pub fn name_in_use(name: impl Into<String>) -> Self {
        StateError::NameInUse { name: name.into() }
    }

    /// Create a not-found error
    pub fn not_found(name: impl Into<String>) -> Self {
        StateError::NotFound { name: name.into() }
    }

    /// Wrap an init failure
    pub fn init_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        StateError::InitFailed {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Wrap a terminate failure
    pub fn terminated(name: impl Into<String>, message: impl Into<String>) -> Self {
        StateError::Terminated {
            name: name.into(),
            message: message.into(),
        }
    }
}
