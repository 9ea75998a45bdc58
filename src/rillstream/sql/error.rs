use std::fmt;

/// Errors raised while evaluating expressions or running an execution plan
#[derive(Debug, Clone, PartialEq)]
pub enum SqlError {
    /// Evaluation saw incompatible operand types
    TypeMismatch { expected: String, actual: String },

    /// Path access through a Map/Array missed
    FieldNotFound { field: String },

    /// An explicit cast could not convert the value
    CastFailed { value: String, target: String },

    /// A function name did not resolve against the registry
    UnknownFunction { name: String },

    /// Function arity or argument kind was wrong
    BadArgument { function: String, message: String },

    /// An alias-path write collided with a non-Map intermediate
    BadAssignment { path: String },

    /// Integer division or modulo by zero
    DivisionByZero,

    /// An internal invariant was violated (cache corruption etc.)
    Internal { message: String },
}

impl fmt::Display for SqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlError::TypeMismatch { expected, actual } => {
                write!(f, "type mismatch: expected {}, got {}", expected, actual)
            }
            SqlError::FieldNotFound { field } => {
                write!(f, "field '{}' not found", field)
            }
            SqlError::CastFailed { value, target } => {
                write!(f, "cannot cast {} to {}", value, target)
            }
            SqlError::UnknownFunction { name } => {
                write!(f, "unknown function '{}'", name)
            }
            SqlError::BadArgument { function, message } => {
                write!(f, "bad argument for function '{}': {}", function, message)
            }
            SqlError::BadAssignment { path } => {
                write!(f, "cannot assign through non-map value at '{}'", path)
            }
            SqlError::DivisionByZero => write!(f, "division by zero"),
            SqlError::Internal { message } => write!(f, "internal error: {}", message),
        }
    }
}

impl std::error::Error for SqlError {}

impl SqlError {
    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        SqlError::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a field-not-found error
    pub fn field_not_found(field: impl Into<String>) -> Self {
        SqlError::FieldNotFound {
            field: field.into(),
        }
    }

    /// Create a cast failure error
    pub fn cast_failed(value: impl Into<String>, target: impl Into<String>) -> Self {
        SqlError::CastFailed {
            value: value.into(),
            target: target.into(),
        }
    }

    /// Create an unknown-function error
    pub fn unknown_function(name: impl Into<String>) -> Self {
        SqlError::UnknownFunction { name: name.into() }
    }

    /// Create a bad-argument error
    pub fn bad_argument(function: impl Into<String>, message: impl Into<String>) -> Self {
        SqlError::BadArgument {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Create a bad-assignment error
    pub fn bad_assignment(path: impl Into<String>) -> Self {
        SqlError::BadAssignment { path: path.into() }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        SqlError::Internal {
            message: message.into(),
        }
    }
}

/// Result type for evaluation and plan execution
pub type SqlResult<T> = Result<T, SqlError>;
