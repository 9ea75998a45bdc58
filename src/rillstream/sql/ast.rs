//! Analyzed-plan types for continuous queries.
//!
//! The parser and logical-plan analyzer live outside this crate; what arrives
//! here is an already resolved [`LogicalPlan`]: expression trees with bound
//! column paths, a window specification, the ordered projection list and the
//! emitter mode. The execution layer consumes these types verbatim.

use std::time::Duration;

/// Expressions as produced by the analyzer
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal values
    Literal(LiteralValue),
    /// Row-value lookup: a top-level field plus an optional nested path
    Column { name: String, path: Vec<PathStep> },
    /// Row-metadata accessor for the event timestamp (`ts()`)
    EventTime,
    /// Function calls: func_name(args...)
    Function { name: String, args: Vec<Expr> },
    /// Unary operations: op expr
    UnaryOp { op: UnaryOperator, expr: Box<Expr> },
    /// Binary operations: expr op expr
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    /// Type cast: CAST(expr AS type)
    Cast { expr: Box<Expr>, target: TypeName },
    /// Wildcard selection; only valid in projection position
    Wildcard,
}

impl Expr {
    /// Shorthand for a top-level column reference without a nested path
    pub fn column(name: impl Into<String>) -> Expr {
        Expr::Column {
            name: name.into(),
            path: Vec::new(),
        }
    }

    /// True if this tree contains a wildcard node anywhere
    pub fn contains_wildcard(&self) -> bool {
        match self {
            Expr::Wildcard => true,
            Expr::Literal(_) | Expr::Column { .. } | Expr::EventTime => false,
            Expr::Function { args, .. } => args.iter().any(Expr::contains_wildcard),
            Expr::UnaryOp { expr, .. } => expr.contains_wildcard(),
            Expr::BinaryOp { left, right, .. } => {
                left.contains_wildcard() || right.contains_wildcard()
            }
            Expr::Cast { expr, .. } => expr.contains_wildcard(),
        }
    }
}

/// One step into a nested Map/Array value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    /// Descend into a map by key
    Key(String),
    /// Descend into an array by position
    Index(usize),
}

/// Literal values in query text
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,

    // String concatenation
    Concat,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    // Logical
    And,
    Or,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Minus,
    Plus,
    IsNull,
    IsNotNull,
}

/// Cast target types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeName {
    Integer,
    Float,
    String,
    Boolean,
    Blob,
    Timestamp,
}

impl TypeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeName::Integer => "INTEGER",
            TypeName::Float => "FLOAT",
            TypeName::String => "STRING",
            TypeName::Boolean => "BOOLEAN",
            TypeName::Blob => "BLOB",
            TypeName::Timestamp => "TIMESTAMP",
        }
    }
}

/// Change-emission mode of a standing query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emitter {
    /// Emit the whole current window every cycle
    Rstream,
    /// Emit rows added relative to the previous cycle
    Istream,
    /// Emit rows dropped relative to the previous cycle
    Dstream,
}

/// Window specification for the input buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSpec {
    /// Keep at most this many rows
    Tuples(u64),
    /// Keep rows whose event timestamp is within this duration of the
    /// most recently ingested tuple
    Seconds(Duration),
}

/// One output column: an expression plus its output name and nested path
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub expr: Expr,
    /// Output name; None for anonymous projections and merging wildcards
    pub alias: Option<String>,
    /// Steps below the alias for nested output assembly
    pub alias_path: Vec<PathStep>,
}

impl Projection {
    /// Projection with an explicit output name
    pub fn aliased(expr: Expr, alias: impl Into<String>) -> Self {
        Projection {
            expr,
            alias: Some(alias.into()),
            alias_path: Vec::new(),
        }
    }

    /// Projection without an output name
    pub fn anonymous(expr: Expr) -> Self {
        Projection {
            expr,
            alias: None,
            alias_path: Vec::new(),
        }
    }
}

/// An analyzed continuous query, ready for physical-plan construction
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalPlan {
    pub emitter: Emitter,
    pub window: WindowSpec,
    /// Ordered projection list; order drives wildcard/override semantics
    pub projections: Vec<Projection>,
    pub filter: Option<Expr>,
    /// True when the query has GROUP BY expressions or aggregate calls;
    /// such plans need a different executor
    pub grouping: bool,
    /// The bound input stream
    pub input_name: String,
}
