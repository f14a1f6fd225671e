//! Errors raised while compiling or executing a query.

use std::fmt;

use crate::graph::{GraphError, Term};

/// Errors that can occur during query compilation or execution.
///
/// Compilation errors (`UnboundVariable`, `DuplicateFactory`, ...) are
/// returned synchronously when a plan is prepared. Execution errors are
/// raised inside a stage worker and reach the caller through the result
/// iterator, exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A variable was referenced that no pattern or output declares.
    UnboundVariable(Term),
    /// A pattern tried to bind a variable that is already bound.
    DuplicateBinding(Term),
    /// A non-variable term was used where a variable is required.
    NotAVariable(Term),
    /// A relation was registered under a name already in use.
    DuplicateFactory(String),
    /// An expression applies a function that no relation provides.
    UnknownFunction(String),
    /// A relation was applied to the wrong number of arguments.
    WrongArity {
        function: String,
        expected: usize,
        found: usize,
    },
    /// An expression read a slot that has no value yet.
    UnsetVariable(Term),
    /// A relation needed a boolean operand and got a term.
    NotBoolean(String),
    /// A pattern block names a graph that was not supplied.
    MissingGraph(String),
    /// The graph store failed.
    Graph(GraphError),
    /// The consumer of a pipe has gone away.
    PipeClosed,
    /// The producer of a pipe vanished without closing it.
    Disconnected,
    /// `get` was called without a preceding successful `has_next`.
    NoSuchElement,
    /// A stage was asked to deliver before being connected.
    StageNotConnected(&'static str),
    /// The worker pool could not be started.
    WorkerPool(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnboundVariable(v) => write!(f, "unbound variable: {v}"),
            Self::DuplicateBinding(v) => write!(f, "variable {v} is already bound"),
            Self::NotAVariable(t) => write!(f, "{t} is not a variable"),
            Self::DuplicateFactory(name) => {
                write!(f, "relation '{name}' is already registered")
            }
            Self::UnknownFunction(name) => write!(f, "unknown function '{name}'"),
            Self::WrongArity {
                function,
                expected,
                found,
            } => write!(
                f,
                "function '{function}' takes {expected} arguments, {found} given"
            ),
            Self::UnsetVariable(v) => write!(f, "variable {v} has no value"),
            Self::NotBoolean(function) => {
                write!(f, "function '{function}' requires boolean operands")
            }
            Self::MissingGraph(name) => write!(f, "no graph supplied for block '{name}'"),
            Self::Graph(e) => write!(f, "graph error: {e}"),
            Self::PipeClosed => write!(f, "pipe closed by consumer"),
            Self::Disconnected => write!(f, "pipe producer exited without closing"),
            Self::NoSuchElement => write!(f, "no element available"),
            Self::StageNotConnected(stage) => write!(f, "{stage} stage is not connected"),
            Self::WorkerPool(message) => write!(f, "worker pool error: {message}"),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Graph(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GraphError> for QueryError {
    fn from(e: GraphError) -> Self {
        Self::Graph(e)
    }
}
