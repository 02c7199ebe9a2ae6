//! Schemer - a minimal interpreter for the language of "The Little Schemer"
//!
//! This crate evaluates the small S-expression language used by introductory
//! recursion exercises: integers, booleans, symbols, lists, and the handful of
//! primitives and special forms needed to define recursive functions over them.
//!
//! ```scheme
//! (define length
//!   (lambda (lat)
//!     (cond ((null? lat) 0)
//!           (else (add1 (length (cdr lat)))))))
//! ```
//!
//! ## Soft Semantics
//!
//! The language is deliberately forgiving where a conventional Lisp would
//! raise an error:
//! - Unbound symbols evaluate to themselves
//! - A `cond` with no matching clause yields an unspecified value
//! - Applying a non-procedure returns the evaluated list unapplied
//! - Closures tolerate arity mismatches (configurable, see [`evaluator::EvalConfig`])
//!
//! Only broken primitive contracts, such as `(car (quote ()))`, are errors, and
//! those are never caught inside the engine.
//!
//! ## Modules
//!
//! - `scheme`: tokenizer and parser from text to [`ast::Value`] trees
//! - `evaluator`: environments, special forms and procedure application
//! - `builtinops`: registry of primitives and special forms
//! - `engine`: the `run(text)` entry point

use std::fmt;

/// Error types for the interpreter
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A primitive received an argument of the wrong shape, e.g. `car` of an empty list
    ContractViolation(String),
    EvalError(String),
    /// A special form was written with operands of the wrong kind
    TypeError(String),
    ArityError {
        expected: usize,
        got: usize,
        expression: Option<String>, // Optional expression context
    },
}

impl Error {
    /// Create an ArityError without expression context
    pub fn arity_error(expected: usize, got: usize) -> Self {
        Error::ArityError {
            expected,
            got,
            expression: None,
        }
    }

    /// Create an ArityError with expression context
    pub fn arity_error_with_expr(expected: usize, got: usize, expression: String) -> Self {
        Error::ArityError {
            expected,
            got,
            expression: Some(expression),
        }
    }

    /// Attach expression context to an ArityError that doesn't have any yet
    pub(crate) fn with_expression(self, expression: impl fmt::Display) -> Self {
        match self {
            Error::ArityError {
                expected,
                got,
                expression: None,
            } => Error::arity_error_with_expr(expected, got, expression.to_string()),
            other => other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ContractViolation(msg) => write!(f, "Contract violation: {msg}"),
            Error::EvalError(msg) => write!(f, "EvaluationError: {msg}"),
            Error::TypeError(msg) => write!(f, "Type error: {msg}"),
            Error::ArityError {
                expected,
                got,
                expression,
            } => match expression {
                Some(expr) => write!(
                    f,
                    "ArityError: expression {expr}: expected {expected} arguments, got {got}"
                ),
                None => write!(
                    f,
                    "ArityError: function expected {expected} arguments but got {got}"
                ),
            },
        }
    }
}

impl std::error::Error for Error {}

pub mod ast;
pub mod builtinops;
pub mod engine;
pub mod evaluator;
pub mod scheme;

pub use engine::{Engine, run};
