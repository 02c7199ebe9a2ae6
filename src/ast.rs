//! This module defines the core value type shared by the parser and the evaluator.
//! A parsed program and the result of evaluating it have the same shape: the
//! [`Value`] enum covers atoms (numbers, symbols, booleans), lists, and the
//! procedure values that only evaluation can produce. Helper functions such as
//! [`val`], [`sym`], and [`nil`] keep tree construction in tests short, and the
//! `From` conversions let Rust literals, arrays and vectors become Values directly.

use crate::Error;
use crate::builtinops::Arity;
use crate::evaluator::Environment;
use std::rc::Rc;

/// Type alias for number values in interpreter
pub(crate) type NumberType = i64;

/// Signature shared by every primitive procedure
pub type BuiltinFn = fn(&[Value]) -> Result<Value, Error>;

/// Core value type in interpreter
///
/// Lists own their elements. Primitives that "modify" a list (`cons`, `cdr`)
/// always build a new one, so two list values never share storage.
#[derive(Clone)]
pub enum Value {
    /// Numbers (integers only)
    Number(NumberType),
    /// Symbols (identifiers), also the result of evaluating an unbound name
    Symbol(String),
    /// Boolean values
    Bool(bool),
    /// Lists, the empty list included
    List(Vec<Value>),
    /// Primitive procedures, compared by name
    Builtin {
        name: String,
        arity: Arity,
        func: BuiltinFn,
    },
    /// User-defined procedures (params, body, environment at creation)
    Closure {
        params: Vec<String>,
        body: Rc<Value>,
        env: Environment,
    },
    /// Unspecified values (e.g., return value of define)
    /// These values never equal themselves or any other value
    Unspecified,
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::List(list) => {
                write!(f, "List(")?;
                for (i, v) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v:?}")?;
                }
                write!(f, ")")
            }
            Value::Builtin { name, .. } => write!(f, "Builtin({name})"),
            // The captured environment usually contains this closure, so it is not printed
            Value::Closure { params, body, .. } => {
                write!(f, "Closure(params={params:?}, body={body:?})")
            }
            Value::Unspecified => write!(f, "Unspecified"),
        }
    }
}

// From trait implementations for Value - enables .into() conversion
impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Symbol(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Symbol(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_integer {
    ($int_type:ty) => {
        impl From<$int_type> for Value {
            fn from(n: $int_type) -> Self {
                Value::Number(n as NumberType)
            }
        }
    };
}

impl_from_integer!(i32);
impl_from_integer!(NumberType); // Special case - no casting

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(|x| x.into()).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::List(arr.into_iter().map(|x| x.into()).collect())
    }
}

/// Helper function for creating symbols
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::Symbol(name.as_ref().to_owned())
}

/// Helper function for creating Values - works great in mixed lists!
/// Accepts any type that can be converted to Value
#[cfg_attr(not(test), expect(dead_code))]
pub(crate) fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper function for creating empty lists (nil)
pub(crate) fn nil() -> Value {
    Value::List(vec![])
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Bool(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::List(elements) => {
                write!(f, "(")?;
                for (i, elem) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
            Value::Builtin { name, .. } => write!(f, "#<builtin:{name}>"),
            Value::Closure { .. } => write!(f, "#<procedure>"),
            Value::Unspecified => write!(f, "#<unspecified>"),
        }
    }
}

impl Value {
    /// Check if a value represents nil (empty list)
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::List(list) if list.is_empty())
    }

    /// Anything that is not a list is an atom, procedures included
    pub fn is_atom(&self) -> bool {
        !matches!(self, Value::List(_))
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Symbol(_) => "symbol",
            Value::Bool(_) => "boolean",
            Value::List(_) => "list",
            Value::Builtin { .. } | Value::Closure { .. } => "procedure",
            Value::Unspecified => "unspecified",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Builtin { name: n1, .. }, Value::Builtin { name: n2, .. }) => {
                // Compare builtins by name, not function pointer
                n1 == n2
            }
            (
                Value::Closure {
                    params: p1,
                    body: b1,
                    env: e1,
                },
                Value::Closure {
                    params: p2,
                    body: b2,
                    env: e2,
                },
            ) => p1 == p2 && b1 == b2 && e1 == e2,
            (Value::Unspecified, _) | (_, Value::Unspecified) => false, // Unspecified never equals anything
            _ => false, // Different variants are never equal
        }
    }
}

#[cfg(test)]
mod helper_function_tests {
    use super::*;

    #[test]
    fn test_helper_functions_data_driven() {
        let test_cases = vec![
            (val(42), Value::Number(42)),
            (val(-17), Value::Number(-17)),
            (val(NumberType::MAX), Value::Number(NumberType::MAX)),
            (val(true), Value::Bool(true)),
            (val("beans"), Value::Symbol("beans".to_owned())),
            (sym("null?"), Value::Symbol("null?".to_owned())),
            (sym(String::from("lat")), Value::Symbol("lat".to_owned())),
            (nil(), Value::List(vec![])),
            (
                val([1, 2, 3]),
                Value::List(vec![Value::Number(1), Value::Number(2), Value::Number(3)]),
            ),
            (
                val(vec![sym("a"), val(1), val(true), nil()]),
                Value::List(vec![
                    Value::Symbol("a".to_owned()),
                    Value::Number(1),
                    Value::Bool(true),
                    Value::List(vec![]),
                ]),
            ),
        ];

        for (i, (actual, expected)) in test_cases.iter().enumerate() {
            assert_eq!(actual, expected, "Test case {} failed", i + 1);
        }
    }

    #[test]
    fn test_display() {
        let cases = vec![
            (val(42), "42"),
            (val(-3), "-3"),
            (sym("jelly"), "jelly"),
            (val(true), "#t"),
            (val(false), "#f"),
            (nil(), "()"),
            (val(vec![sym("a"), val([1, 2]), nil()]), "(a (1 2) ())"),
            (Value::Unspecified, "#<unspecified>"),
        ];

        for (value, expected) in cases {
            assert_eq!(format!("{value}"), expected);
        }
    }

    #[test]
    fn test_predicates() {
        assert!(nil().is_nil());
        assert!(!val([1]).is_nil());
        assert!(!val(0).is_nil());

        assert!(sym("a").is_atom());
        assert!(val(7).is_atom());
        assert!(Value::Unspecified.is_atom());
        assert!(!nil().is_atom());

        assert_eq!(val([1]).type_name(), "list");
        assert_eq!(val(false).type_name(), "boolean");
    }

    #[test]
    fn test_unspecified_values() {
        // Unspecified never equals anything, including itself
        let unspec = Value::Unspecified;
        assert_ne!(unspec, unspec);
        assert_ne!(unspec, Value::Unspecified);
        assert_ne!(unspec, nil());
    }

    #[test]
    fn test_atom_never_equals_list() {
        assert_ne!(sym("a"), val(["a"]));
        assert_ne!(val(1), val([1]));
        assert_ne!(val(1), val(true));
    }
}
