//! Built-in operations registry.
//!
//! Every operation the language provides natively is listed once in
//! [`BUILTIN_OPS`], whether it is a primitive procedure or a special form.
//!
//! ## Functions vs Special Forms
//!
//! - **Functions**: Receive already evaluated arguments (e.g., `car`, `cons`, `add1`).
//!   They are bound by name in every fresh global environment, so they can be
//!   passed around and rebound like any other value.
//! - **Special Forms**: Receive their operands unevaluated (e.g., `cond`, `lambda`).
//!   The evaluator recognises them by the literal head symbol of a list before
//!   any variable lookup, so user definitions can never shadow them.
//!
//! ## Contracts
//!
//! Primitives check the shape of their arguments and report a
//! [`Error::ContractViolation`] when it is wrong: `car` and `cdr` need a
//! non-empty list, `cons` needs a list as its second argument, `eq?` compares
//! symbols only, and the arithmetic primitives need numbers. These errors are
//! fatal; nothing in the interpreter recovers from them.
//!
//! ## Adding New Operations
//!
//! 1. **Implement the function** following the signature `fn(args: &[Value]) -> Result<Value, Error>`
//! 2. **Add to BUILTIN_OPS** with its Scheme identifier and arity
//! 3. **Add tests** covering the contract and its violations

use crate::Error;
use crate::ast::{BuiltinFn, NumberType, Value};
use crate::evaluator::{
    EvalContext, Environment, eval_and, eval_cond, eval_define, eval_lambda, eval_or, eval_quote,
};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Signature of a special form: unevaluated operands, the current environment
/// and the evaluation context
pub type SpecialFormFn = fn(&[Value], &Environment, EvalContext<'_>) -> Result<Value, Error>;

/// Number of arguments an operation accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    /// Check an argument count against this arity
    pub fn validate(&self, arg_count: usize) -> Result<(), Error> {
        match *self {
            Arity::Exact(n) if arg_count != n => Err(Error::arity_error(n, arg_count)),
            Arity::AtLeast(n) if arg_count < n => Err(Error::arity_error(n, arg_count)),
            _ => Ok(()),
        }
    }
}

/// Represents the implementation of a built-in expression (function or special form)
#[derive(Clone, Copy)]
pub enum OpKind {
    /// Regular function that takes evaluated arguments and returns a value
    Function(BuiltinFn),
    /// Special form that requires access to the environment and unevaluated arguments
    SpecialForm(SpecialFormFn),
}

impl std::fmt::Debug for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpKind::Function(_) => write!(f, "Function(<fn>)"),
            OpKind::SpecialForm(_) => write!(f, "SpecialForm(<fn>)"),
        }
    }
}

/// Definition of a built-in operation
#[derive(Debug, Clone)]
pub struct BuiltinOp {
    /// The Scheme identifier for this operation
    pub scheme_id: &'static str,
    /// The implementation of this operation (function or special form)
    pub op_kind: OpKind,
    /// Expected number of arguments
    pub arity: Arity,
}

impl BuiltinOp {
    /// Check if the given number of arguments is valid for this operation
    pub(crate) fn validate_arity(&self, arg_count: usize) -> Result<(), Error> {
        self.arity.validate(arg_count)
    }
}

//
// Builtin Function Implementations
//

fn contract_violation(op: &str, expected: &str, got: &Value) -> Error {
    Error::ContractViolation(format!(
        "{op} requires {expected}, got {} {got}",
        got.type_name()
    ))
}

fn builtin_car(args: &[Value]) -> Result<Value, Error> {
    let [list] = args else {
        return Err(Error::arity_error(1, args.len()));
    };
    match list {
        Value::List(items) if !items.is_empty() => Ok(items[0].clone()),
        other => Err(contract_violation("car", "a non-empty list", other)),
    }
}

fn builtin_cdr(args: &[Value]) -> Result<Value, Error> {
    let [list] = args else {
        return Err(Error::arity_error(1, args.len()));
    };
    match list {
        Value::List(items) if !items.is_empty() => Ok(Value::List(items[1..].to_vec())),
        other => Err(contract_violation("cdr", "a non-empty list", other)),
    }
}

fn builtin_cons(args: &[Value]) -> Result<Value, Error> {
    let [first, rest] = args else {
        return Err(Error::arity_error(2, args.len()));
    };
    match rest {
        Value::List(tail) => {
            let mut new_list = Vec::with_capacity(tail.len() + 1);
            new_list.push(first.clone());
            new_list.extend_from_slice(tail);
            Ok(Value::List(new_list))
        }
        other => Err(contract_violation("cons", "a list as second argument", other)),
    }
}

fn builtin_null(args: &[Value]) -> Result<Value, Error> {
    let [list] = args else {
        return Err(Error::arity_error(1, args.len()));
    };
    match list {
        Value::List(_) => Ok(Value::Bool(list.is_nil())),
        other => Err(contract_violation("null?", "a list", other)),
    }
}

fn builtin_atom(args: &[Value]) -> Result<Value, Error> {
    let [value] = args else {
        return Err(Error::arity_error(1, args.len()));
    };
    Ok(Value::Bool(value.is_atom()))
}

fn builtin_eq(args: &[Value]) -> Result<Value, Error> {
    match args {
        [Value::Symbol(a), Value::Symbol(b)] => Ok(Value::Bool(a == b)),
        [Value::Symbol(_), other] | [other, _] => {
            Err(contract_violation("eq?", "two symbols", other))
        }
        _ => Err(Error::arity_error(2, args.len())),
    }
}

fn builtin_equal(args: &[Value]) -> Result<Value, Error> {
    let [first, second] = args else {
        return Err(Error::arity_error(2, args.len()));
    };
    // Structural: lists compare element-wise, an atom never equals a list
    Ok(Value::Bool(first == second))
}

fn expect_number(op: &str, args: &[Value]) -> Result<NumberType, Error> {
    match args {
        [Value::Number(n)] => Ok(*n),
        [other] => Err(contract_violation(op, "a number", other)),
        _ => Err(Error::arity_error(1, args.len())),
    }
}

fn builtin_add1(args: &[Value]) -> Result<Value, Error> {
    expect_number("add1", args)?
        .checked_add(1)
        .map(Value::Number)
        .ok_or_else(|| Error::EvalError("Integer overflow in add1".into()))
}

fn builtin_sub1(args: &[Value]) -> Result<Value, Error> {
    expect_number("sub1", args)?
        .checked_sub(1)
        .map(Value::Number)
        .ok_or_else(|| Error::EvalError("Integer overflow in sub1".into()))
}

fn builtin_zero(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(expect_number("zero?", args)? == 0))
}

fn builtin_number(args: &[Value]) -> Result<Value, Error> {
    let [value] = args else {
        return Err(Error::arity_error(1, args.len()));
    };
    Ok(Value::Bool(matches!(value, Value::Number(_))))
}

/// Global registry of all built-in operations.
///
/// Every special form and primitive, special forms first
static BUILTIN_OPS: LazyLock<Vec<BuiltinOp>> = LazyLock::new(|| {
    vec![
        // Special forms
        BuiltinOp {
            scheme_id: "quote",
            op_kind: OpKind::SpecialForm(eval_quote),
            arity: Arity::AtLeast(1),
        },
        BuiltinOp {
            scheme_id: "cond",
            op_kind: OpKind::SpecialForm(eval_cond),
            arity: Arity::Any,
        },
        BuiltinOp {
            scheme_id: "and",
            op_kind: OpKind::SpecialForm(eval_and),
            arity: Arity::Any,
        },
        BuiltinOp {
            scheme_id: "or",
            op_kind: OpKind::SpecialForm(eval_or),
            arity: Arity::Any,
        },
        BuiltinOp {
            scheme_id: "define",
            op_kind: OpKind::SpecialForm(eval_define),
            arity: Arity::AtLeast(2),
        },
        BuiltinOp {
            scheme_id: "lambda",
            op_kind: OpKind::SpecialForm(eval_lambda),
            arity: Arity::AtLeast(2),
        },
        // List operations
        BuiltinOp {
            scheme_id: "car",
            op_kind: OpKind::Function(builtin_car),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            scheme_id: "cdr",
            op_kind: OpKind::Function(builtin_cdr),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            scheme_id: "cons",
            op_kind: OpKind::Function(builtin_cons),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            scheme_id: "null?",
            op_kind: OpKind::Function(builtin_null),
            arity: Arity::Exact(1),
        },
        // Predicates
        BuiltinOp {
            scheme_id: "atom?",
            op_kind: OpKind::Function(builtin_atom),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            scheme_id: "eq?",
            op_kind: OpKind::Function(builtin_eq),
            arity: Arity::Exact(2),
        },
        BuiltinOp {
            scheme_id: "equal?",
            op_kind: OpKind::Function(builtin_equal),
            arity: Arity::Exact(2),
        },
        // Arithmetic
        BuiltinOp {
            scheme_id: "add1",
            op_kind: OpKind::Function(builtin_add1),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            scheme_id: "sub1",
            op_kind: OpKind::Function(builtin_sub1),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            scheme_id: "zero?",
            op_kind: OpKind::Function(builtin_zero),
            arity: Arity::Exact(1),
        },
        BuiltinOp {
            scheme_id: "number?",
            op_kind: OpKind::Function(builtin_number),
            arity: Arity::Exact(1),
        },
    ]
});

/// Lazy static map from scheme_id to BuiltinOp (private - use find_scheme_op)
static BUILTIN_SCHEME: LazyLock<HashMap<&'static str, &'static BuiltinOp>> = LazyLock::new(|| {
    let ops: &'static [BuiltinOp] = BUILTIN_OPS.as_slice();
    ops.iter().map(|op| (op.scheme_id, op)).collect()
});

/// Get all builtin operations (for internal use by evaluator)
pub(crate) fn get_builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS.as_slice()
}

/// Find a builtin operation by its Scheme identifier
pub(crate) fn find_scheme_op(id: &str) -> Option<&'static BuiltinOp> {
    BUILTIN_SCHEME.get(id).copied()
}

/// Find the special form named by a list head, if any
pub(crate) fn find_special_form(id: &str) -> Option<(&'static BuiltinOp, SpecialFormFn)> {
    let op = find_scheme_op(id)?;
    match op.op_kind {
        OpKind::SpecialForm(form) => Some((op, form)),
        OpKind::Function(_) => None,
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::ast::{nil, sym, val};

    /// Micro-helper for success cases
    fn success<T: Into<Value>>(value: T) -> Option<Value> {
        Some(val(value))
    }

    /// Invoke a builtin function through the registry
    fn call_builtin(name: &str, args: &[Value]) -> Result<Value, Error> {
        let op = find_scheme_op(name).unwrap();
        match op.op_kind {
            OpKind::Function(func) => func(args),
            OpKind::SpecialForm(_) => {
                panic!("expected function builtin in tests, got special form: {name}")
            }
        }
    }

    #[test]
    fn test_builtin_ops_registry() {
        let car_op = find_scheme_op("car").unwrap();
        assert_eq!(car_op.arity, Arity::Exact(1));
        assert!(matches!(car_op.op_kind, OpKind::Function(_)));

        for form in ["quote", "cond", "and", "or", "define", "lambda"] {
            let (op, _) = find_special_form(form).unwrap();
            assert_eq!(op.scheme_id, form);
            assert!(matches!(op.op_kind, OpKind::SpecialForm(_)), "{form}");
        }

        assert!(find_special_form("car").is_none());
        assert!(find_special_form("else").is_none());
        assert!(find_scheme_op("unknown").is_none());

        // Every identifier is registered exactly once
        let all_ops = get_builtin_ops();
        let mut ids: Vec<_> = all_ops.iter().map(|op| op.scheme_id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), all_ops.len());
    }

    #[test]
    fn test_arity_validate() {
        assert!(Arity::Exact(2).validate(2).is_ok());
        assert_eq!(Arity::Exact(2).validate(3), Err(Error::arity_error(2, 3)));
        assert!(Arity::AtLeast(1).validate(4).is_ok());
        assert_eq!(Arity::AtLeast(2).validate(1), Err(Error::arity_error(2, 1)));
        assert!(Arity::Any.validate(0).is_ok());
    }

    /// Macro to create test cases, invoking builtins via the registry.
    macro_rules! test {
        ($name:expr, $args:expr, $expected:expr) => {
            ($name, call_builtin($name, $args), $expected)
        };
    }

    #[test]
    fn test_builtin_function_implementations() {
        type TestCase = (&'static str, Result<Value, Error>, Option<Value>);

        let lat = val(["beans", "we", "need"]);
        let nested = val(vec![val(1), val(vec![val(2), val(3)])]);

        let test_cases: Vec<TestCase> = vec![
            // car
            test!("car", &[lat.clone()], success("beans")),
            test!("car", &[val([val([1]), val(2)])], success([1])),
            test!("car", &[nil()], None),
            test!("car", &[sym("hotdog")], None),
            test!("car", &[], None),
            test!("car", &[lat.clone(), lat.clone()], None),
            // cdr
            test!("cdr", &[lat.clone()], success(["we", "need"])),
            test!("cdr", &[val(["only"])], Some(nil())),
            test!("cdr", &[nil()], None),
            test!("cdr", &[val(7)], None),
            // cons
            test!("cons", &[sym("peanut"), val(["butter"])], success(["peanut", "butter"])),
            test!("cons", &[val([1]), nil()], success([val([1])])),
            test!("cons", &[nil(), nil()], success([nil()])),
            test!("cons", &[sym("a"), sym("b")], None),
            test!("cons", &[sym("a")], None),
            // null?
            test!("null?", &[nil()], success(true)),
            test!("null?", &[lat.clone()], success(false)),
            test!("null?", &[sym("spaghetti")], None),
            test!("null?", &[val(0)], None),
            // atom?
            test!("atom?", &[sym("Harry")], success(true)),
            test!("atom?", &[val(14)], success(true)),
            test!("atom?", &[val(false)], success(true)),
            test!("atom?", &[nil()], success(false)),
            test!("atom?", &[lat.clone()], success(false)),
            // eq?
            test!("eq?", &[sym("Harry"), sym("Harry")], success(true)),
            test!("eq?", &[sym("margarine"), sym("butter")], success(false)),
            test!("eq?", &[val(1), val(1)], None),
            test!("eq?", &[sym("a"), val(1)], None),
            test!("eq?", &[nil(), sym("a")], None),
            test!("eq?", &[lat.clone(), lat.clone()], None),
            // equal?
            test!("equal?", &[val(5), val(5)], success(true)),
            test!("equal?", &[val(5), val(6)], success(false)),
            test!("equal?", &[sym("a"), sym("a")], success(true)),
            test!("equal?", &[nested.clone(), nested.clone()], success(true)),
            test!("equal?", &[val([1, 2]), val([1, 3])], success(false)),
            test!("equal?", &[val([1, 2]), val([1, 2, 3])], success(false)),
            test!("equal?", &[sym("a"), val(["a"])], success(false)),
            test!("equal?", &[nil(), nil()], success(true)),
            test!("equal?", &[val(1), val(true)], success(false)),
            test!("equal?", &[val(1)], None),
            // add1 / sub1
            test!("add1", &[val(67)], success(68)),
            test!("add1", &[val(-1)], success(0)),
            test!("add1", &[val(NumberType::MAX)], None),
            test!("add1", &[sym("a")], None),
            test!("sub1", &[val(5)], success(4)),
            test!("sub1", &[val(0)], success(-1)),
            test!("sub1", &[val(NumberType::MIN)], None),
            test!("sub1", &[nil()], None),
            // zero?
            test!("zero?", &[val(0)], success(true)),
            test!("zero?", &[val(1492)], success(false)),
            test!("zero?", &[sym("zero")], None),
            test!("zero?", &[], None),
            // number?
            test!("number?", &[val(76)], success(true)),
            test!("number?", &[sym("tomato")], success(false)),
            test!("number?", &[nil()], success(false)),
        ];

        for (i, (name, result, expected)) in test_cases.into_iter().enumerate() {
            match (result, expected) {
                (Ok(actual), Some(expected)) => {
                    assert_eq!(actual, expected, "#{} {name}: wrong result", i + 1)
                }
                (Err(_), None) => {}
                (Ok(actual), None) => panic!("#{} {name}: expected error, got {actual:?}", i + 1),
                (Err(e), Some(expected)) => {
                    panic!("#{} {name}: expected {expected:?}, got error {e}", i + 1)
                }
            }
        }
    }

    #[test]
    fn test_contract_violations_are_reported_as_such() {
        let err = call_builtin("car", &[nil()]).unwrap_err();
        assert!(matches!(err, Error::ContractViolation(_)));
        assert!(format!("{err}").contains("car requires a non-empty list"));

        let err = call_builtin("eq?", &[val(1), val(2)]).unwrap_err();
        assert!(matches!(err, Error::ContractViolation(_)));
        assert!(format!("{err}").contains("eq? requires two symbols"));

        let err = call_builtin("cons", &[sym("a"), sym("b")]).unwrap_err();
        assert!(matches!(err, Error::ContractViolation(_)));

        let err = call_builtin("null?", &[val(3), val(4)]).unwrap_err();
        assert!(matches!(err, Error::ArityError { .. }));
    }

    #[test]
    fn test_cons_does_not_alias() {
        let tail = val(["b", "c"]);
        let consed = call_builtin("cons", &[sym("a"), tail.clone()]).unwrap();
        let rest = call_builtin("cdr", &[consed.clone()]).unwrap();
        assert_eq!(rest, tail);
        assert_eq!(consed, val(["a", "b", "c"]));
    }
}
