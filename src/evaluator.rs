use crate::Error;
use crate::ast::{BuiltinFn, Value, nil};
use crate::builtinops::{Arity, OpKind, find_special_form, get_builtin_ops};
use log::{debug, trace};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Symbol that counts as a true test when it appears directly as a `cond` test
pub const ELSE_KEYWORD: &str = "else";

/// Which environment a closure's call frame extends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scoping {
    /// The frame extends the environment captured when the `lambda` was evaluated
    #[default]
    Lexical,
    /// The frame extends the environment of the call site
    Dynamic,
}

/// What happens when a closure is called with the wrong number of arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArityPolicy {
    /// Bind pairwise up to the shorter list: extra arguments are dropped and
    /// missing parameters stay unbound (so they evaluate to their own name)
    #[default]
    Lenient,
    /// Report an ArityError
    Strict,
}

/// Evaluation settings, fixed for the lifetime of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvalConfig {
    pub scoping: Scoping,
    pub arity_policy: ArityPolicy,
    /// Maximum nesting of evaluation calls; `None` recurses until the host stack runs out
    pub max_depth: Option<usize>,
}

/// Per-call evaluation state threaded through the evaluator and special forms
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    config: &'a EvalConfig,
    depth: usize,
}

impl<'a> EvalContext<'a> {
    pub(crate) fn new(config: &'a EvalConfig) -> Self {
        EvalContext { config, depth: 0 }
    }

    fn deeper(self) -> Self {
        EvalContext {
            depth: self.depth + 1,
            ..self
        }
    }

    fn check_depth(&self) -> Result<(), Error> {
        match self.config.max_depth {
            Some(max) if self.depth >= max => Err(Error::EvalError(format!(
                "Evaluation depth limit exceeded (max: {max})"
            ))),
            _ => Ok(()),
        }
    }
}

#[derive(Default)]
struct Frame {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Environment>,
}

/// Environment for variable bindings: a shared handle to a chain of frames,
/// innermost first.
///
/// Cloning an Environment clones the handle, not the bindings, so a closure
/// and the frame that created it observe the same later definitions.
#[derive(Clone, Default)]
pub struct Environment(Rc<Frame>);

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new empty frame whose parent is this environment
    pub fn extend(&self) -> Self {
        Environment(Rc::new(Frame {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(self.clone()),
        }))
    }

    /// Bind a name in the innermost frame
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.0.bindings.borrow_mut().insert(name.into(), value);
    }

    /// The outermost frame of the chain
    pub fn global(&self) -> Environment {
        let mut env = self;
        while let Some(parent) = &env.0.parent {
            env = parent;
        }
        env.clone()
    }

    /// Look a name up, innermost frame first
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.0.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.0.parent.as_ref().and_then(|parent| parent.lookup(name))
    }

    /// Register a native function in this frame.
    ///
    /// # Example
    /// ```
    /// use schemer::Error;
    /// use schemer::ast::Value;
    /// use schemer::builtinops::Arity;
    /// use schemer::evaluator::create_global_env;
    ///
    /// fn hotdog(_args: &[Value]) -> Result<Value, Error> {
    ///     Ok(Value::Symbol("hotdog".into()))
    /// }
    ///
    /// let env = create_global_env();
    /// env.register_builtin_function("hotdog", Arity::Exact(0), hotdog);
    /// assert!(env.lookup("hotdog").is_some());
    /// ```
    pub fn register_builtin_function(&self, name: &str, arity: Arity, func: BuiltinFn) {
        self.define(
            name,
            Value::Builtin {
                name: name.to_owned(),
                arity,
                func,
            },
        );
    }
}

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Values are left out: the global frame usually holds closures that point back to it
        let mut names: Vec<String> = self.0.bindings.borrow().keys().cloned().collect();
        names.sort();
        f.debug_struct("Environment")
            .field("bindings", &names)
            .field("parent", &self.0.parent)
            .finish()
    }
}

/// Evaluate an expression with the default configuration (public API)
///
/// `in_test_position` is true only when `expr` is the test of a `cond` clause;
/// there, and only there, the symbol `else` is true.
pub fn eval(expr: &Value, env: &Environment, in_test_position: bool) -> Result<Value, Error> {
    let config = EvalConfig::default();
    eval_with_context(expr, env, in_test_position, EvalContext::new(&config))
}

/// Evaluate an expression under an explicit evaluation context
pub(crate) fn eval_with_context(
    expr: &Value,
    env: &Environment,
    in_test_position: bool,
    ctx: EvalContext<'_>,
) -> Result<Value, Error> {
    ctx.check_depth()?;
    match expr {
        Value::Symbol(name) if in_test_position && name == ELSE_KEYWORD => Ok(Value::Bool(true)),

        // Unbound symbols evaluate to themselves
        Value::Symbol(name) => Ok(env.lookup(name).unwrap_or_else(|| expr.clone())),

        Value::List(elements) => eval_list(elements, env, ctx),

        // Self-evaluating forms
        Value::Number(_)
        | Value::Bool(_)
        | Value::Builtin { .. }
        | Value::Closure { .. }
        | Value::Unspecified => Ok(expr.clone()),
    }
}

/// Helper function to evaluate a list of argument expressions with depth tracking
fn eval_args(args: &[Value], env: &Environment, ctx: EvalContext<'_>) -> Result<Vec<Value>, Error> {
    args.iter()
        .map(|arg| eval_with_context(arg, env, false, ctx.deeper()))
        .collect()
}

/// Evaluate a list expression: special form, application, or plain data
fn eval_list(elements: &[Value], env: &Environment, ctx: EvalContext<'_>) -> Result<Value, Error> {
    if elements.is_empty() {
        return Ok(nil());
    }

    // Special forms are recognised by their literal head, before any lookup
    if let [Value::Symbol(head), operands @ ..] = elements
        && let Some((op, special_form)) = find_special_form(head)
    {
        op.validate_arity(operands.len())
            .map_err(|err| err.with_expression(Value::List(elements.to_vec())))?;
        return special_form(operands, env, ctx);
    }

    let mut evaluated = eval_args(elements, env, ctx)?.into_iter();
    let head = evaluated.next();
    let args: Vec<Value> = evaluated.collect();

    match head {
        Some(Value::Builtin { name, arity, func }) => {
            trace!("apply builtin {name} to {} argument(s)", args.len());
            arity
                .validate(args.len())
                .map_err(|err| err.with_expression(&name))?;
            func(&args)
        }
        Some(Value::Closure {
            params,
            body,
            env: captured,
        }) => apply_closure(&params, &body, &captured, args, env, ctx),
        // Not a procedure: the evaluated list is the result
        Some(other) => {
            let mut list = Vec::with_capacity(args.len() + 1);
            list.push(other);
            list.extend(args);
            Ok(Value::List(list))
        }
        None => Ok(nil()),
    }
}

/// Call a closure: bind its parameters in a new frame and evaluate its body there
fn apply_closure(
    params: &[String],
    body: &Value,
    captured: &Environment,
    args: Vec<Value>,
    caller: &Environment,
    ctx: EvalContext<'_>,
) -> Result<Value, Error> {
    trace!("apply closure ({}) to {} argument(s)", params.join(" "), args.len());

    if ctx.config.arity_policy == ArityPolicy::Strict && params.len() != args.len() {
        return Err(Error::arity_error_with_expr(
            params.len(),
            args.len(),
            format!("(lambda ({}) {body})", params.join(" ")),
        ));
    }

    let frame = match ctx.config.scoping {
        Scoping::Lexical => captured.extend(),
        Scoping::Dynamic => caller.extend(),
    };
    for (param, arg) in params.iter().zip(args) {
        frame.define(param.as_str(), arg);
    }

    eval_with_context(body, &frame, false, ctx.deeper())
}

/// Evaluate quote special form
pub(crate) fn eval_quote(
    args: &[Value],
    _env: &Environment,
    _ctx: EvalContext<'_>,
) -> Result<Value, Error> {
    match args {
        [datum, ..] => Ok(datum.clone()),
        [] => Err(Error::arity_error(1, 0)),
    }
}

/// Evaluate cond special form
///
/// Each clause is `(test consequence)`. Tests are evaluated in test position
/// until one yields `#t`; an exhausted cond is Unspecified.
pub(crate) fn eval_cond(
    clauses: &[Value],
    env: &Environment,
    ctx: EvalContext<'_>,
) -> Result<Value, Error> {
    for clause in clauses {
        let Value::List(parts) = clause else {
            return Err(Error::TypeError(format!(
                "cond clause must be a list, got {clause}"
            )));
        };
        let [test, consequence, ..] = parts.as_slice() else {
            return Err(Error::TypeError(format!(
                "cond clause must have a test and a consequence: {clause}"
            )));
        };

        let outcome = eval_with_context(test, env, true, ctx.deeper())?;
        if matches!(outcome, Value::Bool(true)) {
            return eval_with_context(consequence, env, false, ctx.deeper());
        }
    }

    Ok(Value::Unspecified)
}

/// Evaluate define special form: always binds in the global frame
pub(crate) fn eval_define(
    args: &[Value],
    env: &Environment,
    ctx: EvalContext<'_>,
) -> Result<Value, Error> {
    match args {
        [Value::Symbol(name), expr, ..] => {
            let value = eval_with_context(expr, env, false, ctx.deeper())?;
            debug!("define {name} = {value}");
            env.global().define(name.as_str(), value);
            Ok(Value::Unspecified)
        }
        [other, _, ..] => Err(Error::TypeError(format!(
            "define requires a symbol, got {other}"
        ))),
        _ => Err(Error::arity_error(2, args.len())),
    }
}

/// Evaluate lambda special form
pub(crate) fn eval_lambda(
    args: &[Value],
    env: &Environment,
    _ctx: EvalContext<'_>,
) -> Result<Value, Error> {
    match args {
        [Value::List(param_list), body, ..] => {
            let params = param_list
                .iter()
                .map(|param| match param {
                    Value::Symbol(name) => Ok(name.clone()),
                    other => Err(Error::TypeError(format!(
                        "Lambda parameters must be symbols, got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Value::Closure {
                params,
                body: Rc::new(body.clone()),
                env: env.clone(),
            })
        }
        [_, _, ..] => Err(Error::TypeError(
            "Lambda parameters must be a list".to_owned(),
        )),
        _ => Err(Error::arity_error(2, args.len())),
    }
}

/// `and` stops at the first operand that is not `#t`, `or` at the first that is.
/// Only `#t` counts as true.
macro_rules! boolean_logic_op {
    ($name:ident, $short_circuit:literal) => {
        pub(crate) fn $name(
            args: &[Value],
            env: &Environment,
            ctx: EvalContext<'_>,
        ) -> Result<Value, Error> {
            for arg in args {
                let result = eval_with_context(arg, env, false, ctx.deeper())?;
                if matches!(result, Value::Bool(true)) == $short_circuit {
                    return Ok(Value::Bool($short_circuit));
                }
            }
            Ok(Value::Bool(!$short_circuit))
        }
    };
}

boolean_logic_op!(eval_and, false);
boolean_logic_op!(eval_or, true);

/// Create a global environment with built-in functions
pub fn create_global_env() -> Environment {
    let env = Environment::new();

    for builtin_op in get_builtin_ops() {
        if let OpKind::Function(func) = builtin_op.op_kind {
            env.register_builtin_function(builtin_op.scheme_id, builtin_op.arity, func);
        }
    }

    env
}
