//! The engine: one global environment plus the configuration used to evaluate
//! source text against it.
//!
//! ```
//! use schemer::Engine;
//! use schemer::ast::Value;
//!
//! let mut engine = Engine::new();
//! engine.run("(define lat? (lambda (l) (cond ((null? l) #t) ((atom? (car l)) (lat? (cdr l))) (else #f))))").unwrap();
//! let result = engine.run("(lat? (quote (bacon and eggs)))").unwrap();
//! assert_eq!(result, Value::Bool(true));
//! ```

use crate::Error;
use crate::ast::{BuiltinFn, Value};
use crate::builtinops::Arity;
use crate::evaluator::{EvalConfig, EvalContext, Environment, create_global_env, eval_with_context};
use crate::scheme::parse_program;
use log::debug;

/// An interpreter instance with its own global environment
///
/// Engines share nothing with each other. Evaluation takes `&mut self`, so a
/// single engine never runs two programs at once.
#[derive(Debug)]
pub struct Engine {
    global: Environment,
    config: EvalConfig,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EvalConfig::default())
    }

    pub fn with_config(config: EvalConfig) -> Self {
        Engine {
            global: create_global_env(),
            config,
        }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// The global frame, where `define` binds and builtins live
    pub fn global_env(&self) -> &Environment {
        &self.global
    }

    /// Make a native function callable from programs run by this engine
    pub fn register_builtin_function(&mut self, name: &str, arity: Arity, func: BuiltinFn) {
        self.global.register_builtin_function(name, arity, func);
    }

    /// Evaluate an already parsed expression in the global environment
    pub fn eval(&mut self, expr: &Value) -> Result<Value, Error> {
        eval_with_context(expr, &self.global, false, EvalContext::new(&self.config))
    }

    /// Evaluate every top-level form of `text` in order and return all their values
    pub fn run_all(&mut self, text: &str) -> Result<Vec<Value>, Error> {
        let Value::List(forms) = parse_program(text) else {
            return Ok(Vec::new());
        };
        debug!("running {} top-level form(s)", forms.len());

        forms.iter().map(|form| self.eval(form)).collect()
    }

    /// Evaluate every top-level form of `text` in order and return the value
    /// of the **first** one. The remaining forms run for their side effects
    /// (typically `define`). Empty input yields Unspecified.
    pub fn run(&mut self, text: &str) -> Result<Value, Error> {
        Ok(self
            .run_all(text)?
            .into_iter()
            .next()
            .unwrap_or(Value::Unspecified))
    }
}

/// Evaluate `text` in a fresh engine
pub fn run(text: &str) -> Result<Value, Error> {
    Engine::new().run(text)
}
