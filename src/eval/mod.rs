//! Expression evaluation
//!
//! This module evaluates [`Expression`] trees against an [`Environment`]:
//! local bindings (a production's formal parameters) layered over the
//! grammar's constant table. Evaluation is pure — no shared mutable state —
//! so independent environments may evaluate concurrently.
//!
//! Function calls resolve against the fixed table in [`builtins`]; there
//! are no user-defined functions.

pub mod builtins;

use crate::grammar::value::Value;
use crate::parser::ast::{BinOp, Expression, SourceLocation, UnOp};
use rustc_hash::FxHashMap;
use std::fmt;

/// Errors raised while evaluating an expression. Each carries the location
/// of the offending node and enough context to render the failing
/// expression; all of them abort the current run.
#[derive(Debug, Clone)]
pub enum EvalError {
    /// A name bound neither locally nor as a constant.
    UndefinedVariable {
        name: String,
        location: SourceLocation,
    },

    /// A call to a function outside the builtin table.
    UnknownFunction {
        name: String,
        location: SourceLocation,
    },

    /// A builtin called with the wrong number of arguments.
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        got: usize,
        location: SourceLocation,
    },

    /// Division or modulo with a zero divisor.
    DivisionByZero {
        context: String,
        location: SourceLocation,
    },

    /// A builtin applied outside its numeric domain.
    MathDomain {
        function: String,
        argument: f64,
        location: SourceLocation,
    },
}

impl EvalError {
    /// Location of the offending expression node. Not part of [`Display`]
    /// output; wrapping errors report it alongside their own context.
    ///
    /// [`Display`]: fmt::Display
    pub fn location(&self) -> SourceLocation {
        match self {
            EvalError::UndefinedVariable { location, .. }
            | EvalError::UnknownFunction { location, .. }
            | EvalError::ArgumentCountMismatch { location, .. }
            | EvalError::DivisionByZero { location, .. }
            | EvalError::MathDomain { location, .. } => *location,
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UndefinedVariable { name, .. } => {
                write!(f, "Undefined variable '{}'", name)
            }
            EvalError::UnknownFunction { name, .. } => {
                write!(f, "Unknown function '{}'", name)
            }
            EvalError::ArgumentCountMismatch {
                function,
                expected,
                got,
                ..
            } => {
                write!(
                    f,
                    "Function '{}' expects {} argument{}, got {}",
                    function,
                    expected,
                    if *expected == 1 { "" } else { "s" },
                    got
                )
            }
            EvalError::DivisionByZero { context, .. } => {
                write!(f, "Division by zero in '{}'", context)
            }
            EvalError::MathDomain {
                function, argument, ..
            } => {
                write!(f, "Domain error: {}({})", function, argument)
            }
        }
    }
}

impl std::error::Error for EvalError {}

/// Name → value bindings for one evaluation: locals shadow constants.
pub struct Environment<'a> {
    locals: FxHashMap<String, Value>,
    constants: &'a FxHashMap<String, Value>,
}

impl<'a> Environment<'a> {
    pub fn new(constants: &'a FxHashMap<String, Value>) -> Self {
        Self {
            locals: FxHashMap::default(),
            constants,
        }
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.locals.insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.locals
            .get(name)
            .or_else(|| self.constants.get(name))
            .copied()
    }
}

/// Evaluate `expr` against `env`.
pub fn eval(expr: &Expression, env: &Environment) -> Result<Value, EvalError> {
    match expr {
        Expression::Number(value, _) => Ok(*value),

        Expression::Variable(name, location) => {
            env.lookup(name).ok_or_else(|| EvalError::UndefinedVariable {
                name: name.clone(),
                location: *location,
            })
        }

        Expression::Unary { op, operand, .. } => {
            let value = eval(operand, env)?;
            Ok(match op {
                UnOp::Neg => value.neg(),
                UnOp::Not => value.not(),
            })
        }

        Expression::Binary {
            op,
            left,
            right,
            location,
        } => {
            let lhs = eval(left, env)?;
            let rhs = eval(right, env)?;
            match op {
                BinOp::Add => Ok(lhs.add(&rhs)),
                BinOp::Sub => Ok(lhs.sub(&rhs)),
                BinOp::Mul => Ok(lhs.mul(&rhs)),
                BinOp::Div => lhs.div(&rhs).ok_or_else(|| EvalError::DivisionByZero {
                    context: expr.to_string(),
                    location: *location,
                }),
                BinOp::Mod => lhs.rem(&rhs).ok_or_else(|| EvalError::DivisionByZero {
                    context: expr.to_string(),
                    location: *location,
                }),
                BinOp::Eq => Ok(lhs.eq(&rhs)),
                BinOp::Ne => Ok(lhs.ne(&rhs)),
                BinOp::Lt => Ok(lhs.lt(&rhs)),
                BinOp::Le => Ok(lhs.le(&rhs)),
                BinOp::Gt => Ok(lhs.gt(&rhs)),
                BinOp::Ge => Ok(lhs.ge(&rhs)),
                BinOp::And => Ok(lhs.and(&rhs)),
                BinOp::Or => Ok(lhs.or(&rhs)),
            }
        }

        Expression::Call {
            name,
            args,
            location,
        } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval(arg, env)?);
            }
            builtins::call(name, &values, *location)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::Expression as E;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    fn num(n: i64) -> E {
        E::Number(Value::Int(n), loc())
    }

    fn bin(op: BinOp, left: E, right: E) -> E {
        E::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            location: loc(),
        }
    }

    #[test]
    fn locals_shadow_constants() {
        let mut constants = FxHashMap::default();
        constants.insert("x".to_string(), Value::Int(10));
        let mut env = Environment::new(&constants);
        env.bind("x", Value::Int(3));
        let expr = E::Variable("x".to_string(), loc());
        assert_eq!(eval(&expr, &env).unwrap(), Value::Int(3));
    }

    #[test]
    fn undefined_variable_errors() {
        let constants = FxHashMap::default();
        let env = Environment::new(&constants);
        let expr = E::Variable("nope".to_string(), loc());
        assert!(matches!(
            eval(&expr, &env),
            Err(EvalError::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn precedence_is_respected_by_tree_shape() {
        // 2 + 3 * 4 parsed as 2 + (3 * 4)
        let expr = bin(BinOp::Add, num(2), bin(BinOp::Mul, num(3), num(4)));
        let constants = FxHashMap::default();
        let env = Environment::new(&constants);
        assert_eq!(eval(&expr, &env).unwrap(), Value::Int(14));
    }

    #[test]
    fn division_by_zero_reports_expression() {
        let expr = bin(BinOp::Div, num(1), num(0));
        let constants = FxHashMap::default();
        let env = Environment::new(&constants);
        match eval(&expr, &env) {
            Err(EvalError::DivisionByZero { context, .. }) => {
                assert_eq!(context, "1 / 0");
            }
            other => panic!("expected DivisionByZero, got {:?}", other),
        }
    }

    #[test]
    fn logical_operators_on_numbers() {
        let expr = bin(
            BinOp::Or,
            bin(BinOp::And, num(1), num(0)),
            bin(BinOp::Gt, num(2), num(1)),
        );
        let constants = FxHashMap::default();
        let env = Environment::new(&constants);
        assert_eq!(eval(&expr, &env).unwrap(), Value::Int(1));
    }
}
