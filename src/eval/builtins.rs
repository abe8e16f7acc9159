//! Built-in function table
//!
//! The grammar's expression language exposes a small fixed set of numeric
//! functions; there is no way to define new ones. Trigonometry works in
//! radians. Calling an unknown name, using the wrong arity, or leaving a
//! function's numeric domain is an [`EvalError`].
//!
//! # Supported functions
//!
//! Unary: `sin cos tan asin acos atan sqrt exp log floor ceil abs`
//! Binary: `atan2 pow`

use super::EvalError;
use crate::grammar::value::Value;
use crate::parser::ast::SourceLocation;

/// Dispatch a builtin call. `args` are already evaluated.
pub fn call(
    name: &str,
    args: &[Value],
    location: SourceLocation,
) -> Result<Value, EvalError> {
    match name {
        "sin" | "cos" | "tan" | "asin" | "acos" | "atan" | "sqrt" | "exp" | "log" | "floor"
        | "ceil" | "abs" => {
            let x = expect_args::<1>(name, args, location)?[0];
            unary(name, x, location)
        }
        "atan2" | "pow" => {
            let [y, x] = expect_args::<2>(name, args, location)?;
            Ok(Value::Real(match name {
                "atan2" => y.atan2(x),
                _ => y.powf(x),
            }))
        }
        _ => Err(EvalError::UnknownFunction {
            name: name.to_string(),
            location,
        }),
    }
}

fn expect_args<const N: usize>(
    name: &str,
    args: &[Value],
    location: SourceLocation,
) -> Result<[f64; N], EvalError> {
    if args.len() != N {
        return Err(EvalError::ArgumentCountMismatch {
            function: name.to_string(),
            expected: N,
            got: args.len(),
            location,
        });
    }
    let mut out = [0.0; N];
    for (slot, value) in out.iter_mut().zip(args) {
        *slot = value.as_f64();
    }
    Ok(out)
}

fn unary(name: &str, x: f64, location: SourceLocation) -> Result<Value, EvalError> {
    let domain_error = |f: &str| EvalError::MathDomain {
        function: f.to_string(),
        argument: x,
        location,
    };
    let result = match name {
        "sin" => x.sin(),
        "cos" => x.cos(),
        "tan" => x.tan(),
        "asin" => {
            if !(-1.0..=1.0).contains(&x) {
                return Err(domain_error("asin"));
            }
            x.asin()
        }
        "acos" => {
            if !(-1.0..=1.0).contains(&x) {
                return Err(domain_error("acos"));
            }
            x.acos()
        }
        "atan" => x.atan(),
        "sqrt" => {
            if x < 0.0 {
                return Err(domain_error("sqrt"));
            }
            x.sqrt()
        }
        "exp" => x.exp(),
        "log" => {
            if x <= 0.0 {
                return Err(domain_error("log"));
            }
            x.ln()
        }
        "floor" => x.floor(),
        "ceil" => x.ceil(),
        _ => x.abs(),
    };
    Ok(Value::Real(result))
}
