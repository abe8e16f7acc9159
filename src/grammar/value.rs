//! Numeric value representation
//!
//! This module defines [`Value`], the tagged numeric scalar flowing through
//! the whole engine: constants, bound module parameters, and expression
//! evaluation results are all `Value`s.
//!
//! # Promotion rules
//!
//! Arithmetic between two `Int`s stays `Int` (division truncates toward
//! zero); as soon as either operand is `Real` the result is `Real`, and an
//! `Int` operation that overflows `i64` also widens its result to `Real`.
//! Comparison and logical operators yield `Int(0)` / `Int(1)` so boolean
//! results remain usable in arithmetic context. Division and modulo with a
//! zero divisor return `None` and are turned into evaluation errors by the
//! caller.

use std::fmt;

/// A tagged numeric scalar: integer or real.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Real(f64),
}

impl Value {
    /// Boolean truthiness: any non-zero value is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Real(r) => *r != 0.0,
        }
    }

    /// Encode a boolean as `Int(1)` / `Int(0)`.
    pub fn from_bool(b: bool) -> Value {
        Value::Int(if b { 1 } else { 0 })
    }

    /// Widen to `f64` regardless of tag.
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Int(n) => *n as f64,
            Value::Real(r) => *r,
        }
    }

    /// Truncate to `i64` regardless of tag.
    pub fn as_int(&self) -> i64 {
        match self {
            Value::Int(n) => *n,
            Value::Real(r) => *r as i64,
        }
    }

    pub fn add(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => match a.checked_add(*b) {
                Some(n) => Value::Int(n),
                None => Value::Real(*a as f64 + *b as f64),
            },
            _ => Value::Real(self.as_f64() + other.as_f64()),
        }
    }

    pub fn sub(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => match a.checked_sub(*b) {
                Some(n) => Value::Int(n),
                None => Value::Real(*a as f64 - *b as f64),
            },
            _ => Value::Real(self.as_f64() - other.as_f64()),
        }
    }

    pub fn mul(&self, other: &Value) -> Value {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => match a.checked_mul(*b) {
                Some(n) => Value::Int(n),
                None => Value::Real(*a as f64 * *b as f64),
            },
            _ => Value::Real(self.as_f64() * other.as_f64()),
        }
    }

    /// Checked division: `None` when the divisor is zero.
    pub fn div(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (_, Value::Int(0)) => None,
            // i64::MIN / -1 is the one overflowing case.
            (Value::Int(a), Value::Int(b)) => Some(match a.checked_div(*b) {
                Some(n) => Value::Int(n),
                None => Value::Real(*a as f64 / *b as f64),
            }),
            _ => {
                if other.as_f64() == 0.0 {
                    None
                } else {
                    Some(Value::Real(self.as_f64() / other.as_f64()))
                }
            }
        }
    }

    /// Checked modulo: `None` when the divisor is zero.
    pub fn rem(&self, other: &Value) -> Option<Value> {
        match (self, other) {
            (_, Value::Int(0)) => None,
            (Value::Int(a), Value::Int(b)) => Some(match a.checked_rem(*b) {
                Some(n) => Value::Int(n),
                None => Value::Real(*a as f64 % *b as f64),
            }),
            _ => {
                if other.as_f64() == 0.0 {
                    None
                } else {
                    Some(Value::Real(self.as_f64() % other.as_f64()))
                }
            }
        }
    }

    pub fn neg(&self) -> Value {
        match self {
            Value::Int(n) => match n.checked_neg() {
                Some(m) => Value::Int(m),
                None => Value::Real(-(*n as f64)),
            },
            Value::Real(r) => Value::Real(-r),
        }
    }

    pub fn not(&self) -> Value {
        Value::from_bool(!self.is_truthy())
    }

    pub fn eq(&self, other: &Value) -> Value {
        Value::from_bool(self.as_f64() == other.as_f64())
    }

    pub fn ne(&self, other: &Value) -> Value {
        Value::from_bool(self.as_f64() != other.as_f64())
    }

    pub fn lt(&self, other: &Value) -> Value {
        Value::from_bool(self.as_f64() < other.as_f64())
    }

    pub fn le(&self, other: &Value) -> Value {
        Value::from_bool(self.as_f64() <= other.as_f64())
    }

    pub fn gt(&self, other: &Value) -> Value {
        Value::from_bool(self.as_f64() > other.as_f64())
    }

    pub fn ge(&self, other: &Value) -> Value {
        Value::from_bool(self.as_f64() >= other.as_f64())
    }

    pub fn and(&self, other: &Value) -> Value {
        Value::from_bool(self.is_truthy() && other.is_truthy())
    }

    pub fn or(&self, other: &Value) -> Value {
        Value::from_bool(self.is_truthy() || other.is_truthy())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            // {:?} keeps a trailing ".0" on whole reals so the printed form
            // re-lexes as a real literal.
            Value::Real(r) => write!(f, "{:?}", r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_arithmetic_stays_int() {
        assert_eq!(Value::Int(7).add(&Value::Int(3)), Value::Int(10));
        assert_eq!(Value::Int(7).div(&Value::Int(2)), Some(Value::Int(3)));
        assert_eq!(Value::Int(7).rem(&Value::Int(2)), Some(Value::Int(1)));
    }

    #[test]
    fn mixed_arithmetic_promotes_to_real() {
        assert_eq!(Value::Int(7).add(&Value::Real(0.5)), Value::Real(7.5));
        assert_eq!(Value::Real(1.0).mul(&Value::Int(4)), Value::Real(4.0));
        assert_eq!(Value::Int(7).div(&Value::Real(2.0)), Some(Value::Real(3.5)));
    }

    #[test]
    fn int_overflow_promotes_to_real() {
        let max = Value::Int(i64::MAX);
        let min = Value::Int(i64::MIN);
        assert_eq!(max.add(&Value::Int(1)), Value::Real(i64::MAX as f64 + 1.0));
        assert_eq!(min.sub(&Value::Int(1)), Value::Real(i64::MIN as f64 - 1.0));
        assert_eq!(max.mul(&Value::Int(2)), Value::Real(i64::MAX as f64 * 2.0));
        assert_eq!(min.neg(), Value::Real(-(i64::MIN as f64)));
        assert_eq!(
            min.div(&Value::Int(-1)),
            Some(Value::Real(-(i64::MIN as f64)))
        );
        assert_eq!(min.rem(&Value::Int(-1)), Some(Value::Real(0.0)));
    }

    #[test]
    fn zero_divisor_returns_none() {
        assert_eq!(Value::Int(1).div(&Value::Int(0)), None);
        assert_eq!(Value::Real(1.0).div(&Value::Real(0.0)), None);
        assert_eq!(Value::Int(1).rem(&Value::Int(0)), None);
    }

    #[test]
    fn comparisons_yield_zero_or_one() {
        assert_eq!(Value::Int(2).lt(&Value::Real(2.5)), Value::Int(1));
        assert_eq!(Value::Int(2).gt(&Value::Real(2.5)), Value::Int(0));
        assert_eq!(Value::Int(2).eq(&Value::Real(2.0)), Value::Int(1));
    }

    #[test]
    fn booleans_compose_with_arithmetic() {
        let b = Value::Int(3).gt(&Value::Int(1));
        assert_eq!(b.add(&Value::Int(1)), Value::Int(2));
    }

    #[test]
    fn display_round_trips_tag() {
        assert_eq!(Value::Int(4).to_string(), "4");
        assert_eq!(Value::Real(4.0).to_string(), "4.0");
        assert_eq!(Value::Real(0.25).to_string(), "0.25");
    }
}
