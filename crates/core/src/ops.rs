//! Operator and function semantics over [`Value`].
//!
//! Every function here is total: an operand combination an operator does not
//! define produces [`Value::Invalid`].

use std::cmp::Ordering;

use crate::lexer::{Function, Operator};
use crate::value::Value;

/// Apply a binary operator.
pub fn binary(op: Operator, lhs: &Value, rhs: &Value) -> Value {
    match op {
        Operator::Add => add(lhs, rhs),
        Operator::Sub => numeric(lhs, rhs, |a, b| Some(a - b)),
        Operator::Mul => numeric(lhs, rhs, |a, b| Some(a * b)),
        Operator::Div => numeric(lhs, rhs, |a, b| (b != 0.0).then(|| a / b)),
        Operator::Rem => numeric(lhs, rhs, |a, b| (b != 0.0).then(|| a % b)),
        Operator::Pow => numeric(lhs, rhs, |a, b| {
            let r = a.powf(b);
            r.is_finite().then_some(r)
        }),
        Operator::Eq => equality(lhs, rhs, true),
        Operator::Ne => equality(lhs, rhs, false),
        Operator::Gt => ordering(lhs, rhs, |o| o == Ordering::Greater),
        Operator::Lt => ordering(lhs, rhs, |o| o == Ordering::Less),
        Operator::Ge => ordering(lhs, rhs, |o| o != Ordering::Less),
        Operator::Le => ordering(lhs, rhs, |o| o != Ordering::Greater),
        Operator::And => match (lhs.as_bool(), rhs.as_bool()) {
            (Some(a), Some(b)) => Value::Boolean(a && b),
            _ => Value::Invalid,
        },
        Operator::Xor => match (lhs.as_bool(), rhs.as_bool()) {
            (Some(a), Some(b)) => Value::Boolean(a ^ b),
            _ => Value::Invalid,
        },
        // A side that is not a boolean counts as false.
        Operator::Or => Value::Boolean(lhs.as_bool().unwrap_or(false) || rhs.as_bool().unwrap_or(false)),
        Operator::Not => Value::Invalid,
    }
}

/// Apply a unary operator.
pub fn unary(op: Operator, operand: &Value) -> Value {
    match (op, operand) {
        (Operator::Not, Value::Boolean(b)) => Value::Boolean(!b),
        _ => Value::Invalid,
    }
}

/// Apply a built-in function.
pub fn call(func: Function, arg: &Value) -> Value {
    match func {
        Function::IsNull => Value::Boolean(arg.is_invalid()),
    }
}

fn add(lhs: &Value, rhs: &Value) -> Value {
    match (lhs, rhs) {
        (Value::Invalid, _) | (_, Value::Invalid) => Value::Invalid,
        (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
        (Value::Text(_), _) | (_, Value::Text(_)) => Value::Text(format!("{}{}", lhs, rhs)),
        _ => Value::Invalid,
    }
}

fn numeric(lhs: &Value, rhs: &Value, f: impl Fn(f64, f64) -> Option<f64>) -> Value {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => f(*a, *b).map_or(Value::Invalid, Value::Number),
        _ => Value::Invalid,
    }
}

fn equality(lhs: &Value, rhs: &Value, expect: bool) -> Value {
    if lhs.is_invalid() || rhs.is_invalid() {
        return Value::Invalid;
    }
    Value::Boolean((lhs == rhs) == expect)
}

fn ordering(lhs: &Value, rhs: &Value, test: impl Fn(Ordering) -> bool) -> Value {
    lhs.compare(rhs)
        .map_or(Value::Invalid, |o| Value::Boolean(test(o)))
}
