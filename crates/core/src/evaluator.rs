//! Stack-machine evaluator for postfix programs.

use std::collections::{BTreeMap, HashMap};

use crate::error::ExprError;
use crate::lexer::Token;
use crate::ops;
use crate::value::Value;

/// Resolves identifier tokens to their current values.
///
/// The error type lets a host surface its own lookup failures (for example
/// an unknown evidence id) through the evaluator unchanged.
pub trait Resolver {
    type Error: From<ExprError>;

    fn resolve(&self, id: &str) -> Result<Value, Self::Error>;
}

impl Resolver for HashMap<String, Value> {
    type Error = ExprError;

    fn resolve(&self, id: &str) -> Result<Value, ExprError> {
        self.get(id)
            .cloned()
            .ok_or_else(|| ExprError::UnboundIdentifier {
                name: id.to_string(),
            })
    }
}

impl Resolver for BTreeMap<String, Value> {
    type Error = ExprError;

    fn resolve(&self, id: &str) -> Result<Value, ExprError> {
        self.get(id)
            .cloned()
            .ok_or_else(|| ExprError::UnboundIdentifier {
                name: id.to_string(),
            })
    }
}

/// Run a postfix program to a single value.
pub fn evaluate<R: Resolver + ?Sized>(program: &[Token], resolver: &R) -> Result<Value, R::Error> {
    let mut stack: Vec<Value> = Vec::with_capacity(program.len());

    for token in program {
        match token {
            Token::Literal(v) => stack.push(v.clone()),
            Token::Identifier(id) => stack.push(resolver.resolve(id)?),
            Token::Operator(op) if op.arity() == 1 => {
                let operand = pop(&mut stack, token)?;
                stack.push(ops::unary(*op, &operand));
            }
            Token::Operator(op) => {
                let rhs = pop(&mut stack, token)?;
                let lhs = pop(&mut stack, token)?;
                stack.push(ops::binary(*op, &lhs, &rhs));
            }
            Token::Function(func) => {
                let arg = pop(&mut stack, token)?;
                stack.push(ops::call(*func, &arg));
            }
            Token::OpenParen | Token::CloseParen => {
                return Err(ExprError::malformed("parenthesis in postfix program").into())
            }
        }
        tracing::trace!(token = %token, top = ?stack.last(), depth = stack.len(), "step");
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(result), true) => Ok(result),
        (None, _) => Err(ExprError::malformed("program produced no value").into()),
        (Some(_), false) => Err(ExprError::malformed(format!(
            "{} values left on the stack",
            stack.len() + 1
        ))
        .into()),
    }
}

fn pop(stack: &mut Vec<Value>, token: &Token) -> Result<Value, ExprError> {
    stack
        .pop()
        .ok_or_else(|| ExprError::malformed(format!("stack underflow at '{}'", token)))
}
