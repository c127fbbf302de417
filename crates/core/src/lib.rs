//! evident-core: the Evident expression language.
//!
//! Expressions are tokenized, converted to a postfix program and run on a
//! small stack machine over [`Value`]s.
//!
//! # Public API
//!
//! - [`Expression::compile`] -- tokenize, convert and arity-check a source string
//! - [`evaluate`] -- run a postfix program against a [`Resolver`]
//! - [`Value`] / [`ValueKind`] -- runtime values
//! - [`ExprError`] -- compile and evaluation errors

pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod ops;
pub mod value;

// ── Convenience re-exports ───────────────────────────────────────────

pub use compiler::{infix_to_postfix, related_evidence, render, Expression};
pub use error::ExprError;
pub use evaluator::{evaluate, Resolver};
pub use lexer::{tokenize, Function, Operator, Token};
pub use value::{NodeHandle, Value, ValueKind};
