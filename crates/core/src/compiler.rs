//! Expression compiler: infix tokens to a postfix program.

use std::fmt;

use crate::error::ExprError;
use crate::evaluator::{self, Resolver};
use crate::lexer::{self, Operator, Token};
use crate::value::Value;

/// A compiled expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    infix: Vec<Token>,
    postfix: Vec<Token>,
    dependencies: Vec<String>,
}

impl Expression {
    /// Tokenize, convert to postfix and check that the program reduces to
    /// exactly one value.
    pub fn compile(source: &str) -> Result<Expression, ExprError> {
        let infix = lexer::tokenize(source)?;
        let postfix = infix_to_postfix(&infix, source)?;
        check_arity(&postfix)?;
        let dependencies = related_evidence(&infix);
        Ok(Expression {
            source: source.to_string(),
            infix,
            postfix,
            dependencies,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn infix(&self) -> &[Token] {
        &self.infix
    }

    pub fn postfix(&self) -> &[Token] {
        &self.postfix
    }

    /// Evidence ids this expression reads, deduplicated in first-use order.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn evaluate<R: Resolver + ?Sized>(&self, resolver: &R) -> Result<Value, R::Error> {
        evaluator::evaluate(&self.postfix, resolver)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Render a token sequence separated by single spaces.
pub fn render(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Identifier tokens, deduplicated, in order of first appearance.
pub fn related_evidence(tokens: &[Token]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for token in tokens {
        if let Token::Identifier(id) = token {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
    }
    ids
}

/// Shunting-yard conversion. Binary operators pop while the stack top binds
/// at least as tightly; prefix operators and functions are pushed as-is.
pub fn infix_to_postfix(infix: &[Token], source: &str) -> Result<Vec<Token>, ExprError> {
    let unbalanced = || ExprError::UnbalancedExpression {
        expression: source.to_string(),
    };
    let mut output = Vec::with_capacity(infix.len());
    let mut stack: Vec<Token> = Vec::new();

    for token in infix {
        match token {
            Token::Literal(_) | Token::Identifier(_) => output.push(token.clone()),
            Token::Function(_) | Token::Operator(Operator::Not) | Token::OpenParen => {
                stack.push(token.clone())
            }
            Token::Operator(_) => {
                while let Some(top) = stack.last() {
                    if *top == Token::OpenParen || top.precedence() < token.precedence() {
                        break;
                    }
                    if let Some(top) = stack.pop() {
                        output.push(top);
                    }
                }
                stack.push(token.clone());
            }
            Token::CloseParen => {
                loop {
                    match stack.pop() {
                        Some(Token::OpenParen) => break,
                        Some(top) => output.push(top),
                        None => return Err(unbalanced()),
                    }
                }
                if matches!(stack.last(), Some(Token::Function(_))) {
                    if let Some(func) = stack.pop() {
                        output.push(func);
                    }
                }
            }
        }
    }

    while let Some(top) = stack.pop() {
        if top == Token::OpenParen {
            return Err(unbalanced());
        }
        output.push(top);
    }
    Ok(output)
}

/// Simulate stack depth over a postfix program.
fn check_arity(postfix: &[Token]) -> Result<(), ExprError> {
    if postfix.is_empty() {
        return Err(ExprError::malformed("empty expression"));
    }
    let mut depth = 0usize;
    for token in postfix {
        let arity = match token {
            Token::Literal(_) | Token::Identifier(_) => {
                depth += 1;
                continue;
            }
            Token::Operator(op) => op.arity(),
            Token::Function(func) => func.arity(),
            Token::OpenParen | Token::CloseParen => {
                return Err(ExprError::malformed("parenthesis in postfix program"))
            }
        };
        if depth < arity {
            return Err(ExprError::malformed(format!(
                "'{}' needs {} operand(s), found {}",
                token, arity, depth
            )));
        }
        depth = depth - arity + 1;
    }
    if depth != 1 {
        return Err(ExprError::malformed(format!(
            "program leaves {} values on the stack",
            depth
        )));
    }
    Ok(())
}
