/// Errors raised while compiling or running an expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExprError {
    /// A token could not be classified as any known kind.
    #[error("invalid token: {token}")]
    InvalidToken { token: String },

    /// A closing parenthesis without an opening one, or the reverse.
    #[error("unbalanced expression: {expression}")]
    UnbalancedExpression { expression: String },

    /// A run of operator characters that names no known operator.
    #[error("unknown operator: {operator}")]
    UnknownOperator { operator: String },

    /// An identifier used in call position that names no known function.
    #[error("unknown function: {name}")]
    UnknownFunction { name: String },

    /// The postfix program does not reduce to exactly one value.
    #[error("malformed program: {message}")]
    MalformedProgram { message: String },

    /// An identifier was not bound by the resolver.
    #[error("unbound identifier: {name}")]
    UnboundIdentifier { name: String },
}

impl ExprError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        ExprError::MalformedProgram {
            message: message.into(),
        }
    }
}
