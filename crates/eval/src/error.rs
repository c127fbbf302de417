use evident_core::ExprError;

/// All errors raised while building or evaluating a registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// An evidence node with this id is already registered.
    #[error("duplicate evidence: {id}")]
    DuplicateEvidence { id: String },

    /// A model document is already bound to this id.
    #[error("duplicate model: {id}")]
    DuplicateModel { id: String },

    /// A host callback with this name is already registered.
    #[error("duplicate callback: {name}")]
    DuplicateCallback { name: String },

    #[error("unknown evidence: {id}")]
    UnknownEvidence { id: String },

    #[error("unknown model: {id}")]
    UnknownModel { id: String },

    /// The node was switched off and may not be evaluated, read or written.
    #[error("evidence not evaluatable: {id}")]
    NotEvaluatable { id: String },

    /// An action's expression produced an invalid value.
    #[error("action {id}: expression `{expression}` evaluated to an invalid value")]
    InvalidExpression { id: String, expression: String },

    /// Author priorities must lie strictly between 0 and 1000.
    #[error("invalid priority {priority}: expected a value between 1 and 999")]
    InvalidPriority { priority: i64 },

    #[error("invalid rule {id}: {message}")]
    InvalidRule { id: String, message: String },

    /// An assignment action targets something other than a fact.
    #[error("action {action} targets {target}, which is not a fact")]
    NotAFact { action: String, target: String },

    /// A model document could not be read or written.
    #[error("model {model_id}: {message}")]
    Document { model_id: String, message: String },

    /// A rule-set definition could not be parsed or compiled.
    #[error("invalid rule set: {message}")]
    InvalidRuleset { message: String },

    #[error(transparent)]
    Expression(#[from] ExprError),
}
