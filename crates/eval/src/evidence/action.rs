use evident_core::Expression;

use super::Effect;
use crate::error::EngineError;
use crate::registry::Registry;

/// The payload of an expression action: `target <- expression`.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: String,
    pub expression: Expression,
}

impl Assignment {
    /// An invalid result aborts the pass; so does a target that is not a fact.
    pub(super) fn plan(&self, id: &str, registry: &Registry) -> Result<Effect, EngineError> {
        let value = self.expression.evaluate(registry)?;
        if value.is_invalid() {
            return Err(EngineError::InvalidExpression {
                id: id.to_string(),
                expression: self.expression.source().to_string(),
            });
        }
        if !registry.lookup(&self.target)?.is_fact() {
            return Err(EngineError::NotAFact {
                action: id.to_string(),
                target: self.target.clone(),
            });
        }
        Ok(Effect::Assign {
            target: self.target.clone(),
            value,
        })
    }
}
