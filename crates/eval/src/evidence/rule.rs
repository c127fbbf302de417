use evident_core::Expression;

use crate::error::EngineError;

/// A clause specifier: activate `action` when the rule's value equals `truth`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub truth: bool,
    pub action: String,
}

impl Clause {
    pub fn new(truth: bool, action: impl Into<String>) -> Self {
        Clause {
            truth,
            action: action.into(),
        }
    }

    pub fn when_true(action: impl Into<String>) -> Self {
        Self::new(true, action)
    }

    pub fn when_false(action: impl Into<String>) -> Self {
        Self::new(false, action)
    }
}

/// The condition and clauses of a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBody {
    pub condition: Expression,
    pub clauses: Vec<Clause>,
    /// Chainable rules are seeded into every pass and re-run whenever the
    /// evidence they read is evaluated.
    pub chainable: bool,
}

impl RuleBody {
    pub(super) fn new(
        id: &str,
        condition: &str,
        clauses: Vec<Clause>,
        chainable: bool,
    ) -> Result<Self, EngineError> {
        let invalid = |message: &str| EngineError::InvalidRule {
            id: id.to_string(),
            message: message.to_string(),
        };
        if clauses.is_empty() {
            return Err(invalid("a rule needs at least one clause"));
        }
        if chainable && clauses.iter().any(|c| !c.truth) {
            return Err(invalid("chainable rules cannot hold false clauses"));
        }
        Ok(RuleBody {
            condition: Expression::compile(condition)?,
            clauses,
            chainable,
        })
    }

    /// Actions whose clause truth equals `truth`, in declaration order.
    pub fn matching(&self, truth: bool) -> Vec<String> {
        self.clauses
            .iter()
            .filter(|c| c.truth == truth)
            .map(|c| c.action.clone())
            .collect()
    }
}
