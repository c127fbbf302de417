//! Evidence nodes.
//!
//! Every node in a registry is a piece of evidence: a fact holding a value,
//! an action that writes, triggers or calls back, or a rule whose boolean
//! condition activates actions. Nodes refer to each other only by id; the
//! registry owns them all and resolves ids on their behalf.

mod action;
mod rule;

pub use action::Assignment;
pub use rule::{Clause, RuleBody};

use evident_core::{Expression, Value};

use crate::error::EngineError;
use crate::priority::Priority;
use crate::registry::Registry;
use crate::source::ValueSource;

/// What a node is and the data specific to its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum EvidenceKind {
    Fact,
    /// Evaluates an expression and writes the result into a target fact.
    ActionExpression(Assignment),
    /// Schedules another piece of evidence.
    ActionExecute { operating: String },
    /// Raises a named callback to the host.
    ActionCallback { callback: String },
    Rule(RuleBody),
}

/// A node in the evidence graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Evidence {
    id: String,
    priority: Priority,
    evaluatable: bool,
    source: ValueSource,
    kind: EvidenceKind,
}

/// The result of evaluating a node, before it is applied to the registry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Effect {
    /// Re-read the node's own value source.
    Refresh,
    Assign { target: String, value: Value },
    Trigger { operating: String },
    Callback { name: String },
    /// A rule condition result.
    Condition(Value),
}

impl Evidence {
    // ── Construction ─────────────────────────────────────────────────

    fn build(id: impl Into<String>, priority: Priority, source: ValueSource, kind: EvidenceKind) -> Self {
        Evidence {
            id: id.into(),
            priority,
            evaluatable: true,
            source,
            kind,
        }
    }

    pub fn fact(id: impl Into<String>, priority: Priority, source: ValueSource) -> Self {
        Self::build(id, priority, source, EvidenceKind::Fact)
    }

    /// A naked fact holding `value`.
    pub fn literal(id: impl Into<String>, priority: Priority, value: impl Into<Value>) -> Self {
        Self::fact(id, priority, ValueSource::naked(Some(value.into())))
    }

    pub fn action_expression(
        id: impl Into<String>,
        priority: Priority,
        target: impl Into<String>,
        expression: &str,
    ) -> Result<Self, EngineError> {
        let assignment = Assignment {
            target: target.into(),
            expression: Expression::compile(expression)?,
        };
        Ok(Self::build(
            id,
            priority,
            ValueSource::naked(None),
            EvidenceKind::ActionExpression(assignment),
        ))
    }

    pub fn action_execute(id: impl Into<String>, priority: Priority, operating: impl Into<String>) -> Self {
        Self::build(
            id,
            priority,
            ValueSource::naked(None),
            EvidenceKind::ActionExecute {
                operating: operating.into(),
            },
        )
    }

    pub fn action_callback(id: impl Into<String>, priority: Priority, callback: impl Into<String>) -> Self {
        Self::build(
            id,
            priority,
            ValueSource::naked(None),
            EvidenceKind::ActionCallback {
                callback: callback.into(),
            },
        )
    }

    /// A rule. It must hold at least one clause, and a chainable rule may
    /// only hold `true` clauses.
    pub fn rule(
        id: impl Into<String>,
        priority: Priority,
        condition: &str,
        clauses: Vec<Clause>,
        chainable: bool,
    ) -> Result<Self, EngineError> {
        let id = id.into();
        let body = RuleBody::new(&id, condition, clauses, chainable)?;
        Ok(Self::build(id, priority, ValueSource::naked(None), EvidenceKind::Rule(body)))
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn kind(&self) -> &EvidenceKind {
        &self.kind
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            EvidenceKind::Fact => "fact",
            EvidenceKind::ActionExpression(_) => "action-expression",
            EvidenceKind::ActionExecute { .. } => "action-execute",
            EvidenceKind::ActionCallback { .. } => "action-callback",
            EvidenceKind::Rule(r) if r.chainable => "chainable-rule",
            EvidenceKind::Rule(_) => "rule",
        }
    }

    pub fn is_fact(&self) -> bool {
        matches!(self.kind, EvidenceKind::Fact)
    }

    pub fn is_chainable_rule(&self) -> bool {
        matches!(&self.kind, EvidenceKind::Rule(r) if r.chainable)
    }

    pub fn is_evaluatable(&self) -> bool {
        self.evaluatable
    }

    pub fn set_evaluatable(&mut self, evaluatable: bool) {
        self.evaluatable = evaluatable;
    }

    /// The stored value, without the evaluatable check the registry applies.
    pub fn value(&self) -> Option<&Value> {
        self.source.get()
    }

    pub fn source(&self) -> &ValueSource {
        &self.source
    }

    pub(crate) fn source_mut(&mut self) -> &mut ValueSource {
        &mut self.source
    }

    /// Model id of a document-bound node.
    pub fn model_id(&self) -> Option<&str> {
        self.source.model_id()
    }

    /// The compiled expression of an action or rule.
    pub fn expression(&self) -> Option<&Expression> {
        match &self.kind {
            EvidenceKind::ActionExpression(a) => Some(&a.expression),
            EvidenceKind::Rule(r) => Some(&r.condition),
            _ => None,
        }
    }

    // ── Scheduling ───────────────────────────────────────────────────

    /// Worklist key, lower first. Facts settle before actions, actions
    /// before plain rules, and chainable rules run last so they only read
    /// settled facts.
    pub fn rank(&self) -> i64 {
        let p = self.priority.get();
        match &self.kind {
            EvidenceKind::Fact => p,
            EvidenceKind::ActionExpression(_)
            | EvidenceKind::ActionExecute { .. }
            | EvidenceKind::ActionCallback { .. } => p * 1_000,
            EvidenceKind::Rule(r) if r.chainable => p * 1_000_000_000,
            EvidenceKind::Rule(_) => p * 1_000_000,
        }
    }

    /// Ids this node reads.
    pub fn dependent_evidence(&self) -> &[String] {
        match self.expression() {
            Some(e) => e.dependencies(),
            None => &[],
        }
    }

    /// Ids this node activates given its current value.
    pub fn clause_evidence(&self) -> Vec<String> {
        match &self.kind {
            EvidenceKind::Fact | EvidenceKind::ActionCallback { .. } => Vec::new(),
            EvidenceKind::ActionExpression(a) => vec![a.target.clone()],
            EvidenceKind::ActionExecute { operating } => vec![operating.clone()],
            EvidenceKind::Rule(r) => match self.value().and_then(Value::as_bool) {
                Some(truth) => r.matching(truth),
                None => Vec::new(),
            },
        }
    }

    // ── Evaluation ───────────────────────────────────────────────────

    /// Evaluate against the registry without mutating anything.
    pub(crate) fn plan(&self, registry: &Registry) -> Result<Effect, EngineError> {
        match &self.kind {
            EvidenceKind::Fact => Ok(Effect::Refresh),
            EvidenceKind::ActionExpression(a) => a.plan(&self.id, registry),
            EvidenceKind::ActionExecute { operating } => Ok(Effect::Trigger {
                operating: operating.clone(),
            }),
            EvidenceKind::ActionCallback { callback } => Ok(Effect::Callback {
                name: callback.clone(),
            }),
            EvidenceKind::Rule(r) => Ok(Effect::Condition(r.condition.evaluate(registry)?)),
        }
    }
}
