//! Rule-set definitions and their compilation into a [`Registry`].
//!
//! A rule set is a JSON document:
//!
//! ```json
//! {
//!   "facts": [
//!     { "id": "limit", "value": 100 },
//!     { "id": "total", "model": "order", "path": "/total", "type": "number" }
//!   ],
//!   "rules": [
//!     {
//!       "id": "over", "condition": "total > limit", "chainable": true,
//!       "actions": [
//!         { "kind": "evaluate", "target": "flag", "expression": "true" },
//!         { "kind": "callback", "name": "notify" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Each action becomes its own evidence node with id `{rule}-{target}-{n}`,
//! `n` counting the rule's actions from zero.

use std::collections::HashSet;

use evident_core::{Value, ValueKind};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::evidence::{Clause, Evidence};
use crate::priority::Priority;
use crate::registry::Registry;
use crate::source::ValueSource;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSet {
    #[serde(default)]
    pub facts: Vec<FactDef>,
    #[serde(default)]
    pub rules: Vec<RuleDef>,
}

/// A literal fact (`value`) or a document-bound one (`model` + `path`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactDef {
    pub id: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ValueKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDef {
    pub id: String,
    pub condition: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub chainable: bool,
    pub actions: Vec<ActionDef>,
}

/// An action attached to a rule. `result` is the rule value that fires it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", deny_unknown_fields)]
pub enum ActionDef {
    /// Write `expression` into fact `target`.
    Evaluate {
        target: String,
        expression: String,
        #[serde(default = "fires_on_true")]
        result: bool,
        #[serde(default)]
        priority: Priority,
    },
    /// Schedule evidence `target`.
    Execute {
        target: String,
        #[serde(default = "fires_on_true")]
        result: bool,
        #[serde(default)]
        priority: Priority,
    },
    /// Raise host callback `name`.
    Callback {
        name: String,
        #[serde(default = "fires_on_true")]
        result: bool,
        #[serde(default)]
        priority: Priority,
    },
}

fn fires_on_true() -> bool {
    true
}

impl ActionDef {
    fn operating(&self) -> &str {
        match self {
            ActionDef::Evaluate { target, .. } | ActionDef::Execute { target, .. } => target,
            ActionDef::Callback { name, .. } => name,
        }
    }

    fn result(&self) -> bool {
        match self {
            ActionDef::Evaluate { result, .. }
            | ActionDef::Execute { result, .. }
            | ActionDef::Callback { result, .. } => *result,
        }
    }

    fn to_evidence(&self, id: String) -> Result<Evidence, EngineError> {
        match self {
            ActionDef::Evaluate {
                target,
                expression,
                priority,
                ..
            } => Evidence::action_expression(id, *priority, target.as_str(), expression),
            ActionDef::Execute {
                target, priority, ..
            } => Ok(Evidence::action_execute(id, *priority, target.as_str())),
            ActionDef::Callback { name, priority, .. } => {
                Ok(Evidence::action_callback(id, *priority, name.as_str()))
            }
        }
    }
}

impl RuleSet {
    pub fn from_json(text: &str) -> Result<RuleSet, EngineError> {
        serde_json::from_str(text).map_err(|e| EngineError::InvalidRuleset {
            message: e.to_string(),
        })
    }

    /// Compile into a fresh registry.
    pub fn compile(&self) -> Result<Registry, EngineError> {
        let mut registry = Registry::new();
        self.load_into(&mut registry)?;
        Ok(registry)
    }

    /// Register every fact, action and rule, then link chainable rules to
    /// the evidence their conditions read. Nothing is registered unless the
    /// whole set builds.
    pub fn load_into(&self, registry: &mut Registry) -> Result<(), EngineError> {
        let staged = self.build()?;
        {
            let mut seen = HashSet::with_capacity(staged.len());
            for node in &staged {
                if registry.contains(node.id()) || !seen.insert(node.id()) {
                    return Err(EngineError::DuplicateEvidence {
                        id: node.id().to_string(),
                    });
                }
            }
        }
        for node in staged {
            registry.add_evidence(node)?;
        }
        registry.link_chainable_rules();
        tracing::debug!(
            facts = self.facts.len(),
            rules = self.rules.len(),
            nodes = registry.len(),
            "rule set loaded"
        );
        Ok(())
    }

    fn build(&self) -> Result<Vec<Evidence>, EngineError> {
        let mut nodes = Vec::new();
        for fact in &self.facts {
            nodes.push(fact.to_evidence()?);
        }
        for rule in &self.rules {
            let mut clauses = Vec::with_capacity(rule.actions.len());
            for (n, action) in rule.actions.iter().enumerate() {
                let id = format!("{}-{}-{}", rule.id, action.operating(), n);
                nodes.push(action.to_evidence(id.clone())?);
                clauses.push(Clause::new(action.result(), id));
            }
            nodes.push(Evidence::rule(
                rule.id.as_str(),
                rule.priority,
                &rule.condition,
                clauses,
                rule.chainable,
            )?);
        }
        Ok(nodes)
    }
}

impl FactDef {
    fn to_evidence(&self) -> Result<Evidence, EngineError> {
        let invalid = |message: &str| EngineError::InvalidRuleset {
            message: format!("fact {}: {}", self.id, message),
        };
        let source = match (&self.model, &self.path) {
            (Some(model), Some(path)) => {
                if self.value.is_some() {
                    return Err(invalid("a bound fact cannot also hold a literal value"));
                }
                ValueSource::bound(model.as_str(), path.as_str(), self.kind.unwrap_or(ValueKind::Text))
            }
            (Some(_), None) => return Err(invalid("a bound fact needs a path")),
            (None, Some(_)) => return Err(invalid("a path needs a model")),
            (None, None) => match &self.value {
                None | Some(serde_json::Value::Null) => ValueSource::naked(None),
                Some(json) => {
                    let value: Value = Value::from_json(json)
                        .ok_or_else(|| invalid("literal values must be scalars"))?;
                    ValueSource::naked(Some(value))
                }
            },
        };
        Ok(Evidence::fact(self.id.as_str(), self.priority, source))
    }
}
