//! The evidence registry.
//!
//! A [`Registry`] owns every evidence node, every model document, the
//! extra dependency map used for chaining, and the host callbacks. Nodes
//! never hold references to each other; they name ids and the registry
//! resolves them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use evident_core::{Resolver, Value};
use serde::Serialize;

use crate::error::EngineError;
use crate::evidence::{Effect, Evidence};
use crate::model::{Document, Models};
use crate::observer::{Observer, Quiet};
use crate::scheduler::{PassSummary, Scheduler};

/// Arguments passed to a host callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackEvent<'a> {
    /// The callback action that fired.
    pub action: &'a str,
    /// The callback name it was declared with.
    pub name: &'a str,
}

/// A host callback. Shared between a registry and its clones.
pub type Callback = Arc<dyn Fn(&CallbackEvent<'_>) + Send + Sync>;

/// What evaluating a single node did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Step {
    /// Ids whose stored value changed.
    pub changed: Vec<String>,
    /// Clause evidence to schedule next.
    pub activations: Vec<String>,
    /// Callback names raised.
    pub callbacks: Vec<String>,
}

#[derive(Clone, Default)]
pub struct Registry {
    evidence: BTreeMap<String, Evidence>,
    models: Models,
    dependents: BTreeMap<String, Vec<String>>,
    callbacks: BTreeMap<String, Callback>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("evidence", &self.evidence.keys().collect::<Vec<_>>())
            .field("models", &self.models.ids().collect::<Vec<_>>())
            .field("dependents", &self.dependents)
            .field("callbacks", &self.callbacks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // ──────────────────────────────────────────────
    // Registration
    // ──────────────────────────────────────────────

    pub fn add_model(&mut self, id: &str, document: impl Document + 'static) -> Result<(), EngineError> {
        self.models.insert(id, Box::new(document))
    }

    pub fn add_evidence(&mut self, node: Evidence) -> Result<(), EngineError> {
        if self.evidence.contains_key(node.id()) {
            return Err(EngineError::DuplicateEvidence {
                id: node.id().to_string(),
            });
        }
        tracing::debug!(id = node.id(), kind = node.kind_name(), "add evidence");
        self.evidence.insert(node.id().to_string(), node);
        Ok(())
    }

    /// Schedule `dependent_id` whenever `evidence_id` is evaluated.
    pub fn add_dependent(&mut self, evidence_id: &str, dependent_id: &str) {
        let entry = self.dependents.entry(evidence_id.to_string()).or_default();
        if !entry.iter().any(|d| d == dependent_id) {
            entry.push(dependent_id.to_string());
        }
    }

    /// Register every chainable rule as a dependent of each id its
    /// condition reads.
    pub fn link_chainable_rules(&mut self) {
        let links: Vec<(String, String)> = self
            .evidence
            .values()
            .filter(|node| node.is_chainable_rule())
            .flat_map(|rule| {
                rule.dependent_evidence()
                    .iter()
                    .map(move |dep| (dep.clone(), rule.id().to_string()))
            })
            .collect();
        for (dep, rule) in links {
            self.add_dependent(&dep, &rule);
        }
    }

    pub fn register_callback<F>(&mut self, name: &str, callback: F) -> Result<(), EngineError>
    where
        F: Fn(&CallbackEvent<'_>) + Send + Sync + 'static,
    {
        if self.callbacks.contains_key(name) {
            return Err(EngineError::DuplicateCallback {
                name: name.to_string(),
            });
        }
        self.callbacks.insert(name.to_string(), Arc::new(callback));
        Ok(())
    }

    // ──────────────────────────────────────────────
    // Lookup
    // ──────────────────────────────────────────────

    pub fn lookup(&self, id: &str) -> Result<&Evidence, EngineError> {
        self.evidence
            .get(id)
            .ok_or_else(|| EngineError::UnknownEvidence { id: id.to_string() })
    }

    pub fn lookup_mut(&mut self, id: &str) -> Result<&mut Evidence, EngineError> {
        self.evidence
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownEvidence { id: id.to_string() })
    }

    pub fn resolve_model(&self, id: &str) -> Result<&dyn Document, EngineError> {
        self.models.get(id)
    }

    pub fn resolve_model_mut(&mut self, id: &str) -> Result<&mut dyn Document, EngineError> {
        self.models.get_mut(id)
    }

    pub fn models(&self) -> &Models {
        &self.models
    }

    pub fn evidence(&self) -> impl Iterator<Item = &Evidence> {
        self.evidence.values()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.evidence.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.evidence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evidence.is_empty()
    }

    /// Ids scheduled whenever `id` is evaluated.
    pub fn dependents(&self, id: &str) -> &[String] {
        self.dependents.get(id).map_or(&[][..], Vec::as_slice)
    }

    /// Facts and chainable rules: the starting set of every pass.
    pub fn seeds(&self) -> Vec<String> {
        self.evidence
            .values()
            .filter(|node| node.is_fact() || node.is_chainable_rule())
            .map(|node| node.id().to_string())
            .collect()
    }

    /// Facts bound to model `model_id`.
    pub fn facts_bound_to(&self, model_id: &str) -> Vec<String> {
        self.evidence
            .values()
            .filter(|node| node.is_fact() && node.model_id() == Some(model_id))
            .map(|node| node.id().to_string())
            .collect()
    }

    // ──────────────────────────────────────────────
    // Values
    // ──────────────────────────────────────────────

    /// The value of `id`. Fails if the node is switched off.
    pub fn value(&self, id: &str) -> Result<Option<&Value>, EngineError> {
        let node = self.lookup(id)?;
        if !node.is_evaluatable() {
            return Err(EngineError::NotEvaluatable { id: id.to_string() });
        }
        Ok(node.value())
    }

    /// Write the value of `id`. Returns whether it changed.
    pub fn set_value(&mut self, id: &str, value: Value) -> Result<bool, EngineError> {
        let Registry {
            evidence, models, ..
        } = self;
        let node = evidence
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownEvidence { id: id.to_string() })?;
        if !node.is_evaluatable() {
            return Err(EngineError::NotEvaluatable { id: id.to_string() });
        }
        node.source_mut().set(value, models)
    }

    /// Invalidate any cached value of `id`.
    pub fn reset(&mut self, id: &str) -> Result<(), EngineError> {
        self.lookup_mut(id)?.source_mut().reset();
        Ok(())
    }

    // ──────────────────────────────────────────────
    // Evaluation
    // ──────────────────────────────────────────────

    /// Run one pass to quiescence.
    pub fn evaluate(&mut self) -> Result<PassSummary, EngineError> {
        self.evaluate_with(&mut Quiet)
    }

    /// Run one pass, reporting to `observer`.
    pub fn evaluate_with(&mut self, observer: &mut dyn Observer) -> Result<PassSummary, EngineError> {
        Scheduler::new(self).run(observer)
    }

    /// Evaluate a single node without cascading.
    ///
    /// A switched-off fact is skipped; any other switched-off node fails
    /// with [`EngineError::NotEvaluatable`].
    pub fn evaluate_evidence(&mut self, id: &str) -> Result<Step, EngineError> {
        let node = self.lookup(id)?;
        if !node.is_evaluatable() {
            if node.is_fact() {
                return Ok(Step::default());
            }
            return Err(EngineError::NotEvaluatable { id: id.to_string() });
        }
        let effect = node.plan(self)?;
        tracing::debug!(id, kind = node.kind_name(), effect = ?effect, "evaluate");
        self.apply(id, effect)
    }

    fn apply(&mut self, id: &str, effect: Effect) -> Result<Step, EngineError> {
        let mut step = Step::default();
        match effect {
            Effect::Refresh => {
                let Registry {
                    evidence, models, ..
                } = self;
                let node = evidence
                    .get_mut(id)
                    .ok_or_else(|| EngineError::UnknownEvidence { id: id.to_string() })?;
                if node.source_mut().evaluate(models)? {
                    step.changed.push(id.to_string());
                }
            }
            Effect::Assign { target, value } => {
                if self.set_value(&target, value)? {
                    step.changed.push(target.clone());
                }
                step.activations.push(target);
            }
            Effect::Trigger { operating } => step.activations.push(operating),
            Effect::Callback { name } => {
                match self.callbacks.get(&name) {
                    Some(callback) => callback(&CallbackEvent { action: id, name: &name }),
                    None => tracing::warn!(action = id, callback = %name, "no callback registered"),
                }
                step.callbacks.push(name);
            }
            Effect::Condition(result) => {
                let Registry {
                    evidence, models, ..
                } = self;
                let node = evidence
                    .get_mut(id)
                    .ok_or_else(|| EngineError::UnknownEvidence { id: id.to_string() })?;
                node.source_mut().reset();
                match result {
                    Value::Boolean(truth) => {
                        if node.source_mut().set(Value::Boolean(truth), models)? {
                            step.changed.push(id.to_string());
                            step.activations = node.clause_evidence();
                        }
                    }
                    other => {
                        tracing::warn!(rule = id, result = %other, "rule condition is not boolean");
                        node.source_mut().clear();
                    }
                }
            }
        }
        Ok(step)
    }
}

impl Resolver for Registry {
    type Error = EngineError;

    /// Absent values resolve to [`Value::Invalid`].
    fn resolve(&self, id: &str) -> Result<Value, EngineError> {
        Ok(self.value(id)?.cloned().unwrap_or(Value::Invalid))
    }
}
