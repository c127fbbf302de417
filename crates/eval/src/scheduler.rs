//! One evaluation pass over a registry.
//!
//! The pass seeds the worklist with every fact and every chainable rule,
//! then pops and evaluates until nothing is pending:
//!
//! 1. a changed fact bound to a model schedules every other fact bound to
//!    the same model;
//! 2. the node's clause evidence is scheduled;
//! 3. every dependent registered against the node is scheduled.
//!
//! Scheduling marks a node evaluatable. There is no iteration cap: a rule
//! graph whose truth values keep flipping does not terminate.

use serde::Serialize;

use crate::error::EngineError;
use crate::observer::Observer;
use crate::registry::Registry;
use crate::worklist::Worklist;

/// Counters for a finished pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub evaluations: usize,
    pub changes: usize,
    pub activations: usize,
    pub callbacks: usize,
}

pub struct Scheduler<'r> {
    registry: &'r mut Registry,
    worklist: Worklist,
}

impl<'r> Scheduler<'r> {
    pub fn new(registry: &'r mut Registry) -> Self {
        Scheduler {
            registry,
            worklist: Worklist::new(),
        }
    }

    pub fn worklist(&self) -> &Worklist {
        &self.worklist
    }

    /// Mark `id` evaluatable and add it to the worklist at its rank.
    pub fn enqueue(&mut self, id: &str) -> Result<bool, EngineError> {
        let node = self.registry.lookup_mut(id)?;
        node.set_evaluatable(true);
        let rank = node.rank();
        let added = self.worklist.push(id, rank);
        if added {
            tracing::debug!(id, rank, "enqueue");
        }
        Ok(added)
    }

    pub fn seed(&mut self) -> Result<(), EngineError> {
        for id in self.registry.seeds() {
            self.enqueue(&id)?;
        }
        Ok(())
    }

    /// Seed and run to quiescence. The first error aborts the pass.
    pub fn run(mut self, observer: &mut dyn Observer) -> Result<PassSummary, EngineError> {
        self.seed()?;
        let mut summary = PassSummary::default();

        while let Some(id) = self.worklist.pop() {
            tracing::debug!(id = %id, pending = %self.worklist, "pop");
            let step = self.registry.evaluate_evidence(&id)?;
            summary.evaluations += 1;
            observer.evaluated(&id);

            for changed in &step.changed {
                summary.changes += 1;
                let node = self.registry.lookup(changed)?;
                observer.changed(changed, node.value());
                let peers = match node.model_id() {
                    Some(model) if node.is_fact() => self.registry.facts_bound_to(model),
                    _ => Vec::new(),
                };
                for peer in peers.iter().filter(|peer| *peer != changed) {
                    self.enqueue(peer)?;
                }
            }

            for target in &step.activations {
                summary.activations += 1;
                observer.activated(&id, target);
                self.enqueue(target)?;
            }

            for name in &step.callbacks {
                summary.callbacks += 1;
                observer.callback(&id, name);
            }

            let dependents = self.registry.dependents(&id).to_vec();
            for dependent in &dependents {
                self.enqueue(dependent)?;
            }
        }

        tracing::debug!(
            evaluations = summary.evaluations,
            changes = summary.changes,
            "pass complete"
        );
        Ok(summary)
    }
}
