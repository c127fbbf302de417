//! Evaluation observers.
//!
//! An [`Observer`] is told about every evaluation, value change, activation
//! and callback during a pass. [`Trace`] records them in order.

use evident_core::Value;
use serde::Serialize;

/// Hooks called by the scheduler. All default to no-ops.
pub trait Observer {
    fn evaluated(&mut self, _id: &str) {}

    fn changed(&mut self, _id: &str, _value: Option<&Value>) {}

    /// `by` put `id` on the worklist through its clause evidence.
    fn activated(&mut self, _by: &str, _id: &str) {}

    fn callback(&mut self, _action: &str, _name: &str) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quiet;

impl Observer for Quiet {}

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    Evaluated { id: String },
    Changed { id: String, value: Option<Value> },
    Activated { by: String, id: String },
    Callback { action: String, name: String },
}

/// Recording observer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trace {
    pub events: Vec<TraceEvent>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids in the order they were evaluated.
    pub fn evaluations(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TraceEvent::Evaluated { id } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of change events recorded for `id`.
    pub fn changes_of(&self, id: &str) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, TraceEvent::Changed { id: changed, .. } if changed == id))
            .count()
    }

    /// Number of times `id` was activated.
    pub fn activations_of(&self, id: &str) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, TraceEvent::Activated { id: activated, .. } if activated == id))
            .count()
    }

    pub fn callbacks(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TraceEvent::Callback { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Observer for Trace {
    fn evaluated(&mut self, id: &str) {
        self.events.push(TraceEvent::Evaluated { id: id.to_string() });
    }

    fn changed(&mut self, id: &str, value: Option<&Value>) {
        self.events.push(TraceEvent::Changed {
            id: id.to_string(),
            value: value.cloned(),
        });
    }

    fn activated(&mut self, by: &str, id: &str) {
        self.events.push(TraceEvent::Activated {
            by: by.to_string(),
            id: id.to_string(),
        });
    }

    fn callback(&mut self, action: &str, name: &str) {
        self.events.push(TraceEvent::Callback {
            action: action.to_string(),
            name: name.to_string(),
        });
    }
}
