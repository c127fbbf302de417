//! evident-eval: forward-chaining evaluation over an evidence registry.
//!
//! A [`Registry`] holds facts, actions and rules. [`Registry::evaluate`]
//! runs one pass: facts and chainable rules are seeded into a priority
//! worklist, and each evaluated node schedules the evidence it activates
//! until nothing is pending. Rule sets can be loaded from JSON with
//! [`RuleSet`].

pub mod error;
pub mod evidence;
pub mod model;
pub mod observer;
pub mod priority;
pub mod registry;
pub mod ruleset;
pub mod scheduler;
pub mod source;
pub mod worklist;

pub use error::EngineError;
pub use evidence::{Assignment, Clause, Evidence, EvidenceKind, RuleBody};
pub use model::{Document, DocumentError, JsonDocument, Models};
pub use observer::{Observer, Quiet, Trace, TraceEvent};
pub use priority::Priority;
pub use registry::{Callback, CallbackEvent, Registry, Step};
pub use ruleset::{ActionDef, FactDef, RuleDef, RuleSet};
pub use scheduler::{PassSummary, Scheduler};
pub use source::{Binding, ValueSource};
pub use worklist::Worklist;
