//! End-to-end evaluation scenarios built directly against the registry API.
//!
//! Covers scheduling order, rule short-circuiting, clone isolation,
//! document-model propagation and chaining across passes.

use std::sync::{Arc, Mutex};

use evident_core::{Expression, Value, ValueKind};
use evident_eval::{
    Clause, EngineError, Evidence, JsonDocument, Priority, Registry, Trace, ValueSource,
};
use serde_json::json;

// ──────────────────────────────────────────────
// Fixtures
// ──────────────────────────────────────────────

fn p(v: i64) -> Priority {
    Priority::new(v).unwrap()
}

fn number(rom: &Registry, id: &str) -> Option<f64> {
    rom.value(id).unwrap().and_then(Value::as_number)
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[test]
fn chainable_rule_writes_both_facts() {
    let mut rom = Registry::new();
    rom.add_evidence(Evidence::literal("f1", p(500), 2.0)).unwrap();
    rom.add_evidence(Evidence::literal("f2", p(500), 4.0)).unwrap();
    rom.add_evidence(Evidence::action_expression("a1", p(500), "f1", "3").unwrap())
        .unwrap();
    rom.add_evidence(Evidence::action_expression("a2", p(500), "f2", "4").unwrap())
        .unwrap();
    rom.add_evidence(
        Evidence::rule(
            "R1",
            p(500),
            "1==1",
            vec![Clause::when_true("a1"), Clause::when_true("a2")],
            true,
        )
        .unwrap(),
    )
    .unwrap();

    rom.evaluate().unwrap();

    assert_eq!(rom.value("f1").unwrap(), Some(&Value::Number(3.0)));
    assert_eq!(rom.value("f2").unwrap(), Some(&Value::Number(4.0)));
}

#[test]
fn literal_fact_is_stable_across_passes() {
    let mut rom = Registry::new();
    rom.add_evidence(Evidence::literal("f1", p(1), 2.0)).unwrap();

    let mut first = Trace::new();
    rom.evaluate_with(&mut first).unwrap();
    let mut second = Trace::new();
    rom.evaluate_with(&mut second).unwrap();

    assert_eq!(number(&rom, "f1"), Some(2.0));
    assert_eq!(first.changes_of("f1"), 0);
    assert_eq!(second.changes_of("f1"), 0);
}

#[test]
fn fact_settles_before_action_regardless_of_registration_order() {
    for action_first in [true, false] {
        let mut rom = Registry::new();
        let fact = Evidence::literal("zz", p(1), 1.0);
        let action = Evidence::action_execute("aa", p(1), "zz");
        let rule = Evidence::rule("go", p(1), "true", vec![Clause::when_true("aa")], true).unwrap();
        if action_first {
            rom.add_evidence(action).unwrap();
            rom.add_evidence(fact).unwrap();
        } else {
            rom.add_evidence(fact).unwrap();
            rom.add_evidence(action).unwrap();
        }
        rom.add_evidence(rule).unwrap();

        let mut trace = Trace::new();
        rom.evaluate_with(&mut trace).unwrap();
        let order = trace.evaluations();
        let fact_at = order.iter().position(|id| *id == "zz").unwrap();
        let action_at = order.iter().position(|id| *id == "aa").unwrap();
        assert!(fact_at < action_at, "order was {:?}", order);
    }
}

#[test]
fn chainable_rules_read_settled_facts() {
    // A low author priority must not let a chainable rule run ahead of
    // the document-bound fact it guards.
    let mut rom = Registry::new();
    rom.add_model("order", JsonDocument::new(json!({"total": 5})))
        .unwrap();
    rom.add_evidence(Evidence::fact(
        "total",
        p(500),
        ValueSource::bound("order", "/total", ValueKind::Number),
    ))
    .unwrap();
    rom.add_evidence(Evidence::fact("defaulted", p(500), ValueSource::naked(None)))
        .unwrap();
    rom.add_evidence(Evidence::action_expression("setdef", p(500), "defaulted", "1").unwrap())
        .unwrap();
    rom.add_evidence(
        Evidence::rule("missing", p(1), "ISNULL(total)", vec![Clause::when_true("setdef")], true)
            .unwrap(),
    )
    .unwrap();
    rom.link_chainable_rules();

    let mut trace = Trace::new();
    rom.evaluate_with(&mut trace).unwrap();

    let order = trace.evaluations();
    let total_at = order.iter().position(|id| *id == "total").unwrap();
    let rule_at = order.iter().position(|id| *id == "missing").unwrap();
    assert!(total_at < rule_at, "order was {:?}", order);
    assert!(!order.contains(&"setdef"), "order was {:?}", order);
    assert_eq!(rom.value("missing").unwrap(), Some(&Value::Boolean(false)));
    assert_eq!(rom.value("defaulted").unwrap(), None);
    assert_eq!(number(&rom, "total"), Some(5.0));
}

#[test]
fn isnull_sees_absent_fact_values() {
    let build = |nickname: Option<Value>| {
        let mut rom = Registry::new();
        rom.add_evidence(Evidence::fact("nickname", p(1), ValueSource::naked(nickname)))
            .unwrap();
        rom.add_evidence(Evidence::fact("label", p(1), ValueSource::naked(None)))
            .unwrap();
        rom.add_evidence(
            Evidence::action_expression("anonymous", p(1), "label", "\"anonymous\"").unwrap(),
        )
        .unwrap();
        rom.add_evidence(
            Evidence::rule(
                "fallback",
                p(1),
                "ISNULL(nickname)",
                vec![Clause::when_true("anonymous")],
                true,
            )
            .unwrap(),
        )
        .unwrap();
        rom
    };

    let mut unnamed = build(None);
    unnamed.evaluate().unwrap();
    assert_eq!(unnamed.value("fallback").unwrap(), Some(&Value::Boolean(true)));
    assert_eq!(unnamed.value("label").unwrap(), Some(&Value::from("anonymous")));

    let mut named = build(Some(Value::from("ace")));
    named.evaluate().unwrap();
    assert_eq!(named.value("fallback").unwrap(), Some(&Value::Boolean(false)));
    assert_eq!(named.value("label").unwrap(), None);
}

#[test]
fn unchanged_rule_activates_its_clause_once() {
    let mut rom = Registry::new();
    rom.add_evidence(Evidence::literal("f1", p(1), 1.0)).unwrap();
    rom.add_evidence(Evidence::action_callback("a1", p(1), "fired"))
        .unwrap();
    rom.add_evidence(
        Evidence::rule("R", p(1), "f1==f1", vec![Clause::when_true("a1")], false).unwrap(),
    )
    .unwrap();

    let first = rom.evaluate_evidence("R").unwrap();
    let second = rom.evaluate_evidence("R").unwrap();

    assert_eq!(first.activations, vec!["a1"]);
    assert!(second.activations.is_empty());
}

#[test]
fn repeated_action_notifies_change_once() {
    let mut rom = Registry::new();
    rom.add_evidence(Evidence::literal("f1", p(1), 0.0)).unwrap();
    rom.add_evidence(Evidence::action_expression("a1", p(1), "f1", "5").unwrap())
        .unwrap();

    let changes: usize = (0..2)
        .map(|_| rom.evaluate_evidence("a1").unwrap().changed.len())
        .sum();

    assert_eq!(changes, 1);
    assert_eq!(number(&rom, "f1"), Some(5.0));
}

#[test]
fn clones_do_not_share_evidence_state() {
    let mut rom = Registry::new();
    rom.add_evidence(Evidence::literal("f1", p(1), 1.0)).unwrap();
    let mut copy = rom.clone();

    copy.set_value("f1", Value::Number(9.0)).unwrap();
    assert_eq!(number(&rom, "f1"), Some(1.0));

    rom.set_value("f1", Value::Number(5.0)).unwrap();
    assert_eq!(number(&copy, "f1"), Some(9.0));
}

#[test]
fn clones_do_not_share_documents() {
    let mut rom = Registry::new();
    rom.add_model("order", JsonDocument::new(json!({"total": 1})))
        .unwrap();
    rom.add_evidence(Evidence::fact(
        "total",
        p(1),
        ValueSource::bound("order", "/total", ValueKind::Number),
    ))
    .unwrap();
    let mut copy = rom.clone();

    copy.set_value("total", Value::Number(50.0)).unwrap();

    assert_eq!(
        rom.resolve_model("order").unwrap().read("/total"),
        Some(Value::Number(1.0))
    );
    rom.evaluate().unwrap();
    assert_eq!(number(&rom, "total"), Some(1.0));
}

#[test]
fn invalid_results() {
    let empty = std::collections::HashMap::<String, Value>::new();
    let div = Expression::compile("2/0").unwrap();
    assert_eq!(div.evaluate(&empty).unwrap(), Value::Invalid);
    let guarded = Expression::compile("ISNULL(2/0)").unwrap();
    assert_eq!(guarded.evaluate(&empty).unwrap(), Value::Boolean(true));
}

#[test]
fn action_with_invalid_result_aborts_the_pass() {
    let mut rom = Registry::new();
    rom.add_evidence(Evidence::literal("f1", p(1), 0.0)).unwrap();
    rom.add_evidence(Evidence::action_expression("a1", p(1), "f1", "1/f1").unwrap())
        .unwrap();
    rom.add_evidence(
        Evidence::rule("R", p(1), "true", vec![Clause::when_true("a1")], true).unwrap(),
    )
    .unwrap();

    assert_eq!(
        rom.evaluate().unwrap_err(),
        EngineError::InvalidExpression {
            id: "a1".into(),
            expression: "1/f1".into()
        }
    );
}

#[test]
fn writing_one_bound_fact_refreshes_its_model_peers() {
    let mut rom = Registry::new();
    rom.add_model("order", JsonDocument::new(json!({"qty": 2, "line": {"qty": 2}})))
        .unwrap();
    rom.add_evidence(Evidence::fact(
        "qty",
        p(1),
        ValueSource::bound("order", "/qty", ValueKind::Number),
    ))
    .unwrap();
    rom.add_evidence(Evidence::fact(
        "line",
        p(1),
        ValueSource::bound("order", "/line", ValueKind::Node),
    ))
    .unwrap();
    rom.add_evidence(Evidence::action_expression("double", p(1), "qty", "qty * 2").unwrap())
        .unwrap();
    rom.add_evidence(
        Evidence::rule("small", p(1), "qty < 3", vec![Clause::when_true("double")], false)
            .unwrap(),
    )
    .unwrap();
    rom.add_evidence(Evidence::action_execute("kick", p(1), "small"))
        .unwrap();
    rom.add_evidence(
        Evidence::rule("boot", p(999), "true", vec![Clause::when_true("kick")], true).unwrap(),
    )
    .unwrap();

    let mut trace = Trace::new();
    rom.evaluate_with(&mut trace).unwrap();

    assert_eq!(number(&rom, "qty"), Some(4.0));
    assert_eq!(
        rom.resolve_model("order").unwrap().read("/qty"),
        Some(Value::Number(4.0))
    );
    // `line` is re-read after the write to `qty`.
    let order = trace.evaluations();
    let write_at = order.iter().position(|id| *id == "double").unwrap();
    assert!(order[write_at + 1..].contains(&"line"), "order was {:?}", order);
}

#[test]
fn chainable_rules_rerun_when_their_inputs_change() {
    // counter climbs until the chainable rule turns false.
    let mut rom = Registry::new();
    rom.add_evidence(Evidence::literal("counter", p(1), 0.0)).unwrap();
    rom.add_evidence(
        Evidence::action_expression("bump", p(1), "counter", "counter + 1").unwrap(),
    )
    .unwrap();
    rom.add_evidence(Evidence::action_execute("again", p(2), "below")).unwrap();
    rom.add_evidence(
        Evidence::rule(
            "below",
            p(2),
            "counter < 3",
            vec![Clause::when_true("bump")],
            false,
        )
        .unwrap(),
    )
    .unwrap();
    rom.add_evidence(
        Evidence::rule(
            "watch",
            p(1),
            "counter >= 0",
            vec![Clause::when_true("again")],
            true,
        )
        .unwrap(),
    )
    .unwrap();
    rom.link_chainable_rules();

    let mut trace = Trace::new();
    rom.evaluate_with(&mut trace).unwrap();

    let watch_runs = trace.evaluations().iter().filter(|id| **id == "watch").count();
    assert_eq!(watch_runs, 2);
    // `below` fires once: it turns true, bumps the counter, and stays true
    // until it changes, so it does not fire again within the pass.
    assert_eq!(number(&rom, "counter"), Some(1.0));
}

#[test]
fn callbacks_reach_the_host() {
    let calls = Arc::new(Mutex::new(Vec::<String>::new()));
    let mut rom = Registry::new();
    let sink = Arc::clone(&calls);
    rom.register_callback("approved", move |event| {
        sink.lock().unwrap().push(event.action.to_string());
    })
    .unwrap();
    rom.add_evidence(Evidence::literal("score", p(1), 720.0)).unwrap();
    rom.add_evidence(Evidence::action_callback("notify", p(1), "approved"))
        .unwrap();
    rom.add_evidence(
        Evidence::rule(
            "gate",
            p(1),
            "score >= 700",
            vec![Clause::when_true("notify")],
            true,
        )
        .unwrap(),
    )
    .unwrap();

    let mut trace = Trace::new();
    rom.evaluate_with(&mut trace).unwrap();

    assert_eq!(*calls.lock().unwrap(), vec!["notify"]);
    assert_eq!(trace.callbacks(), vec!["approved"]);
}

#[test]
fn false_clauses_fire_when_rule_turns_false() {
    let mut rom = Registry::new();
    rom.add_evidence(Evidence::literal("age", p(1), 15.0)).unwrap();
    rom.add_evidence(Evidence::fact("status", p(1), ValueSource::naked(None)))
        .unwrap();
    rom.add_evidence(
        Evidence::action_expression("adult", p(1), "status", "\"adult\"").unwrap(),
    )
    .unwrap();
    rom.add_evidence(
        Evidence::action_expression("minor", p(1), "status", "\"minor\"").unwrap(),
    )
    .unwrap();
    rom.add_evidence(
        Evidence::rule(
            "age-check",
            p(1),
            "age >= 18",
            vec![Clause::when_true("adult"), Clause::when_false("minor")],
            false,
        )
        .unwrap(),
    )
    .unwrap();
    rom.add_evidence(Evidence::action_execute("start", p(1), "age-check"))
        .unwrap();
    rom.add_evidence(
        Evidence::rule("boot", p(1), "true", vec![Clause::when_true("start")], true).unwrap(),
    )
    .unwrap();

    rom.evaluate().unwrap();

    assert_eq!(rom.value("status").unwrap(), Some(&Value::from("minor")));
}
