use std::path::Path;

use evident_core::render;
use evident_eval::{Evidence, EvidenceKind, Registry, ValueSource};

use super::load_registry;
use crate::OutputFormat;

pub(crate) fn cmd_check(ruleset_path: &Path, output: OutputFormat, quiet: bool) {
    let registry = load_registry(ruleset_path, output, quiet);
    if quiet {
        return;
    }

    match output {
        OutputFormat::Json => {
            let nodes: Vec<serde_json::Value> = registry
                .evidence()
                .map(|node| describe(&registry, node))
                .collect();
            let json_output = serde_json::json!({
                "ruleset": ruleset_path.display().to_string(),
                "evidence": nodes,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&json_output)
                    .unwrap_or_else(|e| format!("serialization error: {}", e))
            );
        }
        OutputFormat::Text => {
            println!("{} evidence node(s):", registry.len());
            for node in registry.evidence() {
                println!(
                    "  {} [{}] priority {} (rank {})",
                    node.id(),
                    node.kind_name(),
                    node.priority(),
                    node.rank()
                );
                if let Some(expr) = node.expression() {
                    println!("    postfix: {}", render(expr.postfix()));
                }
                if !node.dependent_evidence().is_empty() {
                    println!("    reads: {}", node.dependent_evidence().join(", "));
                }
                if let Some(line) = target_line(node) {
                    println!("    {}", line);
                }
                let dependents = registry.dependents(node.id());
                if !dependents.is_empty() {
                    println!("    schedules: {}", dependents.join(", "));
                }
            }
        }
    }
}

fn target_line(node: &Evidence) -> Option<String> {
    match node.kind() {
        EvidenceKind::Fact => match node.source() {
            ValueSource::Bound(b) => Some(format!("bound: {}:{} as {}", b.model_id, b.path, b.kind)),
            ValueSource::Naked(_) => None,
        },
        EvidenceKind::ActionExpression(a) => Some(format!("writes: {}", a.target)),
        EvidenceKind::ActionExecute { operating } => Some(format!("triggers: {}", operating)),
        EvidenceKind::ActionCallback { callback } => Some(format!("calls: {}", callback)),
        EvidenceKind::Rule(body) => {
            let clauses: Vec<String> = body
                .clauses
                .iter()
                .map(|c| format!("{} when {}", c.action, c.truth))
                .collect();
            Some(format!("clauses: {}", clauses.join(", ")))
        }
    }
}

fn describe(registry: &Registry, node: &Evidence) -> serde_json::Value {
    let mut entry = serde_json::Map::new();
    entry.insert("id".to_string(), serde_json::json!(node.id()));
    entry.insert("kind".to_string(), serde_json::json!(node.kind_name()));
    entry.insert("priority".to_string(), serde_json::json!(node.priority()));
    entry.insert("rank".to_string(), serde_json::json!(node.rank()));
    if let Some(expr) = node.expression() {
        entry.insert("expression".to_string(), serde_json::json!(expr.source()));
        entry.insert(
            "postfix".to_string(),
            serde_json::json!(render(expr.postfix())),
        );
        entry.insert(
            "dependencies".to_string(),
            serde_json::json!(expr.dependencies()),
        );
    }
    if let Some(line) = target_line(node) {
        entry.insert("detail".to_string(), serde_json::json!(line));
    }
    entry.insert(
        "schedules".to_string(),
        serde_json::json!(registry.dependents(node.id())),
    );
    serde_json::Value::Object(entry)
}
