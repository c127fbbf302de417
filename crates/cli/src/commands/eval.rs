use std::path::Path;
use std::process;

use evident_eval::{JsonDocument, Registry, Trace, TraceEvent};

use super::{load_registry, split_binding};
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_eval(
    ruleset_path: &Path,
    models: &[String],
    trace: bool,
    output: OutputFormat,
    quiet: bool,
) {
    let mut registry = load_registry(ruleset_path, output, quiet);

    for binding in models {
        let (id, path) = split_binding("--model", binding, output, quiet);
        let text = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(_) => {
                let msg = format!("error: model file not found: {}", path);
                report_error(&msg, output, quiet);
                process::exit(1);
            }
        };
        let document = match JsonDocument::parse(&text) {
            Ok(d) => d,
            Err(e) => {
                let msg = format!("error: invalid JSON in {}: {}", path, e);
                report_error(&msg, output, quiet);
                process::exit(1);
            }
        };
        if let Err(e) = registry.add_model(id, document) {
            report_error(&format!("error: {}", e), output, quiet);
            process::exit(1);
        }
    }

    tracing::debug!(
        ruleset = %ruleset_path.display(),
        nodes = registry.len(),
        models = registry.models().len(),
        "starting pass"
    );
    let mut recorder = Trace::new();
    let summary = match registry.evaluate_with(&mut recorder) {
        Ok(s) => s,
        Err(e) => {
            report_error(&format!("evaluation error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => {
            let mut json_output = serde_json::Map::new();
            json_output.insert("facts".to_string(), fact_values(&registry));
            let documents: serde_json::Map<String, serde_json::Value> = registry
                .models()
                .ids()
                .filter_map(|id| {
                    let doc = registry.resolve_model(id).ok()?;
                    Some((id.to_string(), doc.snapshot()))
                })
                .collect();
            json_output.insert("models".to_string(), serde_json::Value::Object(documents));
            json_output.insert("summary".to_string(), serde_json::json!(summary));
            if trace {
                json_output.insert("trace".to_string(), serde_json::json!(recorder.events));
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::Value::Object(json_output))
                    .unwrap_or_else(|e| format!("serialization error: {}", e))
            );
        }
        OutputFormat::Text => {
            for node in registry.evidence().filter(|e| e.is_fact()) {
                match node.value() {
                    Some(v) => println!("{} = {}", node.id(), v),
                    None => println!("{} = <unset>", node.id()),
                }
            }
            if trace {
                println!("trace:");
                for event in &recorder.events {
                    println!("  {}", describe(event));
                }
            }
            println!(
                "{} evaluation(s), {} change(s), {} activation(s), {} callback(s)",
                summary.evaluations, summary.changes, summary.activations, summary.callbacks
            );
        }
    }
}

fn fact_values(registry: &Registry) -> serde_json::Value {
    let facts: serde_json::Map<String, serde_json::Value> = registry
        .evidence()
        .filter(|e| e.is_fact())
        .map(|e| {
            let value = e.value().map_or(serde_json::Value::Null, |v| v.to_json());
            (e.id().to_string(), value)
        })
        .collect();
    serde_json::Value::Object(facts)
}

fn describe(event: &TraceEvent) -> String {
    match event {
        TraceEvent::Evaluated { id } => format!("evaluate {}", id),
        TraceEvent::Changed { id, value: Some(v) } => format!("change   {} -> {}", id, v),
        TraceEvent::Changed { id, value: None } => format!("change   {} -> <unset>", id),
        TraceEvent::Activated { by, id } => format!("activate {} (by {})", id, by),
        TraceEvent::Callback { action, name } => format!("callback {} (from {})", name, action),
    }
}
