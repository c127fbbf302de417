use std::collections::BTreeMap;
use std::process;

use evident_core::{render, Expression, Value};

use super::split_binding;
use crate::{report_error, OutputFormat};

pub(crate) fn cmd_expr(source: &str, facts: &[String], output: OutputFormat, quiet: bool) {
    let expression = match Expression::compile(source) {
        Ok(e) => e,
        Err(e) => {
            report_error(&format!("compile error: {}", e), output, quiet);
            process::exit(1);
        }
    };

    let mut env: BTreeMap<String, Value> = BTreeMap::new();
    for binding in facts {
        let (id, raw) = split_binding("--fact", binding, output, quiet);
        env.insert(id.to_string(), parse_literal(raw));
    }

    let result = match expression.evaluate(&env) {
        Ok(v) => v,
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
            let json_output = serde_json::json!({
                "expression": expression.source(),
                "infix": render(expression.infix()),
                "postfix": render(expression.postfix()),
                "dependencies": expression.dependencies(),
                "type": result.type_name(),
                "result": result,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&json_output)
                    .unwrap_or_else(|e| format!("serialization error: {}", e))
            );
        }
        OutputFormat::Text => {
            println!("infix:   {}", render(expression.infix()));
            println!("postfix: {}", render(expression.postfix()));
            println!("result:  {} ({})", result, result.type_name());
        }
    }
}

/// JSON scalars keep their type; anything else is taken as text.
fn parse_literal(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|json| Value::from_json(&json))
        .unwrap_or_else(|| Value::Text(raw.to_string()))
}
