pub(crate) mod check;
pub(crate) mod eval;
pub(crate) mod expr;

use std::path::Path;
use std::process;

use evident_eval::{Registry, RuleSet};

use crate::{report_error, OutputFormat};

/// Read and compile a rule set, exiting with status 1 on any failure.
pub(crate) fn load_registry(path: &Path, output: OutputFormat, quiet: bool) -> Registry {
    let text = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(_) => {
            let msg = format!("error: rule set not found: {}", path.display());
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };
    let ruleset = RuleSet::from_json(&text).unwrap_or_else(|e| {
        report_error(&format!("error: {}: {}", path.display(), e), output, quiet);
        process::exit(1);
    });
    ruleset.compile().unwrap_or_else(|e| {
        report_error(&format!("error: {}: {}", path.display(), e), output, quiet);
        process::exit(1);
    })
}

/// Split an `ID=VALUE` argument.
pub(crate) fn split_binding<'a>(
    flag: &str,
    arg: &'a str,
    output: OutputFormat,
    quiet: bool,
) -> (&'a str, &'a str) {
    match arg.split_once('=') {
        Some((id, value)) if !id.trim().is_empty() => (id.trim(), value),
        _ => {
            let msg = format!("error: invalid {} '{}': expected ID=VALUE", flag, arg);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}
