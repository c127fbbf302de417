mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Evident forward-chaining rule engine.
#[derive(Parser)]
#[command(name = "evident", version, about = "Evident forward-chaining rule engine")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log filter (overrides RUST_LOG), e.g. `debug` or `evident_eval=trace`
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a rule set and run one evaluation pass
    Eval {
        /// Path to the rule-set JSON file
        ruleset: PathBuf,
        /// Bind a JSON model document (repeatable)
        #[arg(long = "model", value_name = "ID=PATH")]
        models: Vec<String>,
        /// Include the evaluation trace in the output
        #[arg(long)]
        trace: bool,
    },

    /// Compile a rule set and list its evidence
    Check {
        /// Path to the rule-set JSON file
        ruleset: PathBuf,
    },

    /// Compile and evaluate a single expression
    Expr {
        /// The expression source
        expression: String,
        /// Bind a literal fact; VALUE is JSON, or plain text (repeatable)
        #[arg(long = "fact", value_name = "ID=VALUE")]
        facts: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match cli.command {
        Commands::Eval {
            ruleset,
            models,
            trace,
        } => {
            commands::eval::cmd_eval(&ruleset, &models, trace, cli.output, cli.quiet);
        }
        Commands::Check { ruleset } => {
            commands::check::cmd_check(&ruleset, cli.output, cli.quiet);
        }
        Commands::Expr { expression, facts } => {
            commands::expr::cmd_expr(&expression, &facts, cli.output, cli.quiet);
        }
    }
}

/// Install a stderr subscriber. `--log-level` wins over `RUST_LOG`; with
/// neither set only warnings are shown.
fn init_tracing(level: Option<&str>) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match level {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(filter)
        .init();
}

/// Print an error to stderr in the selected format.
pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            let err_json = serde_json::json!({ "error": msg });
            eprintln!("{}", err_json);
        }
    }
}
