mod common;
mod repl;

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::debug;
use owo_colors::OwoColorize;
use spelt::{BasicToken, Context, Engine, EngineConfig};

use crate::common::{parse_binding, render_error, value_from_json, value_to_json};

/// Evaluate Spelt expressions. Starts a REPL when no expression is given.
#[derive(Parser, Debug)]
#[command(name = "spelt", version, about)]
struct Cli {
    /// Expression to evaluate
    expr: Option<String>,

    /// Read the expression from a file
    #[arg(short, long, value_name = "FILE", conflicts_with = "expr")]
    file: Option<PathBuf>,

    /// Declare a variable; the value is read as JSON, or as a string if it is not JSON
    #[arg(long = "var", value_name = "NAME=VALUE")]
    bindings: Vec<String>,

    /// Declare every key of a JSON object file as a variable
    #[arg(long = "vars", value_name = "FILE")]
    vars_file: Option<PathBuf>,

    /// Engine configuration file (JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Treat unresolved names as errors
    #[arg(long)]
    strict: bool,

    /// Import the template keywords
    #[arg(long)]
    template: bool,

    /// Print the token stream instead of evaluating
    #[arg(long, conflicts_with = "ast")]
    tokens: bool,

    /// Print the parsed tree instead of evaluating
    #[arg(long)]
    ast: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

fn fail(msg: impl AsRef<str>) -> ! {
    eprintln!("{}: {}", "error".red().bold(), msg.as_ref().red());
    std::process::exit(1);
}

fn load_config(cli: &Cli) -> EngineConfig {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path).unwrap_or_else(|e| fail(&e.msg)),
        None => EngineConfig::default(),
    }
    .with_env();
    config.strict |= cli.strict;
    config.template |= cli.template;
    debug!("configuration: {:?}", config);
    config
}

fn declare_variables(cli: &Cli, ctx: &mut Context) {
    if let Some(path) = &cli.vars_file {
        let text = fs::read_to_string(path)
            .unwrap_or_else(|e| fail(format!("Failed to read {}: {}", path.display(), e)));
        let json: serde_json::Value = serde_json::from_str(&text)
            .unwrap_or_else(|e| fail(format!("Invalid JSON in {}: {}", path.display(), e)));
        match json {
            serde_json::Value::Object(entries) => {
                for (name, value) in entries {
                    ctx.declare(name, value_from_json(value));
                }
            }
            _ => fail(format!("{} must contain a JSON object", path.display())),
        }
    }
    for binding in &cli.bindings {
        let (name, value) = parse_binding(binding).unwrap_or_else(|e| fail(e));
        ctx.declare(name, value);
    }
}

fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("warn"));
    let cli = Cli::parse();

    let engine = Engine::from_config(&load_config(&cli));
    let mut ctx = engine.context();
    declare_variables(&cli, &mut ctx);

    let source = match (&cli.expr, &cli.file) {
        (Some(expr), _) => expr.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .unwrap_or_else(|e| fail(format!("Failed to read {}: {}", path.display(), e))),
        (None, None) => {
            repl::start_repl(&engine, ctx);
            return;
        }
    };
    let source = source.trim_end();

    if cli.tokens {
        let cursor = engine.tokenize(source).unwrap_or_else(|e| {
            render_error(source, &e);
            std::process::exit(1);
        });
        for token in cursor.tokens().iter().filter(|t| !t.is(BasicToken::Eof)) {
            println!(
                "{:>3}:{:<3} {:<14} {}",
                token.span.line,
                token.span.col,
                token.kind.to_string(),
                token.text
            );
        }
        return;
    }

    let expression = engine.compile(source).unwrap_or_else(|e| {
        render_error(source, &e);
        std::process::exit(1);
    });
    if cli.ast {
        println!("{}", expression.node());
        return;
    }

    match expression.evaluate(&mut ctx) {
        Ok(value) if cli.json => println!("{}", value_to_json(&value)),
        Ok(value) => println!("{}", value),
        Err(e) => {
            render_error(source, &e);
            std::process::exit(1);
        }
    }
}
