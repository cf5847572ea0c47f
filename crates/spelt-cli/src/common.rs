use std::collections::BTreeMap;

use owo_colors::OwoColorize;
use serde_json::{Map, Number};
use spelt::{Error, ErrorKind, Value};

pub fn render_error(source: &str, err: &Error) {
    eprintln!("{}: {}", err.kind.label().red().bold(), err.msg.red());
    if let (Some(line), Some(col)) = (err.line, err.col) {
        match source.lines().nth(line.saturating_sub(1)) {
            Some(src_line) => {
                let gutter = format!("{:3} | ", line);
                eprintln!("{}{}", gutter.bright_black(), src_line);
                let mut marker = " ".repeat(gutter.len() + col.saturating_sub(1));
                marker.push('^');
                eprintln!("{}", marker.red());
            }
            None => eprintln!("  at {}:{}", line, col),
        }
    }
    provide_error_suggestions(err);
}

pub fn provide_error_suggestions(err: &Error) {
    match err.kind {
        ErrorKind::Lexical if err.msg.contains("Unterminated string") => {
            eprintln!("{}", "Help: String is missing its closing quote.".yellow());
            eprintln!("    {}", "Strings use single or double quotes: 'a' or \"a\"".bright_black());
        }
        ErrorKind::Syntax if err.msg.contains("Invalid number") => {
            eprintln!("{}", "Help: Number literal is out of range or malformed.".yellow());
            eprintln!("    {}", "Use a suffix for wide values: 5000000000L, 1.5D".bright_black());
        }
        ErrorKind::Syntax if err.msg.contains("':'") => {
            eprintln!("{}", "Help: Conditionals need both branches.".yellow());
            eprintln!("    {}", "Example: age >= 18 ? 'adult' : 'minor'".bright_black());
        }
        ErrorKind::Syntax => {
            eprintln!("{}", "Help: Check that parentheses and brackets are balanced.".yellow());
        }
        ErrorKind::OperatorResolution => {
            eprintln!("{}", "Help: No operator accepts these operand types.".yellow());
            eprintln!("    {}", "Operands must be non-null; use coalesce(x, 0) for optional values".bright_black());
        }
        ErrorKind::FunctionNotFound => {
            eprintln!("{}", "Help: Check the function name and argument types.".yellow());
            eprintln!(
                "    {}",
                "Built-ins include: min, max, abs, pow, len, upper, lower, substring, join, str, int"
                    .bright_black()
            );
        }
        ErrorKind::Conversion => {
            eprintln!("{}", "Help: The value cannot be converted to the required type.".yellow());
            eprintln!("    {}", "Conditions must be booleans; convert with bool(x)".bright_black());
        }
        ErrorKind::Unresolved => {
            eprintln!("{}", "Help: The name is not defined in this context.".yellow());
            eprintln!("    {}", "Pass it with --var name=value or --vars file.json".bright_black());
        }
        ErrorKind::Arithmetic => {
            eprintln!("{}", "Help: Integer division by zero.".yellow());
            eprintln!("    {}", "Use a double operand to get infinity instead: 1.0 / 0".bright_black());
        }
        _ => {}
    }
}

/// Parses a `name=value` binding. The value is read as JSON when it parses,
/// as a plain string otherwise.
pub fn parse_binding(binding: &str) -> Result<(String, Value), String> {
    let (name, raw) = binding
        .split_once('=')
        .ok_or_else(|| format!("Expected name=value, got '{}'", binding))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Missing variable name in '{}'", binding));
    }
    let value = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => value_from_json(json),
        Err(_) => Value::from(raw),
    };
    Ok((name.to_string(), value))
}

pub fn value_from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::integer(i),
            None => Value::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        serde_json::Value::String(s) => Value::Str(s),
        serde_json::Value::Array(items) => {
            Value::List(items.into_iter().map(value_from_json).collect())
        }
        serde_json::Value::Object(entries) => Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, value_from_json(v)))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}

pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Char(c) => serde_json::Value::String(c.to_string()),
        Value::Int(n) => serde_json::Value::from(*n),
        Value::Long(n) => serde_json::Value::from(*n),
        Value::Double(d) => Number::from_f64(*d)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Map(entries) => serde_json::Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect::<Map<_, _>>(),
        ),
    }
}
