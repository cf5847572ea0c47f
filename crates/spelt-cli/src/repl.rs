use std::io::{self, Write};

use owo_colors::OwoColorize;
use spelt::{BasicToken, Context, Engine, TokenType};

use crate::common::render_error;

pub fn start_repl(engine: &Engine, mut ctx: Context) {
    println!("{}", "Spelt REPL. Type :help for help, :quit to exit.".bold().green());

    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() { "spelt> " } else { "...  > " };
        print!("{}", prompt.cyan());
        let _ = io::stdout().flush();

        let mut line = String::new();
        let n = match io::stdin().read_line(&mut line) {
            Ok(n) => n,
            Err(_) => {
                println!("<input error>");
                break;
            }
        };
        if n == 0 {
            println!("\nGoodbye.");
            break;
        }
        let trimmed = line.trim();

        if buffer.is_empty() && trimmed.starts_with(':') {
            let (command, rest) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
            match command {
                ":quit" | ":q" | ":exit" => {
                    println!("Goodbye.");
                    break;
                }
                ":help" | ":h" => print_help(),
                ":vars" => print_vars(&ctx),
                ":reset" => {
                    ctx = engine.context();
                    println!("{}", "Variables cleared.".yellow());
                }
                ":strict" => {
                    ctx.set_strict(!ctx.is_strict());
                    println!("strict mode {}", if ctx.is_strict() { "on" } else { "off" });
                }
                ":tokens" => print_tokens(engine, rest),
                ":ast" => match engine.compile(rest) {
                    Ok(expr) => println!("{}", expr.node().to_string().bright_blue()),
                    Err(e) => render_error(rest, &e),
                },
                ":let" => bind(engine, &mut ctx, rest),
                _ => println!("{}", "Unknown command. Type :help.".red()),
            }
            continue;
        }
        if trimmed.is_empty() && buffer.is_empty() {
            continue;
        }

        buffer.push_str(&line);
        if !is_complete(engine, &buffer) {
            continue;
        }

        let source = buffer.trim_end();
        match engine.eval(source, &mut ctx) {
            Ok(value) => println!("{}", value.to_string().bright_blue()),
            Err(e) => render_error(source, &e),
        }
        buffer.clear();
    }
}

fn print_help() {
    println!("{}", "Commands:".bold());
    for (cmd, text) in [
        (":help", "Show this help"),
        (":quit", "Exit the REPL"),
        (":vars", "List variables"),
        (":let name = expr", "Evaluate expr and bind it to name"),
        (":tokens expr", "Show the tokens of expr"),
        (":ast expr", "Show the parsed tree of expr"),
        (":strict", "Toggle strict name resolution"),
        (":reset", "Clear all variables"),
    ] {
        println!("  {:<18} {}", cmd.yellow(), text);
    }
    println!("Anything else is evaluated. Unbalanced brackets continue on the next line.");
}

fn print_vars(ctx: &Context) {
    let vars = ctx.variables();
    if vars.is_empty() {
        println!("{}", "<no vars>".dimmed());
        return;
    }
    for (name, value) in vars {
        println!("{} = {}", name.yellow(), value.to_string().bright_blue());
    }
}

fn print_tokens(engine: &Engine, source: &str) {
    match engine.tokenize(source) {
        Ok(cursor) => {
            for token in cursor.tokens().iter().filter(|t| !t.is(BasicToken::Eof)) {
                println!("  {:<14} {}", token.kind.to_string().yellow(), token.text);
            }
        }
        Err(e) => render_error(source, &e),
    }
}

fn bind(engine: &Engine, ctx: &mut Context, rest: &str) {
    let Some((name, expr)) = rest.split_once('=') else {
        println!("{}", "Usage: :let name = expr".red());
        return;
    };
    let name = name.trim();
    let expr = expr.trim();
    match engine.eval(expr, ctx) {
        Ok(value) => {
            println!("{} = {}", name.yellow(), value.to_string().bright_blue());
            ctx.declare(name, value);
        }
        Err(e) => render_error(expr, &e),
    }
}

/// Input is complete once brackets balance. Input that does not tokenize
/// yet, such as an open string, waits for more lines.
fn is_complete(engine: &Engine, input: &str) -> bool {
    let cursor = match engine.tokenize(input) {
        Ok(cursor) => cursor,
        Err(_) => return false,
    };
    let open: [TokenType; 2] = [BasicToken::LParen.into(), BasicToken::LBracket.into()];
    let close: [TokenType; 2] = [BasicToken::RParen.into(), BasicToken::RBracket.into()];
    let mut depth = 0i32;
    for token in cursor.tokens() {
        if token.is_any(&open) {
            depth += 1;
        } else if token.is_any(&close) {
            depth -= 1;
        }
    }
    depth <= 0
}
