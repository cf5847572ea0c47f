use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{ArgAction, Parser};
use serde::Serialize;

use spelt::{Context, Engine, Evaluate, Value};

#[derive(Parser, Debug)]
#[command(name = "spelt-bench", about = "Time the Spelt lexer, parser and evaluator")]
struct Cli {
    /// Specific case(s) to run by name, e.g. strings. Runs every case if omitted.
    #[arg(short = 't', long = "test", action = ArgAction::Append)]
    tests: Vec<String>,

    /// Iterations per case (measured)
    #[arg(short = 'n', long = "iterations", default_value_t = 200)]
    iterations: u32,

    /// Warmup iterations (not measured)
    #[arg(short = 'w', long = "warmup", default_value_t = 20)]
    warmup: u32,

    /// Directory of `.el` files, one expression per line
    #[arg(short = 'd', long = "dir")]
    dir: Option<PathBuf>,

    /// Output JSON file path; default: benchmark/results/<timestamp>.json
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// List discovered cases and exit
    #[arg(long = "list", default_value_t = false)]
    list: bool,
}

#[derive(Debug, Serialize)]
struct BenchResult {
    name: String,
    expressions: usize,
    iterations: u32,
    avg_total_ms: f64,
    min_total_ms: f64,
    max_total_ms: f64,
    avg_lex_ms: f64,
    avg_parse_ms: f64,
    avg_eval_ms: f64,
}

#[derive(Debug, Serialize)]
struct OutputDoc {
    timestamp: String,
    spelt_version: String,
    benchmarks: Vec<BenchResult>,
}

#[derive(Debug, Clone)]
struct Case {
    name: String,
    expressions: Vec<String>,
}

const BUILTIN: &[(&str, &str)] = &[
    ("literals", "42\n3.5D\n'text'\ntrue\nnull\n[1, 2, 3]"),
    ("operators", "1 + 2 * 3\n(price * qty) % 7\nprice > qty and not user.banned"),
    ("calls", "max(1, 5, 3)\nupper(user.name)\njoin(items, ',')"),
];

fn workspace_root() -> PathBuf {
    // crates/spelt-bench -> crates -> root
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn expressions_of(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn discover_cases(dir: &Path) -> Vec<Case> {
    let mut out = Vec::new();
    if let Ok(entries) = fs::read_dir(dir) {
        for e in entries.flatten() {
            let p = e.path();
            if p.extension().and_then(|s| s.to_str()) != Some("el") {
                continue;
            }
            let name = p.file_stem().and_then(|s| s.to_str()).unwrap_or("").to_string();
            match fs::read_to_string(&p) {
                Ok(text) => out.push(Case {
                    name,
                    expressions: expressions_of(&text),
                }),
                Err(e) => eprintln!("skipping {}: {}", p.display(), e),
            }
        }
    }
    if out.is_empty() {
        out = BUILTIN
            .iter()
            .map(|(name, text)| Case {
                name: name.to_string(),
                expressions: expressions_of(text),
            })
            .collect();
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

fn bench_context(engine: &Engine) -> Context {
    let mut user = BTreeMap::new();
    user.insert("name".to_string(), Value::from("Ada"));
    user.insert("email".to_string(), Value::from("ada@example.org"));
    user.insert("age".to_string(), Value::Int(36));
    user.insert("banned".to_string(), Value::Bool(false));
    user.insert("roles".to_string(), Value::from(vec!["admin", "dev"]));

    let mut ctx = engine.context();
    ctx.declare("user", Value::Map(user));
    ctx.declare("items", Value::from(vec!["alpha", "beta", "gamma"]));
    ctx.declare("price", Value::Int(12));
    ctx.declare("qty", Value::Int(3));
    ctx
}

struct Timings {
    totals: Vec<f64>,
    lexes: Vec<f64>,
    parses: Vec<f64>,
    evals: Vec<f64>,
}

fn run_once(engine: &Engine, case: &Case) -> spelt::Result<(Duration, Duration, Duration)> {
    let mut lex = Duration::ZERO;
    let mut parse = Duration::ZERO;
    let mut eval = Duration::ZERO;
    let mut ctx = bench_context(engine);
    for src in &case.expressions {
        let t = Instant::now();
        let mut cursor = engine.tokenize(src)?;
        lex += t.elapsed();

        let t = Instant::now();
        let node = engine.parse(&mut cursor)?;
        parse += t.elapsed();

        let t = Instant::now();
        node.evaluate(&mut ctx)?;
        eval += t.elapsed();
    }
    Ok((lex, parse, eval))
}

fn measure(engine: &Engine, case: &Case, iterations: u32, warmup: u32) -> spelt::Result<Timings> {
    for _ in 0..warmup {
        run_once(engine, case)?;
    }
    let mut timings = Timings {
        totals: Vec::with_capacity(iterations as usize),
        lexes: Vec::with_capacity(iterations as usize),
        parses: Vec::with_capacity(iterations as usize),
        evals: Vec::with_capacity(iterations as usize),
    };
    for _ in 0..iterations {
        let (lex, parse, eval) = run_once(engine, case)?;
        timings.lexes.push(dur_ms(lex));
        timings.parses.push(dur_ms(parse));
        timings.evals.push(dur_ms(eval));
        timings.totals.push(dur_ms(lex + parse + eval));
    }
    Ok(timings)
}

fn dur_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn stats(vals: &[f64]) -> (f64, f64, f64) {
    let min = vals.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = vals.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let avg = if vals.is_empty() {
        0.0
    } else {
        vals.iter().sum::<f64>() / (vals.len() as f64)
    };
    (avg, min, max)
}

fn fail(msg: String) -> ! {
    eprintln!("{}", msg);
    std::process::exit(2);
}

fn main() {
    let cli = Cli::parse();
    let root = workspace_root();
    let dir = cli
        .dir
        .clone()
        .unwrap_or_else(|| root.join("benchmark/expressions"));
    let mut cases = discover_cases(&dir);

    if cli.list {
        println!("Discovered cases:");
        for c in &cases {
            println!("- {} ({} expressions)", c.name, c.expressions.len());
        }
        return;
    }

    if !cli.tests.is_empty() {
        let wanted: std::collections::HashSet<_> =
            cli.tests.iter().map(|s| s.to_lowercase()).collect();
        cases.retain(|c| wanted.contains(&c.name.to_lowercase()));
        if cases.is_empty() {
            fail("No matching cases. Use --list to see available.".to_string());
        }
    }

    let engine = Engine::new();
    let mut results = Vec::new();
    for case in &cases {
        let timings = measure(&engine, case, cli.iterations, cli.warmup)
            .unwrap_or_else(|e| fail(format!("{}: {} ({})", case.name, e, e.kind)));
        let (avg_t, min_t, max_t) = stats(&timings.totals);
        let (avg_l, _, _) = stats(&timings.lexes);
        let (avg_p, _, _) = stats(&timings.parses);
        let (avg_e, _, _) = stats(&timings.evals);

        println!(
            "{:>12}: total avg={:.4}ms min={:.4}ms max={:.4}ms | lex={:.4}ms parse={:.4}ms eval={:.4}ms",
            case.name, avg_t, min_t, max_t, avg_l, avg_p, avg_e
        );

        results.push(BenchResult {
            name: case.name.clone(),
            expressions: case.expressions.len(),
            iterations: cli.iterations,
            avg_total_ms: avg_t,
            min_total_ms: min_t,
            max_total_ms: max_t,
            avg_lex_ms: avg_l,
            avg_parse_ms: avg_p,
            avg_eval_ms: avg_e,
        });
    }

    let out_path = cli.output.clone().unwrap_or_else(|| {
        let ts_file = chrono::Utc::now().format("%Y-%m-%d_%H-%M-%SZ").to_string();
        root.join("benchmark/results").join(format!("{}.json", ts_file))
    });

    let doc = OutputDoc {
        timestamp: chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        spelt_version: env!("CARGO_PKG_VERSION").to_string(),
        benchmarks: results,
    };

    let json = serde_json::to_string_pretty(&doc)
        .unwrap_or_else(|e| fail(format!("Failed to serialize results: {}", e)));
    if let Some(parent) = out_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            fail(format!("Failed to create {}: {}", parent.display(), e));
        }
    }
    if let Err(e) = fs::write(&out_path, json) {
        fail(format!("Failed to write {}: {}", out_path.display(), e));
    }

    println!("\nSaved results to {}", out_path.display());
}
