//! canonstrat CLI — validate, compile, and evaluate canonical strategy documents.
//!
//! Commands:
//! - `validate` — check a strategy document and print its normalized form
//! - `compile` — summarize a compiled strategy (session window, fingerprint)
//! - `evaluate` — run the compiled decisions against one context
//! - `scan` — evaluate a JSONL file of contexts in parallel
//! - `convert-time` — map a trader-local clock time onto exchange time
//! - `instruments` — list the contract registry
//!
//! Results go to stdout; logs go to stderr.

mod config;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use canonstrat_core::domain::all_contracts;
use canonstrat_core::session::EXCHANGE_TZ;
use canonstrat_core::{
    compile_canonical_strategy, convert_to_exchange_time, resolve_timezone, validate_canonical,
    CompiledStrategy, EvaluationContext, Side, TradePlan,
};

use config::CliConfig;

#[derive(Parser)]
#[command(
    name = "canonstrat",
    about = "canonstrat — canonical strategy schema and pattern compiler"
)]
struct Cli {
    /// Path to a TOML config file. Defaults to ./canonstrat.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (e.g. info, canonstrat_core=trace). RUST_LOG takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a strategy document and print the normalized JSON.
    Validate {
        /// Strategy JSON file.
        file: PathBuf,
    },
    /// Compile a strategy document and print a summary.
    Compile {
        /// Strategy JSON file.
        file: PathBuf,
    },
    /// Evaluate a compiled strategy against one context.
    Evaluate {
        /// Strategy JSON file.
        #[arg(long)]
        strategy: PathBuf,

        /// Evaluation context JSON file.
        #[arg(long)]
        context: PathBuf,

        /// Account balance in dollars. Defaults to the configured balance.
        #[arg(long)]
        balance: Option<f64>,
    },
    /// Evaluate a compiled strategy against every context in a JSONL file.
    Scan {
        /// Strategy JSON file.
        #[arg(long)]
        strategy: PathBuf,

        /// One evaluation context per line.
        #[arg(long)]
        contexts: PathBuf,

        /// Account balance in dollars. Defaults to the configured balance.
        #[arg(long)]
        balance: Option<f64>,
    },
    /// Convert a trader-local HH:MM to exchange (Chicago) time.
    ConvertTime {
        /// Clock time, HH:MM.
        time: String,

        /// Trader timezone (IANA name, abbreviation, or city). Defaults to the configured fallback.
        #[arg(long)]
        tz: Option<String>,

        /// Reference date (YYYY-MM-DD). Defaults to today in the trader timezone.
        #[arg(long)]
        date: Option<String>,
    },
    /// List the contract registry.
    Instruments,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;
    init_logging(cli.log_level.as_deref().unwrap_or(&config.logging.level));

    match cli.command {
        Commands::Validate { file } => run_validate(&file),
        Commands::Compile { file } => run_compile(&file),
        Commands::Evaluate {
            strategy,
            context,
            balance,
        } => run_evaluate(&strategy, &context, balance.unwrap_or(config.defaults.balance)),
        Commands::Scan {
            strategy,
            contexts,
            balance,
        } => run_scan(&strategy, &contexts, balance.unwrap_or(config.defaults.balance)),
        Commands::ConvertTime { time, tz, date } => {
            run_convert_time(&time, tz.as_deref(), date.as_deref(), &config)
        }
        Commands::Instruments => run_instruments(),
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

fn load_strategy(path: &Path) -> Result<CompiledStrategy> {
    let raw = read_json(path)?;
    let strategy = match validate_canonical(&raw) {
        Ok(s) => s,
        Err(errors) => {
            for e in &errors {
                eprintln!("  {e}");
            }
            bail!("{} failed validation with {} error(s)", path.display(), errors.len());
        }
    };
    let compiled = compile_canonical_strategy(&strategy);
    info!(
        file = %path.display(),
        pattern = %compiled.pattern(),
        fingerprint = compiled.fingerprint().short(),
        "loaded strategy"
    );
    Ok(compiled)
}

fn run_validate(path: &Path) -> Result<()> {
    let raw = read_json(path)?;
    match validate_canonical(&raw) {
        Ok(strategy) => {
            println!("{}", serde_json::to_string_pretty(&strategy)?);
            Ok(())
        }
        Err(errors) => {
            eprintln!("{} is invalid:", path.display());
            for e in &errors {
                eprintln!("  [{}] {e}", e.kind);
            }
            std::process::exit(1);
        }
    }
}

fn run_compile(path: &Path) -> Result<()> {
    let compiled = load_strategy(path)?;
    let spec = compiled.instrument();
    let session = compiled.session().spec();
    let today = Utc::now().with_timezone(&EXCHANGE_TZ).date_naive();

    println!("Pattern:      {}", compiled.pattern());
    println!("Instrument:   {} ({})", spec.symbol, spec.description);
    println!("Tick:         {} = ${:.2}", spec.tick_size, spec.tick_value);
    println!("Direction:    {}", direction_label(&compiled));
    println!("Session:      {} [{}]", session.kind.as_str(), session.timezone);
    println!("Window today: {} exchange time", compiled.session().times_on(today));
    println!(
        "Risk:         {}% of balance, max {} contract(s)",
        compiled.sizer().risk_percent(),
        compiled.sizer().max_contracts()
    );
    println!("Fingerprint:  {}", compiled.fingerprint());
    Ok(())
}

fn direction_label(compiled: &CompiledStrategy) -> String {
    let sides: Vec<String> = compiled.direction().sides().iter().map(Side::to_string).collect();
    sides.join(" + ")
}

/// One evaluation result, as printed by `evaluate` and `scan`.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct Decision {
    time: DateTime<Utc>,
    in_session: bool,
    side: Option<Side>,
    plan: Option<TradePlan>,
}

fn decide(compiled: &CompiledStrategy, ctx: &EvaluationContext, balance: f64) -> Decision {
    Decision {
        time: ctx.time,
        in_session: compiled.is_time_valid(ctx.time),
        side: compiled.entry_side(ctx),
        plan: compiled.plan_entry(ctx, balance),
    }
}

fn run_evaluate(strategy: &Path, context: &Path, balance: f64) -> Result<()> {
    let compiled = load_strategy(strategy)?;
    let ctx: EvaluationContext = serde_json::from_value(read_json(context)?)
        .with_context(|| format!("{} is not an evaluation context", context.display()))?;
    let decision = decide(&compiled, &ctx, balance);
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

/// Parse non-blank JSONL lines, keeping 1-based line numbers for errors.
fn parse_contexts(text: &str) -> Result<Vec<EvaluationContext>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).with_context(|| format!("line {}: bad context", i + 1))
        })
        .collect()
}

fn run_scan(strategy: &Path, contexts: &Path, balance: f64) -> Result<()> {
    let compiled = load_strategy(strategy)?;
    let text = std::fs::read_to_string(contexts)
        .with_context(|| format!("failed to read {}", contexts.display()))?;
    let ctxs = parse_contexts(&text)?;
    debug!(count = ctxs.len(), "scanning contexts");

    let lines: Vec<String> = ctxs
        .par_iter()
        .map(|ctx| serde_json::to_string(&decide(&compiled, ctx, balance)))
        .collect::<Result<_, _>>()?;

    for line in &lines {
        println!("{line}");
    }
    info!(contexts = lines.len(), "scan complete");
    Ok(())
}

fn parse_clock(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .with_context(|| format!("'{s}' is not a HH:MM time"))
}

fn run_convert_time(
    time: &str,
    tz: Option<&str>,
    date: Option<&str>,
    config: &CliConfig,
) -> Result<()> {
    let clock = parse_clock(time)?;
    let trader_tz = match tz {
        Some(name) => resolve_timezone(name)?,
        None => config.fallback_timezone()?,
    };
    let reference: NaiveDate = date
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("--date must be YYYY-MM-DD")?
        .unwrap_or_else(|| Utc::now().with_timezone(&trader_tz).date_naive());

    let converted = convert_to_exchange_time(clock, trader_tz, reference);
    println!("{}", serde_json::to_string_pretty(&converted)?);
    Ok(())
}

fn run_instruments() -> Result<()> {
    println!(
        "{:<6} {:<28} {:<6} {:>9} {:>10} {:>11} {:<6}",
        "Symbol", "Description", "Exch", "Tick", "Tick $", "Point $", "Pair"
    );
    println!("{}", "-".repeat(82));
    for c in all_contracts() {
        println!(
            "{:<6} {:<28} {:<6} {:>9} {:>10.2} {:>11.2} {:<6}",
            c.symbol,
            c.description,
            c.exchange,
            c.tick_size,
            c.tick_value,
            c.point_value,
            c.paired_symbol.unwrap_or("-"),
        );
    }
    Ok(())
}
