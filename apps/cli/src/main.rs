#![deny(warnings)]

//! Headless CLI: load a balance sheet, autoplay a session, print KPIs.

use anyhow::{bail, Context, Result};
use sim_ai::{run_session, SessionConfig, MAX_CLICKS_PER_STEP};
use sim_core::GameConfig;
use sim_runtime::EconomyEngine;
use tracing::info;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<String>,
    session: SessionConfig,
    json: bool,
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T> {
    let value = value.with_context(|| format!("{flag} needs a value"))?;
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("{flag}: cannot parse {value:?}"))
}

fn parse_args<I: Iterator<Item = String>>(mut it: I) -> Result<Args> {
    let mut args = Args::default();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next(),
            "--seconds" => args.session.seconds = parse_number(&arg, it.next())?,
            "--step" => args.session.step_secs = parse_number(&arg, it.next())?,
            "--clicks-per-sec" => args.session.clicks_per_sec = parse_number(&arg, it.next())?,
            "--seed" => args.session.seed = parse_number(&arg, it.next())?,
            "--json" => args.json = true,
            other => bail!("unknown argument: {other}"),
        }
    }
    let session = &args.session;
    if session.step_secs <= 0.0 || !session.step_secs.is_finite() {
        bail!("--step must be > 0");
    }
    if session.clicks_per_sec < 0.0 || !session.clicks_per_sec.is_finite() {
        bail!("--clicks-per-sec must be >= 0");
    }
    if session.clicks_per_sec * session.step_secs > MAX_CLICKS_PER_STEP {
        bail!(
            "--clicks-per-sec {} exceeds {} actions per {}s step",
            session.clicks_per_sec,
            MAX_CLICKS_PER_STEP,
            session.step_secs
        );
    }
    Ok(args)
}

/// Log subscriber on stderr; `filter` alone decides what is emitted.
fn subscriber(filter: EnvFilter) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    subscriber(filter).init();

    let args = parse_args(std::env::args().skip(1))?;
    info!(
        sha = env!("GIT_SHA"),
        built = env!("BUILD_DATE"),
        config = ?args.config,
        seconds = args.session.seconds,
        "starting CLI"
    );

    let config = match &args.config {
        Some(path) => balance::load_config(path)?,
        None => GameConfig::default(),
    };
    let mut engine = EconomyEngine::new(config)?;
    let report = run_session(&mut engine, &args.session);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let snap = &report.snapshot;
    println!(
        "KPI | seconds: {:.0} | score: {:.0} | balance: {:.0} | rate: {:.1}/s | click: {:.0} | level: {} | achievements: {}/{}",
        snap.elapsed_secs,
        snap.score,
        snap.balance,
        snap.rate_per_second,
        snap.manual_action_value,
        snap.level,
        snap.achievements_unlocked,
        snap.achievements_total
    );
    println!(
        "Actions | clicks: {} | hires: {} | upgrades: {} | evolutions: {}",
        report.stats.clicks, report.stats.hires, report.stats.upgrades, report.stats.evolutions
    );
    for p in &snap.producers {
        println!("  {:<14} x{:<6} next: {}", p.display_name, p.count, p.cost);
    }
    for n in &report.unlocked {
        println!("  [{:>7.1}s] {}", n.fired_at, n.message);
    }
    Ok(())
}
