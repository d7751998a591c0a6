#![deny(warnings)]

//! Headless CLI: load a scenario, play it with a policy, write the purchase log.

use anyhow::{bail, Context, Result};
use grid_ai::{build_policy, PolicyKind};
use scenario_io::{load_config, load_scenario, write_purchase_log, RunConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    report: Option<PathBuf>,
    policy: Option<PolicyKind>,
    seed: Option<u64>,
    rollouts: Option<usize>,
    version: bool,
}

fn parse_args<I: Iterator<Item = String>>(mut it: I) -> Result<Args> {
    let mut args = Args::default();
    while let Some(arg) = it.next() {
        let mut value = |name: &str| it.next().with_context(|| format!("{name} needs a value"));
        match arg.as_str() {
            "--config" => args.config = Some(value("--config")?.into()),
            "--input" => args.input = Some(value("--input")?.into()),
            "--output" => args.output = Some(value("--output")?.into()),
            "--report" => args.report = Some(value("--report")?.into()),
            "--policy" => {
                let v = value("--policy")?;
                args.policy = Some(v.parse().map_err(anyhow::Error::msg)?);
            }
            "--seed" => args.seed = Some(value("--seed")?.parse().context("--seed")?),
            "--rollouts" => args.rollouts = Some(value("--rollouts")?.parse().context("--rollouts")?),
            "--version" => args.version = true,
            other => bail!("unknown argument '{other}'"),
        }
    }
    Ok(args)
}

/// File config first, then flags on top.
fn resolve_config(args: &Args) -> Result<RunConfig> {
    let mut cfg = match &args.config {
        Some(path) => load_config(path).with_context(|| format!("loading {}", path.display()))?,
        None => RunConfig::default(),
    };
    if let Some(v) = &args.input {
        cfg.input = v.clone();
    }
    if let Some(v) = &args.output {
        cfg.output = v.clone();
    }
    if let Some(v) = &args.report {
        cfg.report = Some(v.clone());
    }
    if let Some(v) = args.policy {
        cfg.policy = v;
    }
    if let Some(v) = args.seed {
        cfg.seed = v;
    }
    if let Some(v) = args.rollouts {
        cfg.rollouts = v.max(1);
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.version {
        println!(
            "power-grid cli {} ({} built {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    let cfg = resolve_config(&args)?;
    info!(?cfg, "starting CLI");

    let scenario = load_scenario(&cfg.input)
        .with_context(|| format!("loading scenario {}", cfg.input.display()))?;
    let engine = grid_runtime::init_engine(scenario);
    let mut policy = build_policy(cfg.policy, cfg.seed, cfg.rollouts);
    let summary = grid_runtime::run_to_end(engine, policy.as_mut())?;

    write_purchase_log(&cfg.output, &summary.purchases)
        .with_context(|| format!("writing {}", cfg.output.display()))?;
    if let Some(report) = &cfg.report {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(report, json).with_context(|| format!("writing {}", report.display()))?;
    }

    println!("Output written to {}", cfg.output.display());
    println!(
        "Total Score: {} | final budget: {} | purchases: {} | turns: {}",
        summary.total_score,
        summary.final_budget,
        summary.purchases.len(),
        summary.turns.len()
    );
    Ok(())
}
