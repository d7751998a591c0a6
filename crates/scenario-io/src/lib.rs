#![deny(warnings)]

//! Scenario loading, purchase-log output, and run configuration.
//!
//! Scenario text is whitespace-separated integers:
//! a `budget resources turns` header, one line per resource
//! (`id activation periodic active maintenance lifecycle powered type [value]`),
//! then one `min max profit` line per turn. Blank lines are ignored.

use grid_core::{
    validate_turn, Effect, PolicyKind, PurchaseRecord, ResourceDefinition, ResourceId, Scenario,
    TurnSpec, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(String),
    #[error("line {line}: {msg}")]
    Parse { line: usize, msg: String },
    #[error("invalid scenario: {0}")]
    Invalid(#[from] ValidationError),
    #[error("invalid config: {0}")]
    Config(String),
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for LoadError {
    fn from(e: serde_yaml::Error) -> Self {
        LoadError::Config(e.to_string())
    }
}

fn parse_err(line: usize, msg: impl Into<String>) -> LoadError {
    LoadError::Parse {
        line,
        msg: msg.into(),
    }
}

fn field<T: FromStr>(line: usize, name: &str, tok: Option<&&str>) -> Result<T, LoadError> {
    let tok = tok.ok_or_else(|| parse_err(line, format!("missing {name}")))?;
    tok.parse()
        .map_err(|_| parse_err(line, format!("invalid {name} '{tok}'")))
}

fn parse_resource(line: usize, toks: &[&str]) -> Result<ResourceDefinition, LoadError> {
    if !(8..=9).contains(&toks.len()) {
        return Err(parse_err(
            line,
            format!("expected 8 or 9 resource fields, found {}", toks.len()),
        ));
    }
    let mut it = toks.iter();
    let id = ResourceId(field(line, "id", it.next())?);
    let activation_cost = field(line, "activation cost", it.next())?;
    let periodic_cost = field(line, "periodic cost", it.next())?;
    let active_turns = field(line, "active turns", it.next())?;
    let maintenance_turns = field(line, "maintenance turns", it.next())?;
    let lifecycle = field(line, "lifecycle", it.next())?;
    let buildings_powered = field(line, "buildings powered", it.next())?;

    let code = it.next().copied().unwrap_or_default();
    let mut chars = code.chars();
    let letter = match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => return Err(parse_err(line, format!("invalid effect type '{code}'"))),
    };
    let value = match it.next() {
        Some(tok) if letter != 'X' => Some(field(line, "effect value", Some(tok))?),
        _ => None,
    };
    let effect =
        Effect::from_code(letter, value).map_err(|e| parse_err(line, e.to_string()))?;

    Ok(ResourceDefinition {
        id,
        activation_cost,
        periodic_cost,
        active_turns,
        maintenance_turns,
        lifecycle,
        buildings_powered,
        effect,
    })
}

fn parse_turn(line: usize, index: usize, toks: &[&str]) -> Result<TurnSpec, LoadError> {
    if toks.len() != 3 {
        return Err(parse_err(
            line,
            format!("expected 3 turn fields, found {}", toks.len()),
        ));
    }
    let spec = TurnSpec {
        min_buildings: field(line, "min buildings", toks.first())?,
        max_buildings: field(line, "max buildings", toks.get(1))?,
        profit_per_building: field(line, "profit per building", toks.get(2))?,
    };
    validate_turn(index, &spec).map_err(|e| parse_err(line, e.to_string()))?;
    Ok(spec)
}

/// Parse a scenario from text.
pub fn parse_scenario(text: &str) -> Result<Scenario, LoadError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.split_whitespace().collect::<Vec<_>>()))
        .filter(|(_, toks)| !toks.is_empty());

    let (hline, header) = lines.next().ok_or_else(|| parse_err(1, "empty input"))?;
    if header.len() != 3 {
        return Err(parse_err(hline, "expected header 'budget resources turns'"));
    }
    let budget: i64 = field(hline, "budget", header.first())?;
    let n_resources: usize = field(hline, "resource count", header.get(1))?;
    let n_turns: usize = field(hline, "turn count", header.get(2))?;

    let mut last = hline;
    let mut resources = Vec::with_capacity(n_resources.min(1024));
    for k in 0..n_resources {
        let (line, toks) = lines.next().ok_or_else(|| {
            parse_err(last, format!("expected {n_resources} resources, found {k}"))
        })?;
        resources.push(parse_resource(line, &toks)?);
        last = line;
    }

    let mut schedule = Vec::with_capacity(n_turns.min(1024));
    for k in 0..n_turns {
        let (line, toks) = lines
            .next()
            .ok_or_else(|| parse_err(last, format!("expected {n_turns} turns, found {k}")))?;
        schedule.push(parse_turn(line, k, &toks)?);
        last = line;
    }

    if let Some((line, _)) = lines.next() {
        return Err(parse_err(line, "unexpected trailing data"));
    }

    Ok(Scenario::new(budget, resources, schedule)?)
}

/// Read and parse a scenario file.
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<Scenario, LoadError> {
    let text = fs::read_to_string(path.as_ref())?;
    let scenario = parse_scenario(&text)?;
    info!(
        path = %path.as_ref().display(),
        resources = scenario.catalog.len(),
        turns = scenario.schedule.len(),
        "scenario loaded"
    );
    Ok(scenario)
}

/// One `turn count id...` line per accepted purchase.
pub fn format_purchase_log(records: &[PurchaseRecord]) -> String {
    records
        .iter()
        .map(|r| {
            let mut line = format!("{} {}", r.turn, r.ids.len());
            for id in &r.ids {
                line.push(' ');
                line.push_str(&id.to_string());
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn write_purchase_log<P: AsRef<Path>>(
    path: P,
    records: &[PurchaseRecord],
) -> Result<(), LoadError> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path.as_ref(), format_purchase_log(records))?;
    Ok(())
}

/// Settings for one CLI run. Missing keys fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Optional JSON run summary.
    pub report: Option<PathBuf>,
    pub policy: PolicyKind,
    pub seed: u64,
    /// Candidates evaluated per turn by the rollout policy.
    pub rollouts: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input.txt"),
            output: PathBuf::from("purchases.txt"),
            report: None,
            policy: PolicyKind::Greedy,
            seed: 42,
            rollouts: 16,
        }
    }
}

pub fn parse_config(text: &str) -> Result<RunConfig, LoadError> {
    let cfg: RunConfig = serde_yaml::from_str(text)?;
    if cfg.rollouts == 0 {
        return Err(LoadError::Config("rollouts must be > 0".into()));
    }
    Ok(cfg)
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RunConfig, LoadError> {
    parse_config(&fs::read_to_string(path)?)
}
