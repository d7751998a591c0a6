#![deny(warnings)]

//! Core domain models and invariants for the power-grid economy.
//!
//! This crate defines the immutable inputs of a run (resource catalog, turn
//! schedule, starting budget) with validation helpers to guarantee basic
//! invariants before the engine ever sees them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Catalog key of a resource definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Modifier carried by a resource, with its value.
///
/// Percentages may be negative. The accumulator carries a capacity instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// A: rescales each producing instance's output.
    Production(i64),
    /// B: rescales the turn's demand bounds.
    Threshold(i64),
    /// C: rescales the lifecycle of instances bought while it is active.
    Lifecycle(i64),
    /// D: rescales the turn's profit per building.
    ProfitRate(i64),
    /// E: banks surplus power up to this capacity.
    Accumulator(u64),
    /// X: pure producer.
    Plain,
}

impl Effect {
    /// Build an effect from its single-letter code and optional value.
    pub fn from_code(code: char, value: Option<i64>) -> Result<Self, ValidationError> {
        let need = |v: Option<i64>| v.ok_or(ValidationError::MissingEffectValue(code));
        match code {
            'A' => Ok(Effect::Production(need(value)?)),
            'B' => Ok(Effect::Threshold(need(value)?)),
            'C' => Ok(Effect::Lifecycle(need(value)?)),
            'D' => Ok(Effect::ProfitRate(need(value)?)),
            'E' => {
                let v = need(value)?;
                u64::try_from(v)
                    .map(Effect::Accumulator)
                    .map_err(|_| ValidationError::NegativeCapacity(v))
            }
            'X' => Ok(Effect::Plain),
            other => Err(ValidationError::UnknownEffect(other)),
        }
    }

    /// Single-letter code, e.g. 'A'.
    pub fn code(&self) -> char {
        match self {
            Effect::Production(_) => 'A',
            Effect::Threshold(_) => 'B',
            Effect::Lifecycle(_) => 'C',
            Effect::ProfitRate(_) => 'D',
            Effect::Accumulator(_) => 'E',
            Effect::Plain => 'X',
        }
    }

    /// Percentage for A-D, `None` otherwise.
    pub fn percentage(&self) -> Option<i64> {
        match *self {
            Effect::Production(p)
            | Effect::Threshold(p)
            | Effect::Lifecycle(p)
            | Effect::ProfitRate(p) => Some(p),
            Effect::Accumulator(_) | Effect::Plain => None,
        }
    }

    /// Bank capacity for E, `None` otherwise.
    pub fn capacity(&self) -> Option<u64> {
        match *self {
            Effect::Accumulator(c) => Some(c),
            _ => None,
        }
    }

    /// Raw value as written in a scenario file (absent for X).
    pub fn value(&self) -> Option<i64> {
        match *self {
            Effect::Accumulator(c) => Some(i64::try_from(c).unwrap_or(i64::MAX)),
            other => other.percentage(),
        }
    }
}

/// A purchasable resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    /// Catalog key (unique).
    pub id: ResourceId,
    /// One-off price paid at purchase.
    pub activation_cost: i64,
    /// Upkeep charged on every producing turn.
    pub periodic_cost: i64,
    /// Length of each active window.
    pub active_turns: u32,
    /// Cooldown after each active window; 0 means no cooldown cycle.
    pub maintenance_turns: u32,
    /// Total turns an instance may exist.
    pub lifecycle: u32,
    /// Base production per active turn.
    pub buildings_powered: u64,
    /// Modifier category and value.
    pub effect: Effect,
}

/// Demand bounds and price for a single turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSpec {
    /// Power floor; below it the turn earns nothing.
    pub min_buildings: u64,
    /// Power ceiling counted toward profit.
    pub max_buildings: u64,
    /// Currency earned per powered building.
    pub profit_per_building: u64,
}

/// Immutable resource catalog. Definitions are handed out as shared handles
/// so every purchased instance points at the same definition.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    defs: Vec<Arc<ResourceDefinition>>,
    index: BTreeMap<ResourceId, usize>,
}

impl Catalog {
    /// Build a catalog, validating every definition and rejecting duplicate ids.
    pub fn new(defs: Vec<ResourceDefinition>) -> Result<Self, ValidationError> {
        let mut index = BTreeMap::new();
        let mut shared = Vec::with_capacity(defs.len());
        for (pos, def) in defs.into_iter().enumerate() {
            validate_resource(&def)?;
            if index.insert(def.id, pos).is_some() {
                return Err(ValidationError::DuplicateId(def.id));
            }
            shared.push(Arc::new(def));
        }
        Ok(Self {
            defs: shared,
            index,
        })
    }

    /// Look up a definition by id.
    pub fn get(&self, id: ResourceId) -> Option<&Arc<ResourceDefinition>> {
        self.index.get(&id).map(|&pos| &self.defs[pos])
    }

    /// Definitions in input order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ResourceDefinition>> {
        self.defs.iter()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Everything a run needs: starting budget, catalog, and turn schedule.
#[derive(Clone, Debug)]
pub struct Scenario {
    pub budget: i64,
    pub catalog: Catalog,
    pub schedule: Vec<TurnSpec>,
}

impl Scenario {
    /// Assemble and validate a scenario.
    pub fn new(
        budget: i64,
        resources: Vec<ResourceDefinition>,
        schedule: Vec<TurnSpec>,
    ) -> Result<Self, ValidationError> {
        if budget < 0 {
            return Err(ValidationError::NegativeBudget(budget));
        }
        for (turn, spec) in schedule.iter().enumerate() {
            validate_turn(turn, spec)?;
        }
        Ok(Self {
            budget,
            catalog: Catalog::new(resources)?,
            schedule,
        })
    }
}

/// Which policy a run uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    #[default]
    Greedy,
    Rollout,
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "greedy" => Ok(PolicyKind::Greedy),
            "rollout" => Ok(PolicyKind::Rollout),
            other => Err(format!("unknown policy '{other}'")),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyKind::Greedy => f.write_str("greedy"),
            PolicyKind::Rollout => f.write_str("rollout"),
        }
    }
}

/// A purchase the engine accepted, as written to the purchase log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub turn: usize,
    pub ids: Vec<ResourceId>,
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Two definitions share an id.
    #[error("duplicate resource id {0}")]
    DuplicateId(ResourceId),
    /// Costs must be non-negative.
    #[error("resource {0} has a negative cost")]
    NegativeMoney(ResourceId),
    /// An instance must live at least one turn.
    #[error("resource {0} has a zero lifecycle")]
    ZeroLifecycle(ResourceId),
    /// Starting budget must be non-negative.
    #[error("starting budget {0} is negative")]
    NegativeBudget(i64),
    /// Effect letter outside A-E, X.
    #[error("unknown effect type '{0}'")]
    UnknownEffect(char),
    /// A-E need a value.
    #[error("effect type '{0}' requires a value")]
    MissingEffectValue(char),
    /// Accumulator capacity must be non-negative.
    #[error("accumulator capacity {0} is negative")]
    NegativeCapacity(i64),
    /// Demand floor above ceiling.
    #[error("turn {turn}: min buildings {min} exceeds max buildings {max}")]
    InvertedDemandBounds { turn: usize, min: u64, max: u64 },
}

/// Validate a resource definition.
pub fn validate_resource(def: &ResourceDefinition) -> Result<(), ValidationError> {
    if def.activation_cost < 0 || def.periodic_cost < 0 {
        return Err(ValidationError::NegativeMoney(def.id));
    }
    if def.lifecycle == 0 {
        return Err(ValidationError::ZeroLifecycle(def.id));
    }
    Ok(())
}

/// Validate the demand bounds of one turn.
pub fn validate_turn(turn: usize, spec: &TurnSpec) -> Result<(), ValidationError> {
    if spec.min_buildings > spec.max_buildings {
        return Err(ValidationError::InvertedDemandBounds {
            turn,
            min: spec.min_buildings,
            max: spec.max_buildings,
        });
    }
    Ok(())
}
