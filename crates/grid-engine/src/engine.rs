//! Engine state with the two mutators: `purchase` and `run_turn`.

use grid_core::{Catalog, ResourceDefinition, ResourceId, Scenario, TurnSpec};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::bank::{self, Settlement};
use crate::effects::{extended_lifecycle, lifecycle_factor, EffectFactors};
use crate::registry::{ActiveResourceInstance, Registry};
use crate::EngineError;

/// What happened during one resolved turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TurnReport {
    pub turn: usize,
    /// Bounds and rate after B/D modifiers.
    pub effective: TurnSpec,
    /// Sum of instance output before banking.
    pub raw_power: u64,
    pub settlement: Settlement,
    pub maintenance_cost: i64,
    pub profit: i64,
    /// Instances removed at the end of the turn.
    pub retired: usize,
}

/// Single-run simulation state. Cloning is cheap enough for look-ahead:
/// catalog and schedule are shared.
#[derive(Clone, Debug)]
pub struct Engine {
    catalog: Arc<Catalog>,
    schedule: Arc<[TurnSpec]>,
    budget: i64,
    current_turn: usize,
    total_score: i64,
    registry: Registry,
}

impl Engine {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            catalog: Arc::new(scenario.catalog),
            schedule: scenario.schedule.into(),
            budget: scenario.budget,
            current_turn: 0,
            total_score: 0,
            registry: Registry::default(),
        }
    }

    pub fn budget(&self) -> i64 {
        self.budget
    }

    pub fn current_turn(&self) -> usize {
        self.current_turn
    }

    pub fn total_score(&self) -> i64 {
        self.total_score
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn schedule(&self) -> &[TurnSpec] {
        &self.schedule
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Bounds of the turn about to be resolved, if any remain.
    pub fn current_turn_spec(&self) -> Option<&TurnSpec> {
        self.schedule.get(self.current_turn)
    }

    pub fn is_game_over(&self) -> bool {
        self.current_turn >= self.schedule.len()
    }

    /// Total activation cost of `ids`, counting repeats.
    pub fn quote(&self, ids: &[ResourceId]) -> Result<i64, EngineError> {
        Ok(self
            .resolve(ids)?
            .iter()
            .fold(0i64, |acc, d| acc.saturating_add(d.activation_cost)))
    }

    fn resolve(&self, ids: &[ResourceId]) -> Result<Vec<Arc<ResourceDefinition>>, EngineError> {
        ids.iter()
            .map(|&id| {
                self.catalog
                    .get(id)
                    .cloned()
                    .ok_or(EngineError::UnknownResource(id))
            })
            .collect()
    }

    /// Buy `ids` as one batch. `Ok(false)` when the batch is unaffordable;
    /// in both failure cases nothing changes.
    ///
    /// Each new instance's life is rescaled by the lifecycle modifiers active
    /// at the moment it is inserted, including ones bought earlier in the
    /// same batch.
    pub fn purchase(&mut self, ids: &[ResourceId]) -> Result<bool, EngineError> {
        if ids.is_empty() {
            return Ok(true);
        }
        let defs = self.resolve(ids)?;
        let cost = defs
            .iter()
            .fold(0i64, |acc, d| acc.saturating_add(d.activation_cost));
        if cost > self.budget {
            debug!(turn = self.current_turn, cost, budget = self.budget, "purchase rejected");
            return Ok(false);
        }

        self.budget -= cost;
        for def in defs {
            let factor = lifecycle_factor(&self.registry);
            let life = extended_lifecycle(def.lifecycle, factor);
            debug!(turn = self.current_turn, id = %def.id, life, "instance purchased");
            self.registry.insert(ActiveResourceInstance::new(def, life));
        }
        Ok(true)
    }

    /// Resolve the current turn and advance to the next.
    pub fn run_turn(&mut self) -> Result<TurnReport, EngineError> {
        let turn = self.current_turn;
        let spec = *self
            .schedule
            .get(turn)
            .ok_or(EngineError::ScheduleExhausted { turn })?;

        let factors = EffectFactors::compose(&self.registry);
        let effective = factors.apply(&spec);
        // Duty-active at the start of the turn; bank drops any that expire in the tick.
        let absorbers = self.registry.eligible_accumulators();

        let mut raw_power = 0u64;
        let mut maintenance_cost = 0i64;
        for inst in self.registry.iter_mut() {
            let tick = inst.tick(factors.production);
            raw_power = raw_power.saturating_add(tick.produced);
            maintenance_cost = maintenance_cost.saturating_add(tick.upkeep);
        }

        let settlement = bank::settle(&mut self.registry, &absorbers, raw_power, &effective);

        let profit = if settlement.power < effective.min_buildings {
            0
        } else {
            let counted = settlement.power.min(effective.max_buildings);
            i64::try_from(counted.saturating_mul(effective.profit_per_building))
                .unwrap_or(i64::MAX)
        };

        self.budget = self.budget.saturating_add(profit).saturating_sub(maintenance_cost);
        self.total_score = self.total_score.saturating_add(profit);
        self.current_turn += 1;
        let retired = self.registry.retire_expired();

        debug!(
            turn,
            raw_power,
            power = settlement.power,
            profit,
            maintenance_cost,
            budget = self.budget,
            "turn resolved"
        );

        Ok(TurnReport {
            turn,
            effective,
            raw_power,
            settlement,
            maintenance_cost,
            profit,
            retired,
        })
    }
}
