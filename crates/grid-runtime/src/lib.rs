#![deny(warnings)]

//! Run orchestration: asks a policy once per turn, applies its purchase,
//! resolves the turn, and records what happened.

use grid_core::Scenario;
use grid_engine::{Engine, EngineError, PurchasePolicy, TurnReport};
use serde::Serialize;
use tracing::{info, warn};

pub use grid_core::PurchaseRecord;

/// Outcome of a run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunSummary {
    pub purchases: Vec<PurchaseRecord>,
    pub turns: Vec<TurnReport>,
    /// Batches the engine refused as unaffordable.
    pub rejected: usize,
    pub final_budget: i64,
    pub total_score: i64,
}

/// Fresh engine for `scenario`.
pub fn init_engine(scenario: Scenario) -> Engine {
    info!(
        budget = scenario.budget,
        resources = scenario.catalog.len(),
        turns = scenario.schedule.len(),
        "engine initialized"
    );
    Engine::new(scenario)
}

/// Advance up to `turns` turns in place, appending to `summary`.
pub fn run_turns_in_place(
    engine: &mut Engine,
    policy: &mut dyn PurchasePolicy,
    turns: usize,
    summary: &mut RunSummary,
) -> Result<(), EngineError> {
    for _ in 0..turns {
        if engine.is_game_over() {
            break;
        }
        let turn = engine.current_turn();
        let ids = policy.choose(engine);
        if !ids.is_empty() {
            if engine.purchase(&ids)? {
                summary.purchases.push(PurchaseRecord { turn, ids });
            } else {
                warn!(turn, ?ids, budget = engine.budget(), "policy chose an unaffordable batch");
                summary.rejected += 1;
            }
        }
        summary.turns.push(engine.run_turn()?);
    }
    summary.final_budget = engine.budget();
    summary.total_score = engine.total_score();
    Ok(())
}

/// Play the whole schedule.
pub fn run_to_end(
    mut engine: Engine,
    policy: &mut dyn PurchasePolicy,
) -> Result<RunSummary, EngineError> {
    let mut summary = RunSummary::default();
    let remaining = engine.schedule().len() - engine.current_turn();
    run_turns_in_place(&mut engine, policy, remaining, &mut summary)?;
    info!(
        turns = summary.turns.len(),
        purchases = summary.purchases.len(),
        total_score = summary.total_score,
        final_budget = summary.final_budget,
        "run finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_ai::GreedyPolicy;
    use grid_core::{Effect, ResourceDefinition, ResourceId, TurnSpec};

    fn scenario() -> Scenario {
        let def = ResourceDefinition {
            id: ResourceId(1),
            activation_cost: 50,
            periodic_cost: 2,
            active_turns: 3,
            maintenance_turns: 0,
            lifecycle: 3,
            buildings_powered: 10,
            effect: Effect::Plain,
        };
        let turn = TurnSpec {
            min_buildings: 5,
            max_buildings: 10,
            profit_per_building: 3,
        };
        Scenario::new(100, vec![def], vec![turn; 3]).unwrap()
    }

    #[test]
    fn summary_tracks_budget_and_log() {
        let mut policy = GreedyPolicy;
        let summary = run_to_end(init_engine(scenario()), &mut policy).unwrap();
        assert_eq!(summary.turns.len(), 3);
        assert_eq!(summary.purchases[0], PurchaseRecord { turn: 0, ids: vec![ResourceId(1)] });
        let profit: i64 = summary.turns.iter().map(|t| t.profit).sum();
        assert_eq!(profit, summary.total_score);

        let spent: i64 = summary.purchases.iter().map(|p| 50 * p.ids.len() as i64).sum();
        let upkeep: i64 = summary.turns.iter().map(|t| t.maintenance_cost).sum();
        assert_eq!(summary.final_budget, 100 - spent + profit - upkeep);
    }

    #[test]
    fn unaffordable_choices_are_counted_not_fatal() {
        let mut overspend = |_: &Engine| vec![ResourceId(1), ResourceId(1), ResourceId(1)];
        let summary = run_to_end(init_engine(scenario()), &mut overspend).unwrap();
        assert!(summary.purchases.is_empty());
        assert_eq!(summary.rejected, 3);
        assert_eq!(summary.total_score, 0);
        assert_eq!(summary.final_budget, 100);
    }

    #[test]
    fn partial_runs_resume() {
        let mut engine = init_engine(scenario());
        let mut summary = RunSummary::default();
        let mut policy = GreedyPolicy;
        run_turns_in_place(&mut engine, &mut policy, 1, &mut summary).unwrap();
        assert_eq!(engine.current_turn(), 1);
        run_turns_in_place(&mut engine, &mut policy, 10, &mut summary).unwrap();
        assert!(engine.is_game_over());
        assert_eq!(summary.turns.len(), 3);
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"total_score\""));
    }
}
