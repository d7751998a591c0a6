use criterion::{criterion_group, criterion_main, Criterion};
use grid_core::{Effect, ResourceDefinition, ResourceId, Scenario, TurnSpec};
use grid_engine::Engine;

fn build_engine(n_turns: usize) -> Engine {
    let effects = [
        Effect::Plain,
        Effect::Production(20),
        Effect::Threshold(-10),
        Effect::Lifecycle(50),
        Effect::ProfitRate(15),
        Effect::Accumulator(40),
    ];
    let defs = effects
        .iter()
        .enumerate()
        .map(|(i, &effect)| ResourceDefinition {
            id: ResourceId(i as u32),
            activation_cost: 10,
            periodic_cost: 1,
            active_turns: 3,
            maintenance_turns: 1,
            lifecycle: 12,
            buildings_powered: 25,
            effect,
        })
        .collect();
    let turns = (0..n_turns)
        .map(|t| TurnSpec {
            min_buildings: 50 + (t as u64 % 7) * 10,
            max_buildings: 150,
            profit_per_building: 3,
        })
        .collect();
    Engine::new(Scenario::new(1_000_000, defs, turns).expect("valid bench scenario"))
}

fn bench_turns(c: &mut Criterion) {
    let e0 = build_engine(200);
    c.bench_function("run 200 turns, 6 buys/turn", |b| {
        b.iter(|| {
            let mut e = e0.clone();
            while !e.is_game_over() {
                let ids: Vec<ResourceId> = (0..6).map(ResourceId).collect();
                let _ = e.purchase(&ids);
                let _ = e.run_turn();
            }
            e.total_score()
        })
    });
}

criterion_group!(benches, bench_turns);
criterion_main!(benches);
