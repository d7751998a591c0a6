use criterion::{black_box, criterion_group, criterion_main, Criterion};
use grid_ai::{GreedyPolicy, RolloutPolicy};
use grid_core::{Effect, ResourceDefinition, ResourceId, Scenario, TurnSpec};
use grid_engine::{Engine, PurchasePolicy};

fn build_engine(n_resources: u32, n_turns: usize) -> Engine {
    let defs = (0..n_resources)
        .map(|i| ResourceDefinition {
            id: ResourceId(i),
            activation_cost: 20 + i64::from(i % 9) * 5,
            periodic_cost: 2,
            active_turns: 2 + i % 3,
            maintenance_turns: i % 2,
            lifecycle: 6 + i % 5,
            buildings_powered: 8 + u64::from(i % 4) * 3,
            effect: match i % 6 {
                0 => Effect::Plain,
                1 => Effect::Production(15),
                2 => Effect::Threshold(-10),
                3 => Effect::Lifecycle(30),
                4 => Effect::ProfitRate(20),
                _ => Effect::Accumulator(25),
            },
        })
        .collect();
    let turns = (0..n_turns)
        .map(|t| TurnSpec {
            min_buildings: 10 + (t as u64 % 5) * 6,
            max_buildings: 80,
            profit_per_building: 4,
        })
        .collect();
    Engine::new(Scenario::new(500, defs, turns).expect("valid bench scenario"))
}

fn bench_policies(c: &mut Criterion) {
    let engine = build_engine(24, 40);
    c.bench_function("greedy choose", |b| {
        b.iter(|| black_box(GreedyPolicy.choose(&engine)))
    });
    c.bench_function("rollout choose x8", |b| {
        b.iter(|| {
            let mut p = RolloutPolicy::new(42, 8);
            black_box(p.choose(&engine))
        })
    });
}

criterion_group!(benches, bench_policies);
criterion_main!(benches);
