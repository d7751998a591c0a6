//! Purchasing policy capability.

use grid_core::ResourceId;

use crate::{Engine, EngineError};

/// Decides what to buy before each turn. Policies only read the engine;
/// the driver performs the purchase.
pub trait PurchasePolicy {
    fn choose(&mut self, engine: &Engine) -> Vec<ResourceId>;
}

impl<F> PurchasePolicy for F
where
    F: FnMut(&Engine) -> Vec<ResourceId>,
{
    fn choose(&mut self, engine: &Engine) -> Vec<ResourceId> {
        self(engine)
    }
}

/// Drive `engine` with `policy` for at most `horizon` turns (or to the end).
/// Unaffordable choices are skipped. Returns the final total score.
pub fn play_out<P>(
    engine: &mut Engine,
    policy: &mut P,
    horizon: Option<usize>,
) -> Result<i64, EngineError>
where
    P: PurchasePolicy + ?Sized,
{
    let mut turns = 0;
    while !engine.is_game_over() && horizon.map_or(true, |h| turns < h) {
        let ids = policy.choose(engine);
        if !ids.is_empty() {
            engine.purchase(&ids)?;
        }
        engine.run_turn()?;
        turns += 1;
    }
    Ok(engine.total_score())
}
