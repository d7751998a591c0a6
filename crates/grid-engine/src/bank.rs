//! Accumulator bank: smooths production against the turn's demand bounds.
//!
//! Each accumulator owns its stock and capacity. Surplus is split evenly
//! across the accumulators that were active when the turn began and are
//! still alive after the tick; deficits are covered in full from the stock
//! of every live accumulator, or not at all. An instance whose life ran out
//! this turn neither takes surplus nor releases stock.

use grid_core::TurnSpec;
use serde::Serialize;

use crate::registry::Registry;

/// Result of reconciling one turn's production against its bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Settlement {
    /// Power counted for the turn after banking.
    pub power: u64,
    /// Surplus absorbed into accumulators.
    pub banked: u64,
    /// Surplus nothing could absorb.
    pub lost: u64,
    /// Stock released to cover a deficit.
    pub drawn: u64,
}

/// Reconcile `produced` against `bounds`.
///
/// `absorbers` are registry positions of the accumulators that were
/// duty-active when the turn began; any of them with no life left is
/// skipped. An uneven split hands the remainder out one unit at a
/// time in registry order; whatever exceeds an instance's room is lost.
pub fn settle(
    registry: &mut Registry,
    absorbers: &[usize],
    produced: u64,
    bounds: &TurnSpec,
) -> Settlement {
    let mut out = Settlement {
        power: produced,
        ..Settlement::default()
    };

    if produced > bounds.max_buildings {
        let surplus = produced - bounds.max_buildings;
        let live: Vec<usize> = absorbers
            .iter()
            .copied()
            .filter(|&pos| registry.get(pos).is_some_and(|i| i.remaining_life() > 0))
            .collect();
        let n = live.len() as u64;
        if n > 0 {
            let share = surplus / n;
            let rem = surplus % n;
            for (k, &pos) in live.iter().enumerate() {
                let offer = share + u64::from((k as u64) < rem);
                if let Some(inst) = registry.get_mut(pos) {
                    out.banked += inst.store(offer);
                }
            }
        }
        out.lost = surplus - out.banked;
        out.power = bounds.max_buildings;
    } else if produced < bounds.min_buildings {
        let needed = bounds.min_buildings - produced;
        if registry.live_stored() >= needed {
            let mut left = needed;
            for inst in registry.iter_mut().filter(|i| i.remaining_life() > 0) {
                if left == 0 {
                    break;
                }
                left -= inst.draw(left);
            }
            out.drawn = needed;
            out.power = bounds.min_buildings;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ActiveResourceInstance;
    use grid_core::{Effect, ResourceDefinition, ResourceId};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn accumulator(capacity: u64) -> ActiveResourceInstance {
        accumulator_with_life(capacity, 5)
    }

    fn accumulator_with_life(capacity: u64, life: u32) -> ActiveResourceInstance {
        let def = ResourceDefinition {
            id: ResourceId(9),
            activation_cost: 1,
            periodic_cost: 0,
            active_turns: 5,
            maintenance_turns: 0,
            lifecycle: 5,
            buildings_powered: 0,
            effect: Effect::Accumulator(capacity),
        };
        ActiveResourceInstance::new(Arc::new(def), life)
    }

    fn bounds(min: u64, max: u64) -> TurnSpec {
        TurnSpec {
            min_buildings: min,
            max_buildings: max,
            profit_per_building: 1,
        }
    }

    #[test]
    fn surplus_splits_evenly_and_overflow_is_lost() {
        let mut reg = Registry::default();
        reg.insert(accumulator(3));
        reg.insert(accumulator(100));
        let abs = reg.eligible_accumulators();
        let s = settle(&mut reg, &abs, 20, &bounds(0, 10));
        assert_eq!(s.power, 10);
        assert_eq!(s.banked, 8);
        assert_eq!(s.lost, 2);
        assert_eq!(reg.get(0).unwrap().stored(), 3);
        assert_eq!(reg.get(1).unwrap().stored(), 5);
    }

    #[test]
    fn remainder_goes_to_earliest() {
        let mut reg = Registry::default();
        reg.insert(accumulator(10));
        reg.insert(accumulator(10));
        let abs = reg.eligible_accumulators();
        settle(&mut reg, &abs, 13, &bounds(0, 10));
        assert_eq!(reg.get(0).unwrap().stored(), 2);
        assert_eq!(reg.get(1).unwrap().stored(), 1);
    }

    #[test]
    fn deficit_draws_in_registry_order() {
        let mut reg = Registry::default();
        reg.insert(accumulator(4));
        reg.insert(accumulator(10));
        let abs = reg.eligible_accumulators();
        settle(&mut reg, &abs, 30, &bounds(0, 10));
        assert_eq!(reg.live_stored(), 14);

        let s = settle(&mut reg, &[], 2, &bounds(8, 10));
        assert_eq!(s.power, 8);
        assert_eq!(s.drawn, 6);
        assert_eq!(reg.get(0).unwrap().stored(), 0);
        assert_eq!(reg.get(1).unwrap().stored(), 8);
    }

    #[test]
    fn insufficient_stock_is_untouched() {
        let mut reg = Registry::default();
        reg.insert(accumulator(4));
        let abs = reg.eligible_accumulators();
        settle(&mut reg, &abs, 14, &bounds(0, 10));
        let s = settle(&mut reg, &abs, 0, &bounds(5, 10));
        assert_eq!(s.power, 0);
        assert_eq!(s.drawn, 0);
        assert_eq!(reg.live_stored(), 4);
    }

    #[test]
    fn surplus_without_accumulators_is_clamped() {
        let mut reg = Registry::default();
        let s = settle(&mut reg, &[], 12, &bounds(5, 10));
        assert_eq!(s, Settlement { power: 10, banked: 0, lost: 2, drawn: 0 });
    }

    #[test]
    fn expired_accumulator_takes_no_surplus() {
        let mut reg = Registry::default();
        reg.insert(accumulator_with_life(10, 1));
        reg.insert(accumulator(10));
        let abs = reg.eligible_accumulators();
        for inst in reg.iter_mut() {
            inst.tick(Decimal::ONE);
        }
        let s = settle(&mut reg, &abs, 20, &bounds(0, 10));
        assert_eq!(s, Settlement { power: 10, banked: 10, lost: 0, drawn: 0 });
        assert_eq!(reg.get(0).unwrap().stored(), 0);
        assert_eq!(reg.get(1).unwrap().stored(), 10);
    }

    #[test]
    fn expired_stock_cannot_cover_deficit() {
        let mut reg = Registry::default();
        reg.insert(accumulator_with_life(10, 2));
        reg.insert(accumulator(10));
        let abs = reg.eligible_accumulators();
        settle(&mut reg, &abs, 16, &bounds(0, 10));
        assert_eq!(reg.live_stored(), 6);

        for inst in reg.iter_mut() {
            inst.tick(Decimal::ONE);
            inst.tick(Decimal::ONE);
        }
        assert_eq!(reg.get(0).unwrap().remaining_life(), 0);
        assert_eq!(reg.live_stored(), 3);
        let s = settle(&mut reg, &[], 0, &bounds(5, 10));
        assert_eq!(s.drawn, 0);
        assert_eq!(s.power, 0);

        let s = settle(&mut reg, &[], 0, &bounds(3, 10));
        assert_eq!(s.drawn, 3);
        assert_eq!(reg.get(0).unwrap().stored(), 3);
        assert_eq!(reg.get(1).unwrap().stored(), 0);
    }
}
