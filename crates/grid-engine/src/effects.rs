//! Effect composition: per-turn factors from the currently active modifiers.
//!
//! Factors are exact decimals. Every instance contributes a multiplier and
//! multipliers of the same category stack by product, so the aggregate is
//! always strictly positive no matter how large or negative the inputs are.

use grid_core::{Effect, TurnSpec};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::registry::ActiveResourceInstance;

/// Multiplier contributed by a single modifier of `pct` percent.
///
/// Positive values scale up by `1 + p/100`. Negative values use the inverse
/// `1 / (1 - p/100)`, so -50% undoes exactly what +50% does.
pub fn multiplier(pct: i64) -> Decimal {
    let frac = Decimal::from(pct) / Decimal::ONE_HUNDRED;
    if pct >= 0 {
        Decimal::ONE + frac
    } else {
        Decimal::ONE / (Decimal::ONE - frac)
    }
}

fn stack(acc: Decimal, pct: i64) -> Decimal {
    acc.checked_mul(multiplier(pct)).unwrap_or(Decimal::MAX)
}

/// `floor(value * factor)`, clamped to `[0, u64::MAX]`.
pub fn scale_floor(value: u64, factor: Decimal) -> u64 {
    match Decimal::from(value).checked_mul(factor) {
        Some(v) => v.max(Decimal::ZERO).floor().to_u64().unwrap_or(u64::MAX),
        None => u64::MAX,
    }
}

/// Aggregate factors for the per-turn categories (A, B, D).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectFactors {
    /// A: applied to each producing instance's output.
    pub production: Decimal,
    /// B: applied to both demand bounds.
    pub threshold: Decimal,
    /// D: applied to profit per building.
    pub profit_rate: Decimal,
}

impl Default for EffectFactors {
    fn default() -> Self {
        Self {
            production: Decimal::ONE,
            threshold: Decimal::ONE,
            profit_rate: Decimal::ONE,
        }
    }
}

impl EffectFactors {
    /// Compose factors from every eligible (alive, duty-active) instance.
    pub fn compose<'a, I>(instances: I) -> Self
    where
        I: IntoIterator<Item = &'a ActiveResourceInstance>,
    {
        let mut f = Self::default();
        for inst in instances.into_iter().filter(|i| i.is_eligible()) {
            match inst.definition().effect {
                Effect::Production(p) => f.production = stack(f.production, p),
                Effect::Threshold(p) => f.threshold = stack(f.threshold, p),
                Effect::ProfitRate(p) => f.profit_rate = stack(f.profit_rate, p),
                // C acts at purchase time, E through the bank.
                Effect::Lifecycle(_) | Effect::Accumulator(_) | Effect::Plain => {}
            }
        }
        f
    }

    /// Local copy of `spec` with B applied to the bounds and D to the rate.
    pub fn apply(&self, spec: &TurnSpec) -> TurnSpec {
        TurnSpec {
            min_buildings: scale_floor(spec.min_buildings, self.threshold),
            max_buildings: scale_floor(spec.max_buildings, self.threshold),
            profit_per_building: scale_floor(spec.profit_per_building, self.profit_rate),
        }
    }
}

/// Product of the C multipliers of every eligible instance.
pub fn lifecycle_factor<'a, I>(instances: I) -> Decimal
where
    I: IntoIterator<Item = &'a ActiveResourceInstance>,
{
    instances
        .into_iter()
        .filter(|i| i.is_eligible())
        .filter_map(|i| match i.definition().effect {
            Effect::Lifecycle(p) => Some(p),
            _ => None,
        })
        .fold(Decimal::ONE, stack)
}

/// Starting life of a new instance: `max(1, floor(lifecycle * factor))`.
pub fn extended_lifecycle(lifecycle: u32, factor: Decimal) -> u32 {
    let scaled = scale_floor(u64::from(lifecycle), factor);
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}
