//! Live purchased instances and their duty-cycle state machine.

use grid_core::{Effect, ResourceDefinition};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::effects::scale_floor;

/// Duty-cycle phase of an instance, derived from its counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Producing this turn.
    Active,
    /// Paused for maintenance.
    Cooldown,
    /// Active window exhausted and no cooldown cycle configured.
    Idle,
    /// Life exhausted; removed at the end of the turn.
    Retired,
}

/// Output of one duty-cycle tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tick {
    pub produced: u64,
    pub upkeep: i64,
}

/// A purchased copy of a catalog definition with its own counters.
#[derive(Clone, Debug)]
pub struct ActiveResourceInstance {
    definition: Arc<ResourceDefinition>,
    remaining_life: u32,
    cooldown_remaining: u32,
    turns_remaining_active: u32,
    stored: u64,
}

impl ActiveResourceInstance {
    /// Fresh instance entering its first active window.
    pub fn new(definition: Arc<ResourceDefinition>, remaining_life: u32) -> Self {
        let turns_remaining_active = definition.active_turns;
        Self {
            definition,
            remaining_life,
            cooldown_remaining: 0,
            turns_remaining_active,
            stored: 0,
        }
    }

    pub fn definition(&self) -> &Arc<ResourceDefinition> {
        &self.definition
    }

    pub fn remaining_life(&self) -> u32 {
        self.remaining_life
    }

    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown_remaining
    }

    pub fn turns_remaining_active(&self) -> u32 {
        self.turns_remaining_active
    }

    /// Power banked by this instance (always 0 unless it is an accumulator).
    pub fn stored(&self) -> u64 {
        self.stored
    }

    /// Bank capacity, if this is an accumulator.
    pub fn capacity(&self) -> Option<u64> {
        self.definition.effect.capacity()
    }

    pub fn is_accumulator(&self) -> bool {
        matches!(self.definition.effect, Effect::Accumulator(_))
    }

    /// Alive and inside an active window: its modifier applies this turn.
    pub fn is_eligible(&self) -> bool {
        self.remaining_life > 0 && self.turns_remaining_active > 0
    }

    pub fn phase(&self) -> Phase {
        if self.remaining_life == 0 {
            Phase::Retired
        } else if self.cooldown_remaining > 0 {
            Phase::Cooldown
        } else if self.turns_remaining_active > 0 {
            Phase::Active
        } else {
            Phase::Idle
        }
    }

    /// Advance one turn. A cooling instance never produces on the tick its
    /// cooldown ends; life decays on every tick regardless of phase.
    pub fn tick(&mut self, production: Decimal) -> Tick {
        let mut out = Tick::default();
        if self.remaining_life == 0 {
            return out;
        }
        if self.cooldown_remaining > 0 {
            self.cooldown_remaining -= 1;
            if self.cooldown_remaining == 0 {
                self.turns_remaining_active = self.definition.active_turns;
            }
        } else if self.turns_remaining_active > 0 {
            out.produced = scale_floor(self.definition.buildings_powered, production);
            out.upkeep = self.definition.periodic_cost;
            self.turns_remaining_active -= 1;
            if self.turns_remaining_active == 0 && self.definition.maintenance_turns > 0 {
                self.cooldown_remaining = self.definition.maintenance_turns;
            }
        }
        self.remaining_life -= 1;
        out
    }

    /// Bank up to `amount`, returning how much fit.
    pub(crate) fn store(&mut self, amount: u64) -> u64 {
        let room = self.capacity().unwrap_or(0).saturating_sub(self.stored);
        let taken = amount.min(room);
        self.stored += taken;
        taken
    }

    /// Release up to `amount`, returning how much was drawn.
    pub(crate) fn draw(&mut self, amount: u64) -> u64 {
        let given = amount.min(self.stored);
        self.stored -= given;
        given
    }

    #[cfg(test)]
    pub(crate) fn set_phase_for_test(&mut self, cooldown: u32, active: u32) {
        self.cooldown_remaining = cooldown;
        self.turns_remaining_active = active;
    }
}

/// Live instances in purchase order. Owned by the engine.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    instances: Vec<ActiveResourceInstance>,
}

impl Registry {
    pub fn insert(&mut self, instance: ActiveResourceInstance) {
        self.instances.push(instance);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ActiveResourceInstance> {
        self.instances.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> std::slice::IterMut<'_, ActiveResourceInstance> {
        self.instances.iter_mut()
    }

    pub fn get(&self, pos: usize) -> Option<&ActiveResourceInstance> {
        self.instances.get(pos)
    }

    pub(crate) fn get_mut(&mut self, pos: usize) -> Option<&mut ActiveResourceInstance> {
        self.instances.get_mut(pos)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Positions of accumulators that are eligible right now.
    pub fn eligible_accumulators(&self) -> Vec<usize> {
        self.instances
            .iter()
            .enumerate()
            .filter(|(_, i)| i.is_accumulator() && i.is_eligible())
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Banked power held by accumulators that are still alive.
    pub fn live_stored(&self) -> u64 {
        self.instances
            .iter()
            .filter(|i| i.remaining_life > 0)
            .map(|i| i.stored)
            .sum()
    }

    /// Drop every instance whose life is exhausted; returns how many left.
    pub fn retire_expired(&mut self) -> usize {
        let before = self.instances.len();
        self.instances.retain(|i| i.remaining_life > 0);
        before - self.instances.len()
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a ActiveResourceInstance;
    type IntoIter = std::slice::Iter<'a, ActiveResourceInstance>;

    fn into_iter(self) -> Self::IntoIter {
        self.instances.iter()
    }
}
