#![deny(warnings)]

//! Turn-resolution engine for the power-grid economy.
//!
//! The engine owns the live registry of purchased instances and exposes two
//! mutators: [`Engine::purchase`] before a turn and [`Engine::run_turn`] to
//! resolve it. Modifier composition lives in [`effects`], surplus/deficit
//! banking in [`bank`], and the per-instance duty cycle in [`registry`].

use grid_core::ResourceId;
use thiserror::Error;

pub mod bank;
pub mod effects;
pub mod engine;
pub mod policy;
pub mod registry;

pub use bank::Settlement;
pub use effects::EffectFactors;
pub use engine::{Engine, TurnReport};
pub use policy::{play_out, PurchasePolicy};
pub use registry::{ActiveResourceInstance, Phase, Registry};

/// Errors produced by engine calls that violate the calling protocol.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Purchase named an id missing from the catalog.
    #[error("unknown resource id {0}")]
    UnknownResource(ResourceId),
    /// `run_turn` was called after the last scheduled turn.
    #[error("turn {turn} is past the end of the schedule")]
    ScheduleExhausted { turn: usize },
}
