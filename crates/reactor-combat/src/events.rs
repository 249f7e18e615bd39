//! Events published during damage resolution
//!
//! `ResolveDamage` goes to the simulation's engine. The others go to the
//! target entity's engine and bubble up to the simulation's.

use reactor_core::EntityId;
use reactor_events::Event;

use super::context::DamageContext;
use super::damage::Damage;
use super::reaction::ReactionResult;

/// Request to run an attack through the damage pipeline
#[derive(Debug, Clone)]
pub struct ResolveDamage {
    pub damage: Damage,
}

impl Event for ResolveDamage {}

/// Last chance to adjust the numbers before defense, resistance and crit.
///
/// Handlers may change any bucket of `ctx` or any field of `damage` (both are
/// carried back into the pipeline), or set `cancelled` to drop the hit
/// entirely. `target` is fixed.
#[derive(Debug, Clone)]
pub struct BeforeDamage {
    pub damage: Damage,
    pub target: EntityId,
    pub ctx: DamageContext,
    pub cancelled: bool,
}

impl Event for BeforeDamage {
    fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// A hit has landed
#[derive(Debug, Clone)]
pub struct AfterDamage {
    pub damage: Damage,
    pub target: EntityId,
    pub final_result: f64,
    pub is_crit: bool,
    pub reaction_results: Vec<ReactionResult>,
}

impl Event for AfterDamage {}

/// A reaction was processed, including periodic ticks
#[derive(Debug, Clone)]
pub struct ReactionTriggered {
    pub source: EntityId,
    pub target: EntityId,
    pub result: ReactionResult,
}

impl Event for ReactionTriggered {}
