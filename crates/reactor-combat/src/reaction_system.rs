//! Side effects of reactions
//!
//! Results are handled strictly in the order the aura produced them, since a
//! later result may depend on state an earlier one installed.

use tracing::{debug, trace};

use reactor_core::EntityId;

use super::damage::Damage;
use super::effect::Effect;
use super::element::Element;
use super::events::ReactionTriggered;
use super::field::DendroCore;
use super::level::crystallize_shield_base;
use super::reaction::{MasteryCurve, ReactionCategory, ReactionResult, ReactionType};
use super::simulation::Simulation;

/// Physical resistance removed by Superconduct
pub const SUPERCONDUCT_SHRED: f64 = 0.4;
pub const SUPERCONDUCT_SECONDS: f64 = 12.0;
pub const CRYSTALLIZE_SHIELD_SECONDS: f64 = 15.0;

pub struct ReactionSystem;

impl ReactionSystem {
    /// Handle the reactions a resolved hit produced against `target`.
    pub fn process(sim: &mut Simulation, damage: &Damage, target: EntityId) {
        for result in &damage.reaction_results {
            Self::announce(sim, damage.source, target, result);
            match result.category {
                ReactionCategory::Amplifying | ReactionCategory::Additive => {
                    debug!(
                        "{} folded into '{}' (x{})",
                        result.reaction_type, damage.name, result.multiplier
                    );
                }
                ReactionCategory::Transformative => {
                    Self::transformative(sim, damage.source, target, result);
                }
                ReactionCategory::Status => Self::status(sim, damage.source, target, result),
            }
        }
    }

    /// Handle periodic results from an aura update on `target`.
    pub fn process_ticks(sim: &mut Simulation, target: EntityId, ticks: Vec<ReactionResult>) {
        for tick in ticks {
            let source = sim
                .entity(target)
                .and_then(|e| e.reaction_source(tick.reaction_type));
            let Some(source) = source else {
                trace!("{} tick on {target} has no known source", tick.reaction_type);
                continue;
            };
            Self::announce(sim, source, target, &tick);
            let element = tick.reaction_type.damage_element(tick.target_element);
            sim.resolve(Damage::from_reaction(tick.reaction_type, element, source, target));
        }
    }

    /// A Dendro Core bursting on its own, or pushed out by the cap
    pub fn burst_core(sim: &mut Simulation, core: DendroCore) {
        debug!("Dendro Core {} bursts", core.id);
        sim.resolve(Damage::from_reaction(
            ReactionType::Bloom,
            Element::Dendro,
            core.owner,
            core.target,
        ));
    }

    /// Electro and Pyro hits set off a live core near the target.
    pub fn trigger_core(sim: &mut Simulation, damage: &Damage, target: EntityId) {
        if damage.is_reaction() {
            return;
        }
        let reaction = match damage.element {
            Element::Electro => ReactionType::Hyperbloom,
            Element::Pyro => ReactionType::Burgeon,
            _ => return,
        };
        let Some(core) = sim.field_mut().take_near(target) else {
            return;
        };
        debug!("'{}' turns Dendro Core {} into {reaction}", damage.name, core.id);
        let result = ReactionResult::new(reaction, damage.element, Element::Dendro);
        Self::announce(sim, damage.source, target, &result);
        sim.resolve(Damage::from_reaction(
            reaction,
            reaction.damage_element(Element::Dendro),
            damage.source,
            target,
        ));
    }

    fn announce(sim: &mut Simulation, source: EntityId, target: EntityId, result: &ReactionResult) {
        sim.record_reaction(source, target, result);
        let Some(engine) = sim.entity(target).map(|e| e.events.clone()) else {
            return;
        };
        let mut event = ReactionTriggered {
            source,
            target,
            result: result.clone(),
        };
        engine.publish(sim, &mut event);
    }

    fn transformative(
        sim: &mut Simulation,
        source: EntityId,
        target: EntityId,
        result: &ReactionResult,
    ) {
        let reaction = result.reaction_type;
        match reaction {
            ReactionType::Bloom => {
                let now = sim.now();
                if let Some(evicted) = sim.field_mut().spawn(source, target, now) {
                    Self::burst_core(sim, evicted);
                }
                return;
            }
            ReactionType::Superconduct => {
                let now = sim.now();
                if let Some(entity) = sim.entity_mut(target) {
                    entity.effects.apply(Effect::resistance_shred(
                        "Superconduct",
                        Element::Physical,
                        SUPERCONDUCT_SHRED,
                        SUPERCONDUCT_SECONDS,
                        now,
                    ));
                }
            }
            _ => {}
        }

        let element = reaction.damage_element(result.target_element);
        debug!("{reaction} deals {element} damage to {target}");
        sim.resolve(Damage::from_reaction(reaction, element, source, target));
    }

    fn status(sim: &mut Simulation, source: EntityId, target: EntityId, result: &ReactionResult) {
        match result.reaction_type {
            ReactionType::Crystallize => {
                let now = sim.now();
                let Some(attacker) = sim.entity_mut(source) else {
                    return;
                };
                let strength = crystallize_shield_base(attacker.level)
                    * (1.0 + MasteryCurve::SHIELD.bonus(attacker.attributes.elemental_mastery));
                debug!(
                    "{} crystallized {}: {strength:.0} shield",
                    attacker.name, result.target_element
                );
                attacker.effects.apply(Effect::shield(
                    "Crystallize",
                    strength,
                    Some(result.target_element),
                    CRYSTALLIZE_SHIELD_SECONDS,
                    now,
                ));
            }
            other => debug!("{other} on {target}"),
        }
    }
}
