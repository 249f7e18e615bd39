//! The damage pipeline
//!
//! Six stages, always in this order:
//!
//! 1. Infusion: infusable attacks take the source's winning infusion element.
//! 2. Attribute snapshot into the context buckets. The talent multiplier is
//!    applied to the buckets at composition, so hook adjustments count.
//! 3. Reaction preprocessing: apply the element to the target (ICD-gated) and
//!    fold amplifying/additive reactions into the numbers.
//! 4. `BeforeDamage` hook. Subscribers may adjust buckets, edit the damage,
//!    or cancel. Aura changes from stage 3 stand even when the hit is
//!    cancelled.
//! 5. Defense and resistance coefficients.
//! 6. Final composition, with a separate branch for reaction damage.

use tracing::{debug, trace, warn};

use reactor_core::{ConfigurationError, EntityId, InvariantViolation};

use super::context::{Bucket, DamageContext};
use super::damage::Damage;
use super::events::BeforeDamage;
use super::level::reaction_level_coefficient;
use super::reaction::{MasteryCurve, ReactionCategory};
use super::simulation::Simulation;

/// Per-attacker-level slope of the defense curve
pub const DEFENSE_LEVEL_SLOPE: f64 = 5.0;
/// Constant term of the defense curve
pub const DEFENSE_CONSTANT: f64 = 1000.0;

/// Fraction of damage that gets through defense
pub fn defense_coefficient(attacker_level: u32, defense: f64, shred: f64) -> f64 {
    let level_term = DEFENSE_LEVEL_SLOPE * attacker_level as f64 + DEFENSE_CONSTANT;
    let effective = (defense * (1.0 - shred.clamp(0.0, 1.0))).max(0.0);
    level_term / (effective + level_term)
}

/// Fraction of damage that gets through elemental resistance
pub fn resistance_coefficient(resistance: f64) -> f64 {
    if resistance > 0.75 {
        1.0 / (1.0 + 4.0 * resistance)
    } else if resistance < 0.0 {
        1.0 - resistance / 2.0
    } else {
        1.0 - resistance
    }
}

/// How a pipeline run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// `final_result` and `is_crit` are set
    Resolved,
    /// A `BeforeDamage` subscriber dropped the hit
    Cancelled,
    /// Source or target no longer exists
    Skipped,
}

pub struct DamagePipeline;

impl DamagePipeline {
    /// Resolve one hit of `damage` against `target`, writing into `ctx`.
    pub fn run(
        sim: &mut Simulation,
        damage: &mut Damage,
        target: EntityId,
        ctx: &mut DamageContext,
    ) -> Outcome {
        let Some(source) = sim.entity(damage.source) else {
            warn!(
                "{}",
                ConfigurationError::UnknownEntity {
                    damage: damage.name.clone(),
                    entity: damage.source.to_string(),
                }
            );
            return Outcome::Skipped;
        };

        // 1. infusion
        if damage.damage_type.is_infusable() {
            if let Some((element, strength)) = source.effects.infusion() {
                trace!("'{}' infused to {element}", damage.name);
                damage.element = element;
                damage.attach_strength = strength;
            }
        }

        // 2. snapshot
        let attributes = source.attributes.clone();
        ctx.attacker_level = source.level;
        ctx.set(Bucket::Attack, attributes.attack);
        ctx.set(Bucket::Hp, attributes.hp);
        ctx.set(Bucket::Defense, attributes.defense);
        ctx.set(Bucket::ElementalMastery, attributes.elemental_mastery);
        ctx.set(Bucket::CritRate, attributes.effective_crit_rate());
        ctx.set(Bucket::CritDamage, attributes.crit_damage);
        ctx.add(Bucket::PercentBonus, attributes.bonus_for(damage.element));

        // 3. reactions
        let mastery = attributes.elemental_mastery;
        if let Some(reaction) = damage.damage_type.reaction() {
            ctx.set(Bucket::ReactionBase, reaction.damage_coefficient().unwrap_or(0.0));
            ctx.add(
                Bucket::ReactionBonus,
                MasteryCurve::TRANSFORMATIVE.bonus(mastery) + attributes.reaction_bonus,
            );
        } else {
            let now = sim.now();
            let Some(defender) = sim.entity_mut(target) else {
                return Outcome::Skipped;
            };
            let mut results = defender.apply_elemental_aura(damage, now);
            if damage.damage_type.is_blunt() {
                results.extend(defender.aura.shatter());
            }

            for result in &results {
                match result.category {
                    ReactionCategory::Amplifying if !ctx.amplified => {
                        ctx.amplified = true;
                        ctx.set(Bucket::ReactionBase, result.multiplier);
                        ctx.add(
                            Bucket::ReactionBonus,
                            MasteryCurve::AMPLIFYING.bonus(mastery) + attributes.reaction_bonus,
                        );
                    }
                    ReactionCategory::Additive => {
                        let flat = reaction_level_coefficient(ctx.attacker_level)
                            * result.multiplier
                            * (1.0
                                + MasteryCurve::ADDITIVE.bonus(mastery)
                                + attributes.reaction_bonus);
                        ctx.add(Bucket::FlatBonus, flat);
                    }
                    _ => {}
                }
            }
            damage.reaction_results.extend(results);
        }

        // 4. hook
        let Some(engine) = sim.entity(target).map(|e| e.events.clone()) else {
            return Outcome::Skipped;
        };
        let mut before = BeforeDamage {
            damage: damage.clone(),
            target,
            ctx: ctx.clone(),
            cancelled: false,
        };
        engine.publish(sim, &mut before);
        if before.cancelled {
            debug!("'{}' cancelled before damage", damage.name);
            return Outcome::Cancelled;
        }
        *ctx = before.ctx;
        *damage = before.damage;

        // 5. defense and resistance
        let Some(defender) = sim.entity_mut(target) else {
            return Outcome::Skipped;
        };
        let shred = defender.effects.defense_shred();
        let defense = defender.attributes.defense;
        let resistance = defender.resistance(damage.element);
        ctx.multiply(
            Bucket::DefenseCoefficient,
            defense_coefficient(ctx.attacker_level, defense, shred),
        );
        ctx.multiply(Bucket::ResistanceCoefficient, resistance_coefficient(resistance));

        // 6. composition
        if damage.is_reaction() {
            ctx.final_result = reaction_level_coefficient(ctx.attacker_level)
                * ctx.get(Bucket::ReactionBase)
                * (1.0 + ctx.get(Bucket::ReactionBonus))
                * ctx.get(Bucket::ResistanceCoefficient);
        } else {
            ctx.is_crit = sim.roll_crit(ctx.get(Bucket::CritRate));
            ctx.final_result = (ctx.scaled_value(&damage.scaling) + ctx.get(Bucket::FlatBonus))
                * (1.0 + ctx.get(Bucket::PercentBonus))
                * ctx.crit_term()
                * ctx.reaction_term()
                * ctx.get(Bucket::DefenseCoefficient)
                * ctx.get(Bucket::ResistanceCoefficient)
                * ctx.get(Bucket::Standalone);
        }

        if !ctx.final_result.is_finite() {
            InvariantViolation::NonFiniteDamage {
                name: damage.name.clone(),
                value: ctx.final_result,
            }
            .raise();
        }
        ctx.final_result = ctx.final_result.max(0.0);
        Outcome::Resolved
    }
}
