//! Glue between `ResolveDamage` requests and the pipeline

use std::rc::Rc;

use tracing::{debug, warn};

use reactor_core::{ConfigurationError, EntityId};
use reactor_events::{EventEngine, SubscriptionId};

use super::context::DamageContext;
use super::damage::{Damage, Hitbox};
use super::events::{AfterDamage, ResolveDamage};
use super::pipeline::{DamagePipeline, Outcome};
use super::reaction_system::ReactionSystem;
use super::simulation::{DamageRecord, Simulation};

pub struct DamageSystem;

impl DamageSystem {
    /// Subscribe the resolver to `ResolveDamage` on the simulation engine
    pub fn install(engine: &Rc<EventEngine<Simulation>>) -> SubscriptionId {
        engine.subscribe(|sim: &mut Simulation, event: &mut ResolveDamage| {
            Self::resolve(sim, &mut event.damage);
        })
    }

    /// Resolve `damage` against its target, or every opposing entity in its
    /// hitbox when it has none.
    pub fn resolve(sim: &mut Simulation, damage: &mut Damage) {
        match damage.target {
            Some(target) => Self::resolve_one(sim, damage, target),
            None => {
                let targets = Self::targets_in_hitbox(sim, damage);
                if targets.is_empty() {
                    debug!("'{}' hit nothing", damage.name);
                }
                for target in targets {
                    let mut hit = damage.clone();
                    hit.target = Some(target);
                    Self::resolve_one(sim, &mut hit, target);
                    damage.reaction_results.extend(hit.reaction_results);
                }
            }
        }
    }

    fn targets_in_hitbox(sim: &Simulation, damage: &Damage) -> Vec<EntityId> {
        let Hitbox::Area(circle) = damage.hitbox else {
            warn!("'{}' has neither a target nor an area hitbox", damage.name);
            return Vec::new();
        };
        let Some(team) = sim.entity(damage.source).map(|e| e.team) else {
            warn!(
                "{}",
                ConfigurationError::UnknownEntity {
                    damage: damage.name.clone(),
                    entity: damage.source.to_string(),
                }
            );
            return Vec::new();
        };
        sim.entities()
            .iter()
            .filter(|e| e.team != team && circle.contains(e.position))
            .map(|e| e.id)
            .collect()
    }

    fn resolve_one(sim: &mut Simulation, damage: &mut Damage, target: EntityId) {
        if sim.entity(target).is_none() {
            warn!(
                "{}",
                ConfigurationError::UnknownEntity {
                    damage: damage.name.clone(),
                    entity: target.to_string(),
                }
            );
            return;
        }

        let mut ctx = DamageContext::new();
        if DamagePipeline::run(sim, damage, target, &mut ctx) != Outcome::Resolved {
            return;
        }

        let absorbed = match sim.entity_mut(target) {
            Some(entity) => entity.take_damage(ctx.final_result, damage.element),
            None => return,
        };
        debug!(
            "'{}' hits {target} for {:.1}{}",
            damage.name,
            ctx.final_result,
            if ctx.is_crit { " (crit)" } else { "" }
        );
        let record = DamageRecord::new(sim, damage, target, &ctx, absorbed);
        sim.record_damage(record);

        if let Some(engine) = sim.entity(target).map(|e| e.events.clone()) {
            let mut after = AfterDamage {
                damage: damage.clone(),
                target,
                final_result: ctx.final_result,
                is_crit: ctx.is_crit,
                reaction_results: damage.reaction_results.clone(),
            };
            engine.publish(sim, &mut after);
        }

        ReactionSystem::process(sim, damage, target);
        ReactionSystem::trigger_core(sim, damage, target);
    }
}
