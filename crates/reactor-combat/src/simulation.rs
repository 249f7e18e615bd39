//! Simulation context
//!
//! A [`Simulation`] owns every entity, the frame clock, the seeded RNG, the
//! field objects and the logs of one run. Nothing is global: two simulations
//! never share state, so independent runs can execute on separate threads
//! (each thread builds its own).

use std::collections::VecDeque;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use reactor_core::{EntityId, Frame, FrameClock};
use reactor_events::EventEngine;

use super::context::DamageContext;
use super::damage::Damage;
use super::damage_system::DamageSystem;
use super::effect::Effect;
use super::element::Element;
use super::entity::{CombatEntity, EntitySpec};
use super::events::ResolveDamage;
use super::field::DendroField;
use super::icd::IcdRuleTable;
use super::reaction::{ReactionResult, ReactionType};
use super::reaction_system::ReactionSystem;

/// One landed hit, copied out of the resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageRecord {
    pub frame: Frame,
    pub name: String,
    pub source: String,
    pub target: String,
    pub element: Element,
    pub damage_type: String,
    pub amount: f64,
    /// Portion taken by shields
    pub absorbed: f64,
    pub is_crit: bool,
    pub reactions: Vec<ReactionType>,
}

impl DamageRecord {
    pub fn new(
        sim: &Simulation,
        damage: &Damage,
        target: EntityId,
        ctx: &DamageContext,
        absorbed: f64,
    ) -> Self {
        Self {
            frame: sim.now(),
            name: damage.name.clone(),
            source: sim.name_of(damage.source),
            target: sim.name_of(target),
            element: damage.element,
            damage_type: damage.damage_type.name().to_string(),
            amount: ctx.final_result,
            absorbed,
            is_crit: ctx.is_crit,
            reactions: damage
                .reaction_results
                .iter()
                .map(|r| r.reaction_type)
                .collect(),
        }
    }
}

/// One processed reaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub frame: Frame,
    pub reaction: ReactionType,
    pub source: String,
    pub target: String,
    /// Came from a periodic tick rather than a hit
    pub tick: bool,
}

/// Something queued to happen at a frame
#[derive(Debug, Clone)]
pub enum Action {
    Attack(Damage),
    ApplyEffect { target: EntityId, effect: Effect },
}

#[derive(Debug, Clone)]
struct Scheduled {
    frame: Frame,
    action: Action,
}

pub struct Simulation {
    clock: FrameClock,
    entities: Vec<CombatEntity>,
    events: Rc<EventEngine<Simulation>>,
    rng: StdRng,
    icd_rules: IcdRuleTable,
    field: DendroField,
    schedule: VecDeque<Scheduled>,
    damage_log: Vec<DamageRecord>,
    reaction_log: Vec<ReactionRecord>,
}

impl Simulation {
    pub fn new(seed: u64) -> Self {
        Self::with_rules(seed, IcdRuleTable::default())
    }

    pub fn with_rules(seed: u64, icd_rules: IcdRuleTable) -> Self {
        let events = Rc::new(EventEngine::new("simulation"));
        DamageSystem::install(&events);
        Self {
            clock: FrameClock::new(),
            entities: Vec::new(),
            events,
            rng: StdRng::seed_from_u64(seed),
            icd_rules,
            field: DendroField::new(),
            schedule: VecDeque::new(),
            damage_log: Vec::new(),
            reaction_log: Vec::new(),
        }
    }

    // ---- Entities ----

    /// Add an entity. Its id comes from the simulation's RNG.
    pub fn spawn(&mut self, spec: EntitySpec) -> EntityId {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        let id = EntityId::from_random_bytes(bytes);
        debug!("spawned {} as {id}", spec.name);
        let entity = CombatEntity::new(id, spec, self.icd_rules.clone(), self.events.clone());
        self.entities.push(entity);
        id
    }

    pub fn entity(&self, id: EntityId) -> Option<&CombatEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut CombatEntity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn find(&self, name: &str) -> Option<EntityId> {
        self.entities.iter().find(|e| e.name == name).map(|e| e.id)
    }

    pub fn entities(&self) -> &[CombatEntity] {
        &self.entities
    }

    pub fn name_of(&self, id: EntityId) -> String {
        self.entity(id)
            .map_or_else(|| id.to_string(), |e| e.name.clone())
    }

    // ---- Time ----

    pub fn now(&self) -> Frame {
        self.clock.now()
    }

    /// Queue an attack for `frame`. Same-frame actions run in queue order.
    pub fn schedule_attack(&mut self, frame: Frame, damage: Damage) {
        self.schedule_action(frame, Action::Attack(damage));
    }

    pub fn schedule_effect(&mut self, frame: Frame, target: EntityId, effect: Effect) {
        self.schedule_action(frame, Action::ApplyEffect { target, effect });
    }

    fn schedule_action(&mut self, frame: Frame, action: Action) {
        let index = self.schedule.partition_point(|s| s.frame <= frame);
        self.schedule.insert(index, Scheduled { frame, action });
    }

    /// Run one frame: due actions, then decay and periodic effects, then
    /// advance the clock.
    pub fn step(&mut self) {
        let now = self.now();
        while self.schedule.front().is_some_and(|s| s.frame <= now) {
            let Some(scheduled) = self.schedule.pop_front() else {
                break;
            };
            match scheduled.action {
                Action::Attack(damage) => self.resolve(damage),
                Action::ApplyEffect { target, effect } => {
                    if let Some(entity) = self.entity_mut(target) {
                        entity.effects.apply(effect);
                    }
                }
            }
        }

        let dt = reactor_core::SECONDS_PER_FRAME;
        for index in 0..self.entities.len() {
            let entity = &mut self.entities[index];
            entity.effects.update(dt);
            let ticks = entity.aura.update(dt);
            let id = entity.id;
            if !ticks.is_empty() {
                ReactionSystem::process_ticks(self, id, ticks);
            }
        }

        for core in self.field.expire(now) {
            ReactionSystem::burst_core(self, core);
        }

        self.clock.advance();
    }

    /// Step until the clock reaches `frame`
    pub fn run_until(&mut self, frame: Frame) {
        info!("simulating frames {}..{frame}", self.now());
        while self.now() < frame {
            self.step();
        }
        info!(
            "simulation finished at frame {frame}: {} hits, {:.0} total damage",
            self.damage_log.len(),
            self.total_damage()
        );
    }

    // ---- Resolution ----

    pub fn events(&self) -> &Rc<EventEngine<Simulation>> {
        &self.events
    }

    /// Resolve an attack now
    pub fn resolve(&mut self, damage: Damage) {
        let engine = self.events.clone();
        engine.publish(self, &mut ResolveDamage { damage });
    }

    /// Independent crit roll
    pub fn roll_crit(&mut self, rate: f64) -> bool {
        if rate <= 0.0 {
            return false;
        }
        self.rng.gen::<f64>() < rate
    }

    pub fn field_mut(&mut self) -> &mut DendroField {
        &mut self.field
    }

    pub fn field(&self) -> &DendroField {
        &self.field
    }

    // ---- Logs ----

    pub fn record_damage(&mut self, record: DamageRecord) {
        self.damage_log.push(record);
    }

    pub fn record_reaction(&mut self, source: EntityId, target: EntityId, result: &ReactionResult) {
        let record = ReactionRecord {
            frame: self.now(),
            reaction: result.reaction_type,
            source: self.name_of(source),
            target: self.name_of(target),
            tick: result.is_tick(),
        };
        self.reaction_log.push(record);
    }

    pub fn damage_log(&self) -> &[DamageRecord] {
        &self.damage_log
    }

    pub fn reaction_log(&self) -> &[ReactionRecord] {
        &self.reaction_log
    }

    pub fn total_damage(&self) -> f64 {
        self.damage_log.iter().map(|r| r.amount).sum()
    }
}
