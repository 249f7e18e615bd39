//! Combat entities
//!
//! An entity owns its aura, internal cooldown records and effects outright;
//! nothing else holds references into them. Its event engine bubbles to the
//! simulation's engine.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use reactor_core::{ConfigurationError, EntityId, Frame};
use reactor_events::EventEngine;

use super::aura::AuraManager;
use super::damage::Damage;
use super::effect::EffectManager;
use super::element::Element;
use super::icd::{IcdManager, IcdRuleTable};
use super::reaction::{ReactionResult, ReactionType};
use super::simulation::Simulation;
use super::stats::Attributes;

/// Resistance assumed for elements an entity has no entry for
pub const DEFAULT_RESISTANCE: f64 = 0.10;

fn default_level() -> u32 {
    90
}

/// Plain description of an entity, as read from a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub name: String,
    #[serde(default = "default_level")]
    pub level: u32,
    /// Entities on the same team never hit each other with area attacks
    #[serde(default)]
    pub team: u32,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub resistances: BTreeMap<Element, f64>,
}

impl EntitySpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: default_level(),
            team: 0,
            position: Vec3::ZERO,
            attributes: Attributes::default(),
            resistances: BTreeMap::new(),
        }
    }

    /// Same resistance against every element, Physical included
    pub fn with_uniform_resistance(mut self, value: f64) -> Self {
        for &element in Element::all() {
            self.resistances.insert(element, value);
        }
        self
    }
}

pub struct CombatEntity {
    pub id: EntityId,
    pub name: String,
    pub level: u32,
    pub team: u32,
    pub position: Vec3,
    pub attributes: Attributes,
    pub resistances: BTreeMap<Element, f64>,
    pub max_hp: f64,
    pub current_hp: f64,
    pub aura: AuraManager,
    pub icd: IcdManager,
    pub effects: EffectManager,
    pub events: Rc<EventEngine<Simulation>>,
    /// Who set off the periodic reactions currently running on this entity
    reaction_sources: HashMap<ReactionType, EntityId>,
}

impl CombatEntity {
    pub fn new(
        id: EntityId,
        spec: EntitySpec,
        rules: IcdRuleTable,
        parent: Rc<EventEngine<Simulation>>,
    ) -> Self {
        let events = Rc::new(EventEngine::with_parent(spec.name.clone(), parent));
        let hp = spec.attributes.hp;
        Self {
            id,
            name: spec.name,
            level: spec.level,
            team: spec.team,
            position: spec.position,
            attributes: spec.attributes,
            resistances: spec.resistances,
            max_hp: hp,
            current_hp: hp,
            aura: AuraManager::new(),
            icd: IcdManager::new(rules),
            effects: EffectManager::new(),
            events,
            reaction_sources: HashMap::new(),
        }
    }

    /// Gate the hit through internal cooldown and apply its element.
    ///
    /// Returns the reactions it triggered; empty when the element is Physical,
    /// the gauge is zero, or the hit was gated.
    pub fn apply_elemental_aura(&mut self, damage: &Damage, now: Frame) -> Vec<ReactionResult> {
        if !damage.element.is_elemental() || damage.attach_strength <= 0.0 {
            return Vec::new();
        }
        let gate = self.icd.check_attachment(damage.source, &damage.icd_tag, now);
        if gate <= 0.0 {
            debug!("'{}' on {} gated by ICD {}", damage.name, self.name, damage.icd_tag);
            return Vec::new();
        }
        let results = self
            .aura
            .apply(damage.element, damage.attach_strength * gate)
            .unwrap_or_default();
        // Periodic reactions tick on their own, even if this hit is later cancelled.
        for result in &results {
            if result.reaction_type.is_periodic() {
                self.set_reaction_source(result.reaction_type, damage.source);
            }
        }
        results
    }

    /// Resistance against `element` after shreds.
    ///
    /// A missing entry is reported once and then remembered at the default.
    pub fn resistance(&mut self, element: Element) -> f64 {
        let base = match self.resistances.get(&element) {
            Some(&value) => value,
            None => {
                warn!(
                    "{}",
                    ConfigurationError::MissingResistance {
                        entity: self.name.clone(),
                        element: element.to_string(),
                        fallback: DEFAULT_RESISTANCE,
                    }
                );
                self.resistances.insert(element, DEFAULT_RESISTANCE);
                DEFAULT_RESISTANCE
            }
        };
        base - self.effects.resistance_shred(element)
    }

    /// Apply final damage through shields to hp. Returns the amount shields took.
    pub fn take_damage(&mut self, amount: f64, element: Element) -> f64 {
        let through = self.effects.absorb_damage(amount, element);
        let was_alive = self.is_alive();
        self.current_hp = (self.current_hp - through).max(0.0);
        if was_alive && !self.is_alive() {
            info!("{} was defeated", self.name);
        }
        amount - through
    }

    pub fn is_alive(&self) -> bool {
        self.current_hp > 0.0
    }

    pub fn set_reaction_source(&mut self, reaction: ReactionType, source: EntityId) {
        self.reaction_sources.insert(reaction, source);
    }

    pub fn reaction_source(&self, reaction: ReactionType) -> Option<EntityId> {
        self.reaction_sources.get(&reaction).copied()
    }
}
