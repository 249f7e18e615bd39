//! Combat attributes
//!
//! Attributes here are already final: buffs, weapons and artifacts have been
//! folded in by whatever built the entity. The damage pipeline only reads them.

use serde::{Deserialize, Serialize};

use super::element::{Element, ELEMENT_COUNT};

/// Attribute a damage multiplier scales from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttributeKey {
    #[default]
    Attack,
    Hp,
    Defense,
    ElementalMastery,
}

impl AttributeKey {
    pub fn name(self) -> &'static str {
        match self {
            Self::Attack => "ATK",
            Self::Hp => "HP",
            Self::Defense => "DEF",
            Self::ElementalMastery => "EM",
        }
    }
}

/// Effective combat attributes of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    pub attack: f64,
    pub hp: f64,
    pub defense: f64,
    pub elemental_mastery: f64,
    /// 0.0 - 1.0
    pub crit_rate: f64,
    /// Added on crit: a crit deals `1 + crit_damage` times
    pub crit_damage: f64,
    /// Per-element %-damage bonus (indexed by Element::index())
    pub damage_bonus: [f64; ELEMENT_COUNT],
    /// Bonus applied to every reaction's mastery term
    pub reaction_bonus: f64,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            attack: 0.0,
            hp: 0.0,
            defense: 0.0,
            elemental_mastery: 0.0,
            crit_rate: 0.05,
            crit_damage: 0.5,
            damage_bonus: [0.0; ELEMENT_COUNT],
            reaction_bonus: 0.0,
        }
    }
}

impl Attributes {
    pub fn new(attack: f64, hp: f64, defense: f64) -> Self {
        Self {
            attack,
            hp,
            defense,
            ..Default::default()
        }
    }

    pub fn get(&self, key: AttributeKey) -> f64 {
        match key {
            AttributeKey::Attack => self.attack,
            AttributeKey::Hp => self.hp,
            AttributeKey::Defense => self.defense,
            AttributeKey::ElementalMastery => self.elemental_mastery,
        }
    }

    /// %-damage bonus for hits of the given element
    pub fn bonus_for(&self, element: Element) -> f64 {
        self.damage_bonus[element.index()]
    }

    pub fn with_bonus(mut self, element: Element, bonus: f64) -> Self {
        self.damage_bonus[element.index()] = bonus;
        self
    }

    /// Crit rate clamped to a probability
    pub fn effective_crit_rate(&self) -> f64 {
        self.crit_rate.clamp(0.0, 1.0)
    }
}
