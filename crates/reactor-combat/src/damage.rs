//! Attack descriptors
//!
//! A [`Damage`] is built once per attack instance, resolved by one pipeline
//! run, and dropped. Reaction results produced while resolving it are stored
//! on it so later stages and subscribers can see them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use reactor_core::{Circle, EntityId};

use super::element::Element;
use super::icd::IcdTag;
use super::reaction::{ExtraValue, ReactionResult, ReactionType};
use super::stats::AttributeKey;

/// Kind of attack, which decides infusion eligibility and pipeline branch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    Normal,
    Charged,
    Plunging,
    Skill,
    Burst,
    /// Blunt attack; shatters Frozen targets
    Heavy,
    /// Independent damage spawned by a transformative reaction
    Reaction(ReactionType),
}

impl DamageType {
    /// Attack types that infusions convert
    pub fn is_infusable(self) -> bool {
        matches!(self, Self::Normal | Self::Charged | Self::Plunging)
    }

    pub fn is_blunt(self) -> bool {
        self == Self::Heavy
    }

    pub fn reaction(self) -> Option<ReactionType> {
        match self {
            Self::Reaction(reaction) => Some(reaction),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Charged => "Charged",
            Self::Plunging => "Plunging",
            Self::Skill => "Skill",
            Self::Burst => "Burst",
            Self::Heavy => "Heavy",
            Self::Reaction(reaction) => reaction.name(),
        }
    }
}

/// Talent multiplier(s) and the attribute(s) they read
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scaling {
    Single {
        attribute: AttributeKey,
        multiplier: f64,
    },
    Dual {
        first: (AttributeKey, f64),
        second: (AttributeKey, f64),
    },
}

impl Scaling {
    /// `multiplier` of attack
    pub fn attack(multiplier: f64) -> Self {
        Self::Single {
            attribute: AttributeKey::Attack,
            multiplier,
        }
    }

    /// Weighted attribute sum, given a lookup for attribute values
    pub fn evaluate(&self, read: impl Fn(AttributeKey) -> f64) -> f64 {
        match *self {
            Self::Single {
                attribute,
                multiplier,
            } => read(attribute) * multiplier,
            Self::Dual { first, second } => read(first.0) * first.1 + read(second.0) * second.1,
        }
    }
}

impl Default for Scaling {
    fn default() -> Self {
        Self::attack(1.0)
    }
}

/// Who an attack can hit
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Hitbox {
    /// Only the named target
    #[default]
    Single,
    /// Every opposing entity inside the circle
    Area(Circle),
}

/// One attack instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Damage {
    pub name: String,
    pub scaling: Scaling,
    pub element: Element,
    /// Gauge units this hit applies
    pub attach_strength: f64,
    pub damage_type: DamageType,
    pub source: EntityId,
    /// `None` resolves against everything inside the hitbox
    pub target: Option<EntityId>,
    pub icd_tag: IcdTag,
    pub hitbox: Hitbox,
    #[serde(default)]
    pub extra: BTreeMap<String, ExtraValue>,
    #[serde(default)]
    pub reaction_results: Vec<ReactionResult>,
}

impl Damage {
    pub fn new(
        name: impl Into<String>,
        source: EntityId,
        element: Element,
        attach_strength: f64,
    ) -> Self {
        Self {
            name: name.into(),
            scaling: Scaling::default(),
            element,
            attach_strength,
            damage_type: DamageType::Normal,
            source,
            target: None,
            icd_tag: IcdTag::Standard,
            hitbox: Hitbox::Single,
            extra: BTreeMap::new(),
            reaction_results: Vec::new(),
        }
    }

    /// Independent damage for a transformative reaction (or a Burning tick).
    /// Never attaches an element and ignores internal cooldown.
    pub fn from_reaction(
        reaction: ReactionType,
        element: Element,
        source: EntityId,
        target: EntityId,
    ) -> Self {
        Self {
            scaling: Scaling::attack(0.0),
            damage_type: DamageType::Reaction(reaction),
            target: Some(target),
            icd_tag: IcdTag::Independent,
            ..Self::new(reaction.name(), source, element, 0.0)
        }
    }

    pub fn with_type(mut self, damage_type: DamageType) -> Self {
        self.damage_type = damage_type;
        self
    }

    pub fn with_scaling(mut self, scaling: Scaling) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn with_multiplier(self, multiplier: f64) -> Self {
        self.with_scaling(Scaling::attack(multiplier))
    }

    pub fn targeting(mut self, target: EntityId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_icd(mut self, tag: impl Into<IcdTag>) -> Self {
        self.icd_tag = tag.into();
        self
    }

    pub fn with_hitbox(mut self, hitbox: Hitbox) -> Self {
        self.hitbox = hitbox;
        self
    }

    pub fn with_extra(mut self, key: &str, value: ExtraValue) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    pub fn is_reaction(&self) -> bool {
        self.damage_type.reaction().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infusable_types() {
        assert!(DamageType::Normal.is_infusable());
        assert!(DamageType::Plunging.is_infusable());
        assert!(!DamageType::Skill.is_infusable());
        assert!(!DamageType::Reaction(ReactionType::Swirl).is_infusable());
    }

    #[test]
    fn test_dual_scaling() {
        let scaling = Scaling::Dual {
            first: (AttributeKey::Attack, 0.5),
            second: (AttributeKey::ElementalMastery, 2.0),
        };
        let value = scaling.evaluate(|key| match key {
            AttributeKey::Attack => 1000.0,
            AttributeKey::ElementalMastery => 200.0,
            _ => 0.0,
        });
        assert_eq!(value, 900.0);
    }

    #[test]
    fn test_reaction_damage_is_independent() {
        let source = EntityId::from_random_bytes([1; 16]);
        let target = EntityId::from_random_bytes([2; 16]);
        let damage = Damage::from_reaction(ReactionType::Overloaded, Element::Pyro, source, target);
        assert!(damage.is_reaction());
        assert_eq!(damage.name, "Overloaded");
        assert_eq!(damage.attach_strength, 0.0);
        assert!(damage.icd_tag.is_ungated());
        assert_eq!(damage.target, Some(target));
    }

    #[test]
    fn test_builder() {
        let source = EntityId::from_random_bytes([1; 16]);
        let damage = Damage::new("Press E", source, Element::Hydro, 1.0)
            .with_type(DamageType::Skill)
            .with_multiplier(2.5)
            .with_icd("ElementalArt");
        assert_eq!(damage.damage_type, DamageType::Skill);
        assert_eq!(damage.icd_tag, IcdTag::Named("ElementalArt".into()));
        assert_eq!(damage.scaling, Scaling::attack(2.5));
        assert!(damage.target.is_none());
    }
}
