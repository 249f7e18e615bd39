//! Reaction identities, categories, and the pairwise reaction table
//!
//! The table is keyed by (incoming element, resident element) and is
//! deliberately asymmetric: Hydro onto Pyro is a 2.0x Vaporize that eats
//! twice its own gauge, Pyro onto Hydro is a 1.5x Vaporize that eats half.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::element::Element;

/// Every reaction the engine can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReactionType {
    // Amplifying
    Vaporize,
    Melt,
    // Additive
    Aggravate,
    Spread,
    // Transformative
    Overloaded,
    ElectroCharged,
    Superconduct,
    Swirl,
    Shatter,
    Bloom,
    Hyperbloom,
    Burgeon,
    // Status
    Freeze,
    Quicken,
    Burning,
    Crystallize,
}

/// How a reaction's effect reaches the damage numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionCategory {
    /// Multiplies the triggering hit
    Amplifying,
    /// Adds a flat, level-scaled term to the triggering hit
    Additive,
    /// Deals its own independent damage
    Transformative,
    /// Changes target state only
    Status,
}

impl ReactionType {
    pub fn category(self) -> ReactionCategory {
        match self {
            Self::Vaporize | Self::Melt => ReactionCategory::Amplifying,
            Self::Aggravate | Self::Spread => ReactionCategory::Additive,
            Self::Overloaded
            | Self::ElectroCharged
            | Self::Superconduct
            | Self::Swirl
            | Self::Shatter
            | Self::Bloom
            | Self::Hyperbloom
            | Self::Burgeon => ReactionCategory::Transformative,
            Self::Freeze | Self::Quicken | Self::Burning | Self::Crystallize => {
                ReactionCategory::Status
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Vaporize => "Vaporize",
            Self::Melt => "Melt",
            Self::Aggravate => "Aggravate",
            Self::Spread => "Spread",
            Self::Overloaded => "Overloaded",
            Self::ElectroCharged => "Electro-Charged",
            Self::Superconduct => "Superconduct",
            Self::Swirl => "Swirl",
            Self::Shatter => "Shatter",
            Self::Bloom => "Bloom",
            Self::Hyperbloom => "Hyperbloom",
            Self::Burgeon => "Burgeon",
            Self::Freeze => "Freeze",
            Self::Quicken => "Quicken",
            Self::Burning => "Burning",
            Self::Crystallize => "Crystallize",
        }
    }

    /// Level-coefficient multiplier for reactions that deal their own damage.
    /// Burning is listed although it is a status reaction: its periodic ticks
    /// are damage.
    pub fn damage_coefficient(self) -> Option<f64> {
        match self {
            Self::Overloaded => Some(2.75),
            Self::ElectroCharged => Some(2.0),
            Self::Superconduct => Some(1.5),
            Self::Swirl => Some(0.6),
            Self::Shatter => Some(3.0),
            Self::Bloom => Some(2.0),
            Self::Hyperbloom => Some(3.0),
            Self::Burgeon => Some(3.0),
            Self::Burning => Some(0.25),
            _ => None,
        }
    }

    /// Reactions that keep dealing damage from aura updates
    pub fn is_periodic(self) -> bool {
        matches!(self, Self::ElectroCharged | Self::Burning)
    }

    /// Element of the independent damage instance. Swirl takes the element it
    /// picked up.
    pub fn damage_element(self, swirled: Element) -> Element {
        match self {
            Self::Overloaded | Self::Burning => Element::Pyro,
            Self::ElectroCharged => Element::Electro,
            Self::Superconduct => Element::Cryo,
            Self::Swirl => swirled,
            Self::Shatter => Element::Physical,
            Self::Bloom | Self::Hyperbloom | Self::Burgeon => Element::Dendro,
            _ => swirled,
        }
    }
}

impl fmt::Display for ReactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Loose key/value payload carried on reaction results and damage descriptors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraValue {
    Flag(bool),
    Number(f64),
    Element(Element),
    Text(String),
}

/// Set on results produced by a periodic tick rather than a hit
pub const EXTRA_TICK: &str = "tick";
/// Frozen gauge installed by a Freeze
pub const EXTRA_FROZEN_GAUGE: &str = "frozen_gauge";
/// Quicken gauge installed by a Quicken
pub const EXTRA_QUICKEN_GAUGE: &str = "quicken_gauge";
/// The resident side was a meta-state rather than a plain aura
pub const EXTRA_META: &str = "meta";

/// Outcome of one incoming hit consuming one resident aura
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionResult {
    pub reaction_type: ReactionType,
    pub category: ReactionCategory,
    /// Element of the triggering hit
    pub source_element: Element,
    /// Element of the resident aura that was consumed
    pub target_element: Element,
    /// Amplifying multiplier (1.5/2.0) or additive base (1.15/1.25); 1.0 otherwise
    pub multiplier: f64,
    /// Gauge removed from the resident aura
    pub gauge_consumed: f64,
    #[serde(default)]
    pub extra: BTreeMap<String, ExtraValue>,
}

impl ReactionResult {
    pub fn new(reaction_type: ReactionType, source_element: Element, target_element: Element) -> Self {
        Self {
            reaction_type,
            category: reaction_type.category(),
            source_element,
            target_element,
            multiplier: 1.0,
            gauge_consumed: 0.0,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_consumed(mut self, gauge: f64) -> Self {
        self.gauge_consumed = gauge;
        self
    }

    pub fn with_extra(mut self, key: &str, value: ExtraValue) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    /// Whether this result came from a periodic tick (Electro-Charged, Burning)
    pub fn is_tick(&self) -> bool {
        matches!(self.extra.get(EXTRA_TICK), Some(ExtraValue::Flag(true)))
    }
}

/// One cell of the reaction table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairRule {
    pub reaction: ReactionType,
    /// Resident gauge removed per unit of incoming gauge. Zero for reactions
    /// that leave both auras in place.
    pub ratio: f64,
    /// Damage multiplier for amplifying/additive reactions
    pub multiplier: f64,
}

const fn rule(reaction: ReactionType, ratio: f64, multiplier: f64) -> PairRule {
    PairRule {
        reaction,
        ratio,
        multiplier,
    }
}

/// Look up the reaction between an incoming element and a plain resident aura.
pub fn classify(incoming: Element, resident: Element) -> Option<PairRule> {
    use Element::*;
    use ReactionType as R;

    let found = match (incoming, resident) {
        (Pyro, Hydro) => rule(R::Vaporize, 0.5, 1.5),
        (Hydro, Pyro) => rule(R::Vaporize, 2.0, 2.0),
        (Pyro, Cryo) => rule(R::Melt, 2.0, 2.0),
        (Cryo, Pyro) => rule(R::Melt, 0.5, 1.5),
        (Pyro, Electro) | (Electro, Pyro) => rule(R::Overloaded, 1.0, 1.0),
        (Cryo, Electro) | (Electro, Cryo) => rule(R::Superconduct, 1.0, 1.0),
        (Hydro, Electro) | (Electro, Hydro) => rule(R::ElectroCharged, 0.0, 1.0),
        (Hydro, Cryo) | (Cryo, Hydro) => rule(R::Freeze, 1.0, 1.0),
        (Anemo, r) if r.is_swirlable() => rule(R::Swirl, 0.5, 1.0),
        (Geo, r) if r.is_swirlable() => rule(R::Crystallize, 0.5, 1.0),
        (Dendro, Hydro) => rule(R::Bloom, 0.5, 1.0),
        (Hydro, Dendro) => rule(R::Bloom, 2.0, 1.0),
        (Pyro, Dendro) | (Dendro, Pyro) => rule(R::Burning, 1.0, 1.0),
        (Electro, Dendro) | (Dendro, Electro) => rule(R::Quicken, 1.0, 1.0),
        _ => return None,
    };
    Some(found)
}

/// Reactions against a Frozen target. Frozen behaves as Cryo for Melt,
/// Superconduct and Swirl; Geo shatters it outright.
pub fn classify_frozen(incoming: Element) -> Option<PairRule> {
    match incoming {
        Element::Pyro => Some(rule(ReactionType::Melt, 2.0, 2.0)),
        Element::Electro => Some(rule(ReactionType::Superconduct, 1.0, 1.0)),
        Element::Anemo => Some(rule(ReactionType::Swirl, 0.5, 1.0)),
        Element::Geo => Some(rule(ReactionType::Shatter, f64::INFINITY, 1.0)),
        _ => None,
    }
}

/// Reactions against a Quickened target. Aggravate and Spread leave the
/// quicken gauge untouched.
pub fn classify_quickened(incoming: Element) -> Option<PairRule> {
    match incoming {
        Element::Electro => Some(rule(ReactionType::Aggravate, 0.0, 1.15)),
        Element::Dendro => Some(rule(ReactionType::Spread, 0.0, 1.25)),
        Element::Hydro => Some(rule(ReactionType::Bloom, 2.0, 1.0)),
        Element::Pyro => Some(rule(ReactionType::Burning, 1.0, 1.0)),
        _ => None,
    }
}

/// Elemental-mastery scaling curve `coefficient * EM / (EM + k)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasteryCurve {
    pub coefficient: f64,
    pub k: f64,
}

impl MasteryCurve {
    pub const AMPLIFYING: Self = Self {
        coefficient: 2.78,
        k: 1400.0,
    };
    pub const ADDITIVE: Self = Self {
        coefficient: 5.0,
        k: 1200.0,
    };
    pub const TRANSFORMATIVE: Self = Self {
        coefficient: 16.0,
        k: 2000.0,
    };
    pub const SHIELD: Self = Self {
        coefficient: 4.44,
        k: 1400.0,
    };

    /// Diminishing-returns bonus for the given elemental mastery
    pub fn bonus(self, mastery: f64) -> f64 {
        if mastery <= 0.0 {
            return 0.0;
        }
        self.coefficient * mastery / (mastery + self.k)
    }

    pub fn for_category(category: ReactionCategory) -> Self {
        match category {
            ReactionCategory::Amplifying => Self::AMPLIFYING,
            ReactionCategory::Additive => Self::ADDITIVE,
            ReactionCategory::Transformative => Self::TRANSFORMATIVE,
            ReactionCategory::Status => Self::SHIELD,
        }
    }
}
