//! Timed effects on combat entities
//!
//! Infusions, resistance/defense shreds and shields. Each effect is a tagged
//! [`EffectKind`]; lookups match on the variant rather than scanning names.

use serde::{Deserialize, Serialize};
use tracing::debug;

use reactor_core::Frame;

use super::element::Element;

/// Absorption multiplier of an elemental shield against its own element
pub const MATCHING_SHIELD_EFFICIENCY: f64 = 2.5;

/// Infusion precedence, first wins
const INFUSION_PRIORITY: [Element; 7] = [
    Element::Hydro,
    Element::Pyro,
    Element::Cryo,
    Element::Electro,
    Element::Anemo,
    Element::Geo,
    Element::Dendro,
];

fn infusion_rank(element: Element) -> usize {
    INFUSION_PRIORITY
        .iter()
        .position(|&e| e == element)
        .unwrap_or(INFUSION_PRIORITY.len())
}

/// What an effect does
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EffectKind {
    /// Converts physical-scaling attacks to `element` with `strength` gauge
    Infusion { element: Element, strength: f64 },
    /// Lowers the bearer's resistance to one element
    ResistanceShred { element: Element, amount: f64 },
    /// Ignores a fraction of the bearer's defense
    DefenseShred { amount: f64 },
    /// Absorbs incoming damage. `element` shields absorb their own element
    /// more efficiently.
    Shield {
        hp: f64,
        max_hp: f64,
        element: Option<Element>,
    },
}

/// An active effect instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    /// Same-named effects refresh instead of stacking
    pub name: String,
    pub kind: EffectKind,
    /// Remaining duration in seconds
    pub remaining: f64,
    /// Frame it was first applied
    pub applied_frame: Frame,
}

impl Effect {
    pub fn new(name: impl Into<String>, kind: EffectKind, duration: f64, now: Frame) -> Self {
        Self {
            name: name.into(),
            kind,
            remaining: duration,
            applied_frame: now,
        }
    }

    pub fn infusion(
        name: impl Into<String>,
        element: Element,
        strength: f64,
        duration: f64,
        now: Frame,
    ) -> Self {
        Self::new(name, EffectKind::Infusion { element, strength }, duration, now)
    }

    pub fn resistance_shred(
        name: impl Into<String>,
        element: Element,
        amount: f64,
        duration: f64,
        now: Frame,
    ) -> Self {
        Self::new(name, EffectKind::ResistanceShred { element, amount }, duration, now)
    }

    pub fn shield(
        name: impl Into<String>,
        hp: f64,
        element: Option<Element>,
        duration: f64,
        now: Frame,
    ) -> Self {
        Self::new(
            name,
            EffectKind::Shield {
                hp,
                max_hp: hp,
                element,
            },
            duration,
            now,
        )
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }
}

/// All active effects on one entity
#[derive(Debug, Clone, Default)]
pub struct EffectManager {
    effects: Vec<Effect>,
}

impl EffectManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an effect. A same-named effect is refreshed: the longer duration
    /// wins, and shields keep the larger hp.
    pub fn apply(&mut self, effect: Effect) {
        let Some(existing) = self.effects.iter_mut().find(|e| e.name == effect.name) else {
            debug!("effect '{}' applied for {:.2}s", effect.name, effect.remaining);
            self.effects.push(effect);
            return;
        };

        existing.remaining = existing.remaining.max(effect.remaining);
        match (&mut existing.kind, effect.kind) {
            (
                EffectKind::Shield { hp, max_hp, element },
                EffectKind::Shield {
                    hp: new_hp,
                    element: new_element,
                    ..
                },
            ) => {
                if new_hp > *hp {
                    *hp = new_hp;
                    *max_hp = new_hp;
                    *element = new_element;
                }
            }
            (kind, new_kind) => *kind = new_kind,
        }
        debug!("effect '{}' refreshed", existing.name);
    }

    /// Advance timers by `dt` seconds and drop expired effects.
    pub fn update(&mut self, dt: f64) {
        for effect in &mut self.effects {
            effect.remaining -= dt;
        }
        self.effects.retain(|e| {
            if e.is_expired() {
                debug!("effect '{}' expired", e.name);
            }
            !e.is_expired()
        });
    }

    /// The winning infusion, if any: element priority, then earliest applied.
    pub fn infusion(&self) -> Option<(Element, f64)> {
        self.effects
            .iter()
            .filter_map(|e| match e.kind {
                EffectKind::Infusion { element, strength } => {
                    Some((infusion_rank(element), e.applied_frame, element, strength))
                }
                _ => None,
            })
            .min_by_key(|&(rank, frame, _, _)| (rank, frame))
            .map(|(_, _, element, strength)| (element, strength))
    }

    /// Total resistance reduction against an element
    pub fn resistance_shred(&self, against: Element) -> f64 {
        self.effects
            .iter()
            .map(|e| match e.kind {
                EffectKind::ResistanceShred { element, amount } if element == against => amount,
                _ => 0.0,
            })
            .sum()
    }

    /// Total defense ignored, capped at 100%
    pub fn defense_shred(&self) -> f64 {
        self.effects
            .iter()
            .map(|e| match e.kind {
                EffectKind::DefenseShred { amount } => amount,
                _ => 0.0,
            })
            .sum::<f64>()
            .min(1.0)
    }

    /// Run damage through shields. Returns the damage left over.
    pub fn absorb_damage(&mut self, damage: f64, element: Element) -> f64 {
        let mut remaining = damage;
        for effect in &mut self.effects {
            if remaining <= 0.0 {
                break;
            }
            let EffectKind::Shield {
                hp,
                element: shield_element,
                ..
            } = &mut effect.kind
            else {
                continue;
            };
            if *hp <= 0.0 {
                continue;
            }
            let efficiency = if *shield_element == Some(element) {
                MATCHING_SHIELD_EFFICIENCY
            } else {
                1.0
            };
            let capacity = *hp * efficiency;
            if remaining < capacity {
                *hp -= remaining / efficiency;
                remaining = 0.0;
            } else {
                remaining -= capacity;
                *hp = 0.0;
                // broken
                effect.remaining = 0.0;
            }
        }
        self.effects.retain(|e| !e.is_expired());
        remaining
    }

    pub fn shield_hp(&self) -> f64 {
        self.effects
            .iter()
            .map(|e| match e.kind {
                EffectKind::Shield { hp, .. } => hp,
                _ => 0.0,
            })
            .sum()
    }

    pub fn has_effect(&self, name: &str) -> bool {
        self.effects.iter().any(|e| e.name == name)
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    pub fn count(&self) -> usize {
        self.effects.len()
    }
}
