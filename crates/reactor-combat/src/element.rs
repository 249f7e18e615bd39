//! Combat elements
//!
//! 8 elements: Pyro, Hydro, Electro, Cryo, Dendro, Geo, Anemo, Physical.
//! Physical carries no elemental gauge and never reacts. Geo and Anemo react
//! with resident auras but never become an aura themselves.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The 8 combat elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Element {
    Pyro,
    Hydro,
    Electro,
    Cryo,
    Dendro,
    Geo,
    Anemo,
    #[default]
    Physical,
}

/// Total number of elements (for array indexing)
pub const ELEMENT_COUNT: usize = 8;

impl Element {
    /// Array index for this element (for per-element bonus / resistance arrays)
    pub fn index(self) -> usize {
        match self {
            Self::Pyro => 0,
            Self::Hydro => 1,
            Self::Electro => 2,
            Self::Cryo => 3,
            Self::Dendro => 4,
            Self::Geo => 5,
            Self::Anemo => 6,
            Self::Physical => 7,
        }
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Self::Pyro => "Pyro",
            Self::Hydro => "Hydro",
            Self::Electro => "Electro",
            Self::Cryo => "Cryo",
            Self::Dendro => "Dendro",
            Self::Geo => "Geo",
            Self::Anemo => "Anemo",
            Self::Physical => "Physical",
        }
    }

    /// Whether hits of this element carry gauge at all
    pub fn is_elemental(self) -> bool {
        self != Self::Physical
    }

    /// Whether this element can linger on a target as an aura
    pub fn can_attach(self) -> bool {
        matches!(
            self,
            Self::Pyro | Self::Hydro | Self::Electro | Self::Cryo | Self::Dendro
        )
    }

    /// Elements that Swirl and Crystallize can pick up
    pub fn is_swirlable(self) -> bool {
        matches!(self, Self::Pyro | Self::Hydro | Self::Electro | Self::Cryo)
    }

    /// All element variants
    pub fn all() -> &'static [Element] {
        &[
            Self::Pyro,
            Self::Hydro,
            Self::Electro,
            Self::Cryo,
            Self::Dendro,
            Self::Geo,
            Self::Anemo,
            Self::Physical,
        ]
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
