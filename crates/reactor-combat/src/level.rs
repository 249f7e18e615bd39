//! Level-scaled constants
//!
//! Reaction damage and crystallize shields scale with the triggering
//! character's level through fixed tables. Only the anchor levels below are
//! exact; levels between anchors are interpolated linearly.

use tracing::warn;

use reactor_core::ConfigurationError;

pub const MIN_LEVEL: u32 = 1;
pub const MAX_LEVEL: u32 = 90;

/// (level, reaction level coefficient)
const REACTION_ANCHORS: [(u32, f64); 10] = [
    (1, 17.165606),
    (10, 34.143526),
    (20, 80.584775),
    (30, 136.29291),
    (40, 207.38208),
    (50, 323.6016),
    (60, 492.88489),
    (70, 765.64093),
    (80, 1077.4439),
    (90, 1446.8535),
];

/// (level, crystallize shield base)
const SHIELD_ANCHORS: [(u32, f64); 8] = [
    (1, 91.18),
    (20, 303.83),
    (40, 585.0),
    (50, 733.37),
    (60, 969.12),
    (70, 1180.24),
    (80, 1394.67),
    (90, 1851.06),
];

/// Clamp a level into the table range, warning when it had to move.
pub fn clamp_level(level: u32) -> u32 {
    let used = level.clamp(MIN_LEVEL, MAX_LEVEL);
    if used != level {
        warn!(
            "{}",
            ConfigurationError::LevelOutOfRange {
                requested: level,
                used,
            }
        );
    }
    used
}

fn lookup(table: &[(u32, f64)], level: u32) -> f64 {
    let level = clamp_level(level);
    let mut lower = table[0];
    for &(anchor, value) in table {
        if anchor == level {
            return value;
        }
        if anchor > level {
            let (lo_level, lo_value) = lower;
            let t = (level - lo_level) as f64 / (anchor - lo_level) as f64;
            return lo_value + (value - lo_value) * t;
        }
        lower = (anchor, value);
    }
    lower.1
}

/// Base value that transformative and additive reaction damage scales from
pub fn reaction_level_coefficient(level: u32) -> f64 {
    lookup(&REACTION_ANCHORS, level)
}

/// Crystallize shield strength before elemental mastery
pub fn crystallize_shield_base(level: u32) -> f64 {
    lookup(&SHIELD_ANCHORS, level)
}
