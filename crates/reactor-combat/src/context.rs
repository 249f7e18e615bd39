//! Per-resolution numeric state

use std::fmt;

use serde::{Deserialize, Serialize};

use super::damage::Scaling;
use super::stats::AttributeKey;

/// Named slots the pipeline fills in and subscribers may adjust
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bucket {
    Attack,
    Defense,
    Hp,
    ElementalMastery,
    /// Added to the scaled attribute before %-bonuses
    FlatBonus,
    PercentBonus,
    CritRate,
    CritDamage,
    DefenseCoefficient,
    ResistanceCoefficient,
    /// Amplifying multiplier, or the coefficient of reaction damage
    ReactionBase,
    /// Mastery term plus external reaction bonuses
    ReactionBonus,
    /// Any independent multiplier
    Standalone,
}

pub const BUCKET_COUNT: usize = 13;

impl Bucket {
    pub fn index(self) -> usize {
        match self {
            Self::Attack => 0,
            Self::Defense => 1,
            Self::Hp => 2,
            Self::ElementalMastery => 3,
            Self::FlatBonus => 4,
            Self::PercentBonus => 5,
            Self::CritRate => 6,
            Self::CritDamage => 7,
            Self::DefenseCoefficient => 8,
            Self::ResistanceCoefficient => 9,
            Self::ReactionBase => 10,
            Self::ReactionBonus => 11,
            Self::Standalone => 12,
        }
    }

    pub fn all() -> &'static [Bucket] {
        &[
            Self::Attack,
            Self::Defense,
            Self::Hp,
            Self::ElementalMastery,
            Self::FlatBonus,
            Self::PercentBonus,
            Self::CritRate,
            Self::CritDamage,
            Self::DefenseCoefficient,
            Self::ResistanceCoefficient,
            Self::ReactionBase,
            Self::ReactionBonus,
            Self::Standalone,
        ]
    }

    /// Bucket holding the attacker's value of `key`
    pub fn for_attribute(key: AttributeKey) -> Self {
        match key {
            AttributeKey::Attack => Self::Attack,
            AttributeKey::Hp => Self::Hp,
            AttributeKey::Defense => Self::Defense,
            AttributeKey::ElementalMastery => Self::ElementalMastery,
        }
    }

    /// Value before any stage writes to it
    fn initial(self) -> f64 {
        match self {
            Self::DefenseCoefficient
            | Self::ResistanceCoefficient
            | Self::ReactionBase
            | Self::Standalone => 1.0,
            _ => 0.0,
        }
    }
}

/// Numeric state of one damage resolution
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageContext {
    buckets: [f64; BUCKET_COUNT],
    /// Level of the attacker, for level-scaled terms
    pub attacker_level: u32,
    /// An amplifying reaction fired on this hit
    pub amplified: bool,
    pub final_result: f64,
    pub is_crit: bool,
}

impl Default for DamageContext {
    fn default() -> Self {
        let mut buckets = [0.0; BUCKET_COUNT];
        for &bucket in Bucket::all() {
            buckets[bucket.index()] = bucket.initial();
        }
        Self {
            buckets,
            attacker_level: 1,
            amplified: false,
            final_result: 0.0,
            is_crit: false,
        }
    }
}

impl DamageContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bucket: Bucket) -> f64 {
        self.buckets[bucket.index()]
    }

    pub fn set(&mut self, bucket: Bucket, value: f64) {
        self.buckets[bucket.index()] = value;
    }

    pub fn add(&mut self, bucket: Bucket, value: f64) {
        self.buckets[bucket.index()] += value;
    }

    pub fn multiply(&mut self, bucket: Bucket, factor: f64) {
        self.buckets[bucket.index()] *= factor;
    }

    /// Amplifying factor, 1.0 when no amplifying reaction fired
    pub fn reaction_term(&self) -> f64 {
        if self.amplified {
            self.get(Bucket::ReactionBase) * (1.0 + self.get(Bucket::ReactionBonus))
        } else {
            1.0
        }
    }

    /// Talent multiplier(s) applied to the attribute buckets
    pub fn scaled_value(&self, scaling: &Scaling) -> f64 {
        scaling.evaluate(|key| self.get(Bucket::for_attribute(key)))
    }

    pub fn crit_term(&self) -> f64 {
        if self.is_crit {
            1.0 + self.get(Bucket::CritDamage)
        } else {
            1.0
        }
    }
}

impl fmt::Debug for DamageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for &bucket in Bucket::all() {
            map.entry(&bucket, &self.get(bucket));
        }
        map.entry(&"final", &self.final_result)
            .entry(&"crit", &self.is_crit)
            .finish()
    }
}
