//! Internal cooldown gating for elemental attachment
//!
//! Each defender tracks, per (attacker, tag), how many hits have landed since
//! the last attaching hit and when that hit happened. With the default rule
//! every third hit attaches, and so does any hit after a 2.5 second gap.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use reactor_core::{ConfigurationError, EntityId, Frame, InvariantViolation};

/// Attack grouping for internal cooldown purposes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IcdTag {
    /// No cooldown; every hit attaches
    None,
    /// Hits are independent of each other; every hit attaches
    Independent,
    /// The shared default group
    #[default]
    Standard,
    /// Any other group, looked up in the rule table
    Named(String),
}

impl IcdTag {
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "None",
            Self::Independent => "Independent",
            Self::Standard => "Standard",
            Self::Named(name) => name,
        }
    }

    /// Whether hits with this tag skip gating entirely
    pub fn is_ungated(&self) -> bool {
        matches!(self, Self::None | Self::Independent)
    }
}

impl From<String> for IcdTag {
    fn from(value: String) -> Self {
        match value.as_str() {
            "None" => Self::None,
            "Independent" => Self::Independent,
            "Standard" => Self::Standard,
            _ => Self::Named(value),
        }
    }
}

impl From<&str> for IcdTag {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<IcdTag> for String {
    fn from(tag: IcdTag) -> Self {
        tag.as_str().to_string()
    }
}

impl fmt::Display for IcdTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Window/limit pair for one tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcdRule {
    /// Frames after an attaching hit during which hits are counted
    pub window: Frame,
    /// Hits per window; the hit after the limit attaches again
    pub limit: u32,
}

impl Default for IcdRule {
    fn default() -> Self {
        Self {
            window: 150,
            limit: 3,
        }
    }
}

/// Per-tag rule lookup. Unknown tags get the default rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IcdRuleTable {
    rules: HashMap<String, IcdRule>,
}

impl Default for IcdRuleTable {
    fn default() -> Self {
        let mut rules = HashMap::new();
        rules.insert("Standard".to_string(), IcdRule::default());
        rules.insert("NormalAttack".to_string(), IcdRule::default());
        rules.insert("ElementalArt".to_string(), IcdRule::default());
        rules.insert("ElementalBurst".to_string(), IcdRule::default());
        Self { rules }
    }
}

impl IcdRuleTable {
    /// The built-in tags, all on the default rule
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the rule for a tag
    pub fn insert(&mut self, tag: impl Into<String>, rule: IcdRule) {
        self.rules.insert(tag.into(), rule);
    }

    /// Overlay another table's rules onto this one
    pub fn merge(&mut self, other: &IcdRuleTable) {
        for (tag, rule) in &other.rules {
            self.rules.insert(tag.clone(), *rule);
        }
    }

    pub fn get(&self, tag: &IcdTag) -> Option<IcdRule> {
        self.rules.get(tag.as_str()).copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Gate state for one (attacker, tag) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcdRecord {
    pub hit_count: u32,
    pub last_attach_frame: Frame,
}

/// Defender-owned internal cooldown tracker
#[derive(Debug, Clone, Default)]
pub struct IcdManager {
    records: HashMap<(EntityId, IcdTag), IcdRecord>,
    rules: IcdRuleTable,
    reported_unknown: HashSet<String>,
}

impl IcdManager {
    pub fn new(rules: IcdRuleTable) -> Self {
        Self {
            records: HashMap::new(),
            rules,
            reported_unknown: HashSet::new(),
        }
    }

    /// Gauge multiplier for a hit: 1.0 if it may attach, 0.0 if gated.
    pub fn check_attachment(&mut self, attacker: EntityId, tag: &IcdTag, now: Frame) -> f64 {
        if tag.is_ungated() {
            return 1.0;
        }

        let rule = self.rule_for(tag);
        let key = (attacker, tag.clone());
        let Some(record) = self.records.get_mut(&key) else {
            self.records.insert(
                key,
                IcdRecord {
                    hit_count: 1,
                    last_attach_frame: now,
                },
            );
            trace!("ICD {tag}: first hit from {attacker} attaches");
            return 1.0;
        };

        if record.hit_count == 0 {
            InvariantViolation::EmptyIcdRecord {
                tag: tag.to_string(),
            }
            .raise();
        }

        if now.saturating_sub(record.last_attach_frame) >= rule.window {
            record.hit_count = 1;
            record.last_attach_frame = now;
            trace!("ICD {tag}: window elapsed, {attacker} attaches");
            1.0
        } else if record.hit_count >= rule.limit {
            record.hit_count = 1;
            trace!("ICD {tag}: hit limit reached, {attacker} attaches");
            1.0
        } else {
            record.hit_count += 1;
            trace!("ICD {tag}: {attacker} gated ({} hits)", record.hit_count);
            0.0
        }
    }

    /// Convenience wrapper over [`check_attachment`](Self::check_attachment)
    pub fn allows(&mut self, attacker: EntityId, tag: &IcdTag, now: Frame) -> bool {
        self.check_attachment(attacker, tag, now) > 0.0
    }

    pub fn record(&self, attacker: EntityId, tag: &IcdTag) -> Option<&IcdRecord> {
        self.records.get(&(attacker, tag.clone()))
    }

    pub fn rules(&self) -> &IcdRuleTable {
        &self.rules
    }

    /// Forget all gate state (rules are kept)
    pub fn clear(&mut self) {
        self.records.clear();
    }

    fn rule_for(&mut self, tag: &IcdTag) -> IcdRule {
        if let Some(rule) = self.rules.get(tag) {
            return rule;
        }
        if self.reported_unknown.insert(tag.to_string()) {
            warn!("{}", ConfigurationError::UnknownIcdTag(tag.to_string()));
        }
        IcdRule::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attacker(n: u8) -> EntityId {
        EntityId::from_random_bytes([n; 16])
    }

    #[test]
    fn test_every_third_hit_cycle() {
        let mut icd = IcdManager::new(IcdRuleTable::new());
        let tag = IcdTag::Standard;
        let a = attacker(1);

        let results: Vec<bool> = (0..4).map(|frame| icd.allows(a, &tag, frame)).collect();
        assert_eq!(results, vec![true, false, false, true]);

        // denied hit, then a gap past the window
        assert!(!icd.allows(a, &tag, 4));
        assert!(icd.allows(a, &tag, 200));
    }

    #[test]
    fn test_limit_allow_keeps_timer() {
        let mut icd = IcdManager::new(IcdRuleTable::new());
        let tag = IcdTag::Standard;
        let a = attacker(1);
        for frame in 0..4 {
            icd.allows(a, &tag, frame);
        }
        let record = icd.record(a, &tag).unwrap();
        assert_eq!(record.hit_count, 1);
        assert_eq!(record.last_attach_frame, 0);
    }

    #[test]
    fn test_ungated_tags_always_attach() {
        let mut icd = IcdManager::new(IcdRuleTable::new());
        for frame in 0..10 {
            assert_eq!(icd.check_attachment(attacker(1), &IcdTag::None, frame), 1.0);
            assert_eq!(
                icd.check_attachment(attacker(1), &IcdTag::Independent, frame),
                1.0
            );
        }
        assert!(icd.record(attacker(1), &IcdTag::None).is_none());
    }

    #[test]
    fn test_attackers_are_tracked_separately() {
        let mut icd = IcdManager::new(IcdRuleTable::new());
        let tag = IcdTag::Standard;
        assert!(icd.allows(attacker(1), &tag, 0));
        assert!(!icd.allows(attacker(1), &tag, 1));
        assert!(icd.allows(attacker(2), &tag, 1));
    }

    #[test]
    fn test_unknown_tag_uses_default_rule() {
        let mut icd = IcdManager::new(IcdRuleTable::new());
        let tag = IcdTag::from("Lightning Rose");
        let results: Vec<bool> = (0..4).map(|f| icd.allows(attacker(1), &tag, f)).collect();
        assert_eq!(results, vec![true, false, false, true]);
    }

    #[test]
    fn test_custom_rule() {
        let mut rules = IcdRuleTable::new();
        rules.insert(
            "Fast",
            IcdRule {
                window: 30,
                limit: 2,
            },
        );
        let mut icd = IcdManager::new(rules);
        let tag = IcdTag::from("Fast");
        let results: Vec<bool> = [0, 1, 2, 40]
            .iter()
            .map(|&f| icd.allows(attacker(1), &tag, f))
            .collect();
        assert_eq!(results, vec![true, false, true, true]);
    }

    #[test]
    fn test_tag_string_round_trip() {
        assert_eq!(IcdTag::from("None"), IcdTag::None);
        assert_eq!(IcdTag::from("Standard"), IcdTag::Standard);
        assert_eq!(String::from(IcdTag::Named("Skill".into())), "Skill");

        let json = serde_json::to_string(&IcdTag::Independent).unwrap();
        assert_eq!(json, "\"Independent\"");
    }
}
