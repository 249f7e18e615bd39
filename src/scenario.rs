//! Scenario files
//!
//! A scenario is a TOML description of one simulation run: the entities, a
//! timeline of attacks and infusions, and optional ICD rule overrides. It is
//! plain data, so it can be handed to any worker thread and turned into a
//! fresh [`Simulation`] there.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use reactor_combat::{
    AttributeKey, Damage, DamageType, Effect, Element, EntitySpec, Hitbox, IcdRule,
    IcdRuleTable, IcdTag, Scaling, Simulation,
};
use reactor_core::{Circle, EntityId, Frame, Vec3};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("scenario '{scenario}' refers to unknown entity '{name}'")]
    UnknownEntity { scenario: String, name: String },
    #[error("scenario '{scenario}' has two entities named '{name}'")]
    DuplicateEntity { scenario: String, name: String },
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_repeat() -> u32 {
    1
}

/// One scheduled attack, possibly repeated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackSpec {
    pub frame: Frame,
    pub name: String,
    pub source: String,
    /// Omit together with `radius` to hit every opponent in range
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub element: Element,
    /// Gauge units applied on hit
    #[serde(default)]
    pub gauge: f64,
    #[serde(default = "default_damage_type")]
    pub damage_type: DamageType,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default)]
    pub scaling: AttributeKey,
    #[serde(default)]
    pub icd: IcdTag,
    /// Area of effect, centered on the target (or the source when untargeted)
    #[serde(default)]
    pub radius: Option<f32>,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
    /// Frames between repeats
    #[serde(default)]
    pub interval: Frame,
}

fn default_damage_type() -> DamageType {
    DamageType::Normal
}

/// A weapon infusion granted at a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfusionSpec {
    pub frame: Frame,
    pub name: String,
    pub target: String,
    pub element: Element,
    #[serde(default = "default_multiplier")]
    pub gauge: f64,
    /// Seconds
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub duration_frames: Option<Frame>,
    #[serde(default)]
    pub entities: Vec<EntitySpec>,
    #[serde(default)]
    pub attacks: Vec<AttackSpec>,
    #[serde(default)]
    pub infusions: Vec<InfusionSpec>,
    /// Overrides and additions on top of the built-in ICD rules
    #[serde(default)]
    pub icd_rules: BTreeMap<String, IcdRule>,
}

impl Scenario {
    /// Read a scenario file. An unnamed scenario takes its file stem.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut scenario: Scenario =
            toml::from_str(&text).map_err(|source| ScenarioError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        if scenario.name.is_empty() {
            scenario.name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("scenario")
                .to_string();
        }
        scenario.validate()?;
        info!(
            "Loaded scenario '{}' ({} entities, {} attacks)",
            scenario.name,
            scenario.entities.len(),
            scenario.attacks.len()
        );
        Ok(scenario)
    }

    /// Check that every name the timeline uses belongs to exactly one entity
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let mut seen = HashSet::new();
        for entity in &self.entities {
            if !seen.insert(entity.name.as_str()) {
                return Err(ScenarioError::DuplicateEntity {
                    scenario: self.name.clone(),
                    name: entity.name.clone(),
                });
            }
        }

        let referenced = self
            .attacks
            .iter()
            .flat_map(|a| std::iter::once(&a.source).chain(a.target.as_ref()))
            .chain(self.infusions.iter().map(|i| &i.target));
        for name in referenced {
            if !seen.contains(name.as_str()) {
                return Err(ScenarioError::UnknownEntity {
                    scenario: self.name.clone(),
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn rules(&self) -> IcdRuleTable {
        let mut rules = IcdRuleTable::default();
        for (tag, rule) in &self.icd_rules {
            rules.insert(tag.clone(), *rule);
        }
        rules
    }

    /// Build a fresh simulation with every entity spawned and the whole
    /// timeline scheduled.
    pub fn build(&self) -> Result<Simulation, ScenarioError> {
        self.validate()?;
        let mut sim = Simulation::with_rules(self.seed, self.rules());
        let mut ids = HashMap::new();
        for spec in &self.entities {
            let id = sim.spawn(spec.clone());
            ids.insert(spec.name.clone(), (id, spec.position));
        }
        let lookup = |name: &str| {
            ids.get(name).copied().ok_or_else(|| ScenarioError::UnknownEntity {
                scenario: self.name.clone(),
                name: name.to_string(),
            })
        };

        for infusion in &self.infusions {
            let (target, _) = lookup(&infusion.target)?;
            let effect = Effect::infusion(
                infusion.name.clone(),
                infusion.element,
                infusion.gauge,
                infusion.duration,
                infusion.frame,
            );
            sim.schedule_effect(infusion.frame, target, effect);
        }

        for attack in &self.attacks {
            let (source, source_position) = lookup(&attack.source)?;
            let target = attack.target.as_deref().map(lookup).transpose()?;

            let mut damage = Damage::new(attack.name.clone(), source, attack.element, attack.gauge)
                .with_type(attack.damage_type)
                .with_scaling(Scaling::Single {
                    attribute: attack.scaling,
                    multiplier: attack.multiplier,
                })
                .with_icd(attack.icd.clone());
            damage = Self::aim(damage, attack.radius, target, source_position);

            for i in 0..attack.repeat.max(1) {
                let frame = attack.frame + u64::from(i) * attack.interval;
                sim.schedule_attack(frame, damage.clone());
            }
        }

        debug!("Built scenario '{}' with seed {}", self.name, self.seed);
        Ok(sim)
    }

    fn aim(
        damage: Damage,
        radius: Option<f32>,
        target: Option<(EntityId, Vec3)>,
        source_position: Vec3,
    ) -> Damage {
        match (radius, target) {
            (Some(radius), Some((_, position))) => {
                damage.with_hitbox(Hitbox::Area(Circle::new(position, radius)))
            }
            (Some(radius), None) => {
                damage.with_hitbox(Hitbox::Area(Circle::new(source_position, radius)))
            }
            (None, Some((id, _))) => damage.targeting(id),
            (None, None) => damage,
        }
    }

    /// Frames to simulate, falling back to `default`
    pub fn duration(&self, default: Frame) -> Frame {
        self.duration_frames.unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUEL: &str = r#"
name = "duel"
seed = 11
duration_frames = 120

[[entities]]
name = "Hero"
attributes = { attack = 1000.0, hp = 15000.0, defense = 800.0, crit_rate = 0.0 }

[[entities]]
name = "Dummy"
team = 1
attributes = { hp = 100000.0, defense = 500.0 }
resistances = { Physical = 0.1, Pyro = 0.1, Hydro = 0.1 }

[[attacks]]
frame = 0
name = "Strike"
source = "Hero"
target = "Dummy"
repeat = 3
interval = 30

[icd_rules.Spin]
window = 60
limit = 2
"#;

    #[test]
    fn test_parse_and_build() {
        let scenario: Scenario = toml::from_str(DUEL).unwrap();
        assert_eq!(scenario.entities.len(), 2);
        assert_eq!(scenario.entities[1].team, 1);
        assert_eq!(scenario.attacks[0].multiplier, 1.0);
        assert_eq!(scenario.attacks[0].damage_type, DamageType::Normal);
        assert!(scenario.rules().get(&IcdTag::from("Spin")).is_some());

        let mut sim = scenario.build().unwrap();
        sim.run_until(scenario.duration(600));
        assert_eq!(sim.damage_log().len(), 3);
        let expected = 1000.0 * (1450.0 / 1950.0) * 0.9;
        assert!((sim.damage_log()[0].amount - expected).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_entity_is_rejected() {
        let mut scenario: Scenario = toml::from_str(DUEL).unwrap();
        scenario.attacks[0].target = Some("Nobody".to_string());
        assert!(matches!(
            scenario.build(),
            Err(ScenarioError::UnknownEntity { ref name, .. }) if name == "Nobody"
        ));
    }

    #[test]
    fn test_duplicate_entity_is_rejected() {
        let mut scenario: Scenario = toml::from_str(DUEL).unwrap();
        let copy = scenario.entities[0].clone();
        scenario.entities.push(copy);
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::DuplicateEntity { .. })
        ));
    }

    #[test]
    fn test_area_attack_without_target() {
        let mut scenario: Scenario = toml::from_str(DUEL).unwrap();
        scenario.attacks[0].target = None;
        scenario.attacks[0].radius = Some(5.0);
        scenario.attacks[0].repeat = 1;

        let mut sim = scenario.build().unwrap();
        sim.run_until(10);
        assert_eq!(sim.damage_log().len(), 1);
        assert_eq!(sim.damage_log()[0].target, "Dummy");
    }

    #[test]
    fn test_missing_file() {
        let err = Scenario::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ScenarioError::Io { .. }));
    }
}
