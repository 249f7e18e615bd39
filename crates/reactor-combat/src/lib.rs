//! Reactor Combat - Elemental combat simulation
//!
//! Provides elemental auras and their reactions, internal cooldowns, effects,
//! the staged damage pipeline, and the frame-stepped [`Simulation`] that ties
//! them together.

pub mod aura;
pub mod context;
pub mod damage;
pub mod damage_system;
pub mod effect;
pub mod element;
pub mod entity;
pub mod events;
pub mod field;
pub mod icd;
pub mod level;
pub mod pipeline;
pub mod reaction;
pub mod reaction_system;
pub mod simulation;
pub mod stats;

pub use aura::{AuraEntry, AuraManager, AuraSnapshot, BurningState, GaugeState};
pub use context::{Bucket, DamageContext};
pub use damage::{Damage, DamageType, Hitbox, Scaling};
pub use damage_system::DamageSystem;
pub use effect::{Effect, EffectKind, EffectManager};
pub use element::Element;
pub use entity::{CombatEntity, EntitySpec};
pub use events::{AfterDamage, BeforeDamage, ReactionTriggered, ResolveDamage};
pub use field::{DendroCore, DendroField};
pub use icd::{IcdManager, IcdRecord, IcdRule, IcdRuleTable, IcdTag};
pub use pipeline::{DamagePipeline, Outcome};
pub use reaction::{ExtraValue, MasteryCurve, ReactionCategory, ReactionResult, ReactionType};
pub use reaction_system::ReactionSystem;
pub use simulation::{Action, DamageRecord, ReactionRecord, Simulation};
pub use stats::{AttributeKey, Attributes};
