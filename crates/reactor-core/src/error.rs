//! Engine error taxonomy
//!
//! Two kinds of failure exist inside a simulation:
//!
//! - [`ConfigurationError`]: a malformed attack or entity description. The
//!   engine logs a warning, substitutes the documented default, and keeps
//!   running.
//! - [`InvariantViolation`]: engine state that cannot occur unless the engine
//!   itself is wrong. The current run is aborted with a panic carrying the
//!   violation's message; batch drivers catch the unwind per scenario.
//!
//! "Nothing happened" outcomes (no reaction, ICD denial, zero gauge) are not
//! errors and have no representation here.

/// Recoverable description problems. Each variant names its fallback.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("entity '{entity}' has no {element} resistance entry, assuming {fallback}")]
    MissingResistance {
        entity: String,
        element: String,
        fallback: f64,
    },

    #[error("ICD tag '{0}' is not in the rule table, using the default rule")]
    UnknownIcdTag(String),

    #[error("level {requested} is outside the coefficient table, using level {used}")]
    LevelOutOfRange { requested: u32, used: u32 },

    #[error("damage '{damage}' refers to unknown entity {entity}, skipping it")]
    UnknownEntity { damage: String, entity: String },
}

/// Engine bugs. Never constructed for a gameplay condition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("{element} aura amount {amount} survived an update tick while negative")]
    NegativeAura { element: String, amount: f64 },

    #[error("ICD record for tag '{tag}' has a hit count of zero")]
    EmptyIcdRecord { tag: String },

    #[error("damage '{name}' produced a non-finite result {value}")]
    NonFiniteDamage { name: String, value: f64 },
}

impl InvariantViolation {
    /// Abort the current simulation run.
    pub fn raise(self) -> ! {
        panic!("invariant violation: {self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_messages_name_fallback() {
        let err = ConfigurationError::MissingResistance {
            entity: "Hilichurl".into(),
            element: "Pyro".into(),
            fallback: 0.1,
        };
        assert_eq!(
            err.to_string(),
            "entity 'Hilichurl' has no Pyro resistance entry, assuming 0.1"
        );
    }

    #[test]
    #[should_panic(expected = "invariant violation")]
    fn test_raise_panics() {
        InvariantViolation::EmptyIcdRecord { tag: "Standard".into() }.raise();
    }
}
