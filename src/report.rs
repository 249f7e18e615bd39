//! Run reports
//!
//! Every batch produces one JSON report with a record per scenario: how the
//! run ended, the damage and reaction logs, and a few totals.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use reactor_combat::{DamageRecord, ReactionRecord, Simulation};
use reactor_core::{frames_to_seconds, Frame};

/// Report format version
pub const REPORT_VERSION: u32 = 1;

/// How a scenario run ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    /// The scenario could not be built
    Failed { reason: String },
    /// The engine hit a broken invariant mid-run
    Aborted { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub seed: u64,
    pub frames: Frame,
    pub status: RunStatus,
    pub total_damage: f64,
    pub damage_per_second: f64,
    /// Reaction name to number of times it fired
    #[serde(default)]
    pub reaction_counts: BTreeMap<String, usize>,
    #[serde(default)]
    pub hits: Vec<DamageRecord>,
    #[serde(default)]
    pub reactions: Vec<ReactionRecord>,
}

impl ScenarioReport {
    pub fn completed(scenario: &str, seed: u64, sim: &Simulation) -> Self {
        let frames = sim.now();
        let total_damage = sim.total_damage();
        let seconds = frames_to_seconds(frames);
        let mut reaction_counts = BTreeMap::new();
        for record in sim.reaction_log() {
            *reaction_counts
                .entry(record.reaction.to_string())
                .or_insert(0) += 1;
        }
        Self {
            scenario: scenario.to_string(),
            seed,
            frames,
            status: RunStatus::Completed,
            total_damage,
            damage_per_second: if seconds > 0.0 { total_damage / seconds } else { 0.0 },
            reaction_counts,
            hits: sim.damage_log().to_vec(),
            reactions: sim.reaction_log().to_vec(),
        }
    }

    fn empty(scenario: &str, seed: u64, status: RunStatus) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            frames: 0,
            status,
            total_damage: 0.0,
            damage_per_second: 0.0,
            reaction_counts: BTreeMap::new(),
            hits: Vec::new(),
            reactions: Vec::new(),
        }
    }

    pub fn failed(scenario: &str, seed: u64, reason: impl Into<String>) -> Self {
        Self::empty(scenario, seed, RunStatus::Failed { reason: reason.into() })
    }

    pub fn aborted(scenario: &str, seed: u64, reason: impl Into<String>) -> Self {
        Self::empty(scenario, seed, RunStatus::Aborted { reason: reason.into() })
    }

    /// One line for the terminal
    pub fn summary(&self) -> String {
        match &self.status {
            RunStatus::Completed => format!(
                "{}: {:.0} damage over {} ({:.1} DPS), {} hits, {} reactions",
                self.scenario,
                self.total_damage,
                format_duration(frames_to_seconds(self.frames)),
                self.damage_per_second,
                self.hits.len(),
                self.reactions.len()
            ),
            RunStatus::Failed { reason } => format!("{}: failed: {reason}", self.scenario),
            RunStatus::Aborted { reason } => format!("{}: aborted: {reason}", self.scenario),
        }
    }
}

/// Top-level report file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub version: u32,
    /// Human-readable timestamp
    pub generated_at: String,
    pub scenarios: Vec<ScenarioReport>,
}

impl BatchReport {
    pub fn new(scenarios: Vec<ScenarioReport>) -> Self {
        Self {
            version: REPORT_VERSION,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            scenarios,
        }
    }

    pub fn completed(&self) -> usize {
        self.scenarios
            .iter()
            .filter(|s| s.status == RunStatus::Completed)
            .count()
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).context("Failed to create report directory")?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        fs::write(path, json).context("Failed to write report file")?;
        Ok(())
    }
}

/// Default report location inside `dir`, named after the current time
pub fn default_report_path(dir: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    dir.join(format!("report-{stamp}.json"))
}

/// Format seconds as "Xm Ys" or "Y.Zs"
pub fn format_duration(seconds: f64) -> String {
    if seconds >= 60.0 {
        let total = seconds as u64;
        format!("{}m {}s", total / 60, total % 60)
    } else {
        format!("{seconds:.1}s")
    }
}
