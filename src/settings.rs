//! Engine settings with persistence
//!
//! Settings are saved to `~/.config/reactor/settings.toml`

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// All engine settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub logging: LoggingSettings,
    pub batch: BatchSettings,
    pub simulation: SimulationSettings,
}

impl EngineSettings {
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("reactor"))
    }

    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.toml"))
    }

    /// Load settings from disk, or return defaults if not found.
    ///
    /// Runs before logging is installed, so problems are returned as notes
    /// for the caller to log once the subscriber exists.
    pub fn load() -> (Self, Option<String>) {
        let Some(path) = Self::settings_path() else {
            return (
                Self::default(),
                Some("could not determine config directory".to_string()),
            );
        };

        if !path.exists() {
            return (Self::default(), None);
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).map_or_else(
                |e| {
                    (
                        Self::default(),
                        Some(format!("failed to parse {}: {e}, using defaults", path.display())),
                    )
                },
                |settings| (settings, None),
            ),
            Err(e) => (
                Self::default(),
                Some(format!("failed to read {}: {e}, using defaults", path.display())),
            ),
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save settings to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(dir) = Self::config_dir() else {
            anyhow::bail!("Could not determine config directory");
        };

        let path = dir.join("settings.toml");
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Log a note produced by [`EngineSettings::load`]
    pub fn report(note: Option<String>) {
        if let Some(note) = note {
            warn!("settings: {note}");
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    /// Include the module path in each line
    pub show_target: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            show_target: false,
        }
    }
}

/// Batch runner settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Worker threads (0 = one per core)
    pub workers: usize,
    /// Where reports go when `--output` is not given
    pub report_dir: Option<PathBuf>,
}

/// Defaults applied to scenarios that leave them out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Frames to run when a scenario has no `duration_frames`
    pub duration_frames: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            duration_frames: 1200, // 20 seconds
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = EngineSettings::parse("[batch]\nworkers = 4\n").unwrap();
        assert_eq!(settings.batch.workers, 4);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.simulation.duration_frames, 1200);
    }

    #[test]
    fn test_round_trip() {
        let mut settings = EngineSettings::default();
        settings.logging.level = "reactor_combat=debug".to_string();
        settings.batch.report_dir = Some(PathBuf::from("/tmp/reports"));

        let text = toml::to_string_pretty(&settings).unwrap();
        assert_eq!(EngineSettings::parse(&text).unwrap(), settings);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        assert!(EngineSettings::parse("logging = 3").is_err());
    }
}
