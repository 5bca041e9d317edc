//! Engine configuration loaded from `shadowmap.toml`.
//!
//! Missing keys fall back to defaults. `SHADOWMAP_BUDGET_MS` overrides the
//! per-resume budget from the file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ShadowmapError;
use crate::shadow::{DEFAULT_TILE_KIND, DEFAULT_TILES_PER_STEP};

pub const CONFIG_FILE: &str = "shadowmap.toml";
pub const BUDGET_ENV: &str = "SHADOWMAP_BUDGET_MS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Per-resume time budget in milliseconds.
    #[serde(default = "default_budget_ms")]
    pub budget_ms: u64,

    /// Host tick period in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Shared budget for one `JobQueue::process` call.
    #[serde(default = "default_queue_budget_ms")]
    pub queue_budget_ms: u64,

    /// Source tiles mirrored per atomic step.
    #[serde(default = "default_tiles_per_step")]
    pub tiles_per_step: usize,

    #[serde(default = "default_tile_kind")]
    pub tile_kind: String,

    #[serde(default)]
    pub tile_variation: bool,
}

fn default_budget_ms() -> u64 {
    2
}

fn default_tick_interval_ms() -> u64 {
    16
}

fn default_queue_budget_ms() -> u64 {
    8
}

fn default_tiles_per_step() -> usize {
    DEFAULT_TILES_PER_STEP
}

fn default_tile_kind() -> String {
    DEFAULT_TILE_KIND.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            budget_ms: default_budget_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            queue_budget_ms: default_queue_budget_ms(),
            tiles_per_step: default_tiles_per_step(),
            tile_kind: default_tile_kind(),
            tile_variation: false,
        }
    }
}

impl EngineConfig {
    /// Load `shadowmap.toml` from the working directory, or defaults.
    pub fn load() -> Result<Self, ShadowmapError> {
        let mut config = Self::load_from(Path::new(CONFIG_FILE))?;
        if let Ok(raw) = std::env::var(BUDGET_ENV)
            && !raw.is_empty()
        {
            let Ok(budget_ms) = raw.trim().parse::<u64>() else {
                let msg = format!("{BUDGET_ENV} must be an integer, got {raw:?}");
                return Err(ShadowmapError::Config(msg));
            };
            config.budget_ms = budget_ms;
        }
        Ok(config)
    }

    /// Load a specific file; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ShadowmapError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str::<EngineConfig>(&contents)?;
        if config.tiles_per_step == 0 {
            return Err(ShadowmapError::Config(
                "tiles_per_step must be at least 1".into(),
            ));
        }
        Ok(config)
    }

    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn queue_budget(&self) -> Duration {
        Duration::from_millis(self.queue_budget_ms)
    }

    pub fn to_toml(&self) -> Result<String, ShadowmapError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_values() {
        let config = EngineConfig::default();
        assert_eq!(config.budget(), Duration::from_millis(2));
        assert_eq!(config.tick_interval(), Duration::from_millis(16));
        assert_eq!(config.queue_budget(), Duration::from_millis(8));
        assert_eq!(config.tiles_per_step, 64);
        assert_eq!(config.tile_kind, "FloorChromite");
        assert!(!config.tile_variation);
    }

    #[test]
    fn deserialize_partial_toml() {
        let config: EngineConfig = toml::from_str("budget_ms = 5\ntile_variation = true").unwrap();
        assert_eq!(config.budget_ms, 5);
        assert!(config.tile_variation);
        assert_eq!(config.tick_interval_ms, 16);
    }

    #[test]
    fn load_from_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn load_from_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tiles_per_step = 8\ntile_kind = \"Plating\"").unwrap();

        let config = EngineConfig::load_from(file.path()).unwrap();
        assert_eq!(config.tiles_per_step, 8);
        assert_eq!(config.tile_kind, "Plating");
    }

    #[test]
    fn zero_tiles_per_step_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tiles_per_step = 0").unwrap();

        assert!(matches!(
            EngineConfig::load_from(file.path()),
            Err(ShadowmapError::Config(_))
        ));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "budget_ms = \"soon\"").unwrap();

        assert!(matches!(
            EngineConfig::load_from(file.path()),
            Err(ShadowmapError::Toml(_))
        ));
    }

    #[test]
    fn renders_back_to_toml() {
        let rendered = EngineConfig::default().to_toml().unwrap();
        let parsed: EngineConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, EngineConfig::default());
    }
}
